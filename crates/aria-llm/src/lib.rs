//! Provider Gateway: one normalized query interface over heterogeneous
//! remote AI backends, plus the aggregation layer that reduces a
//! multi-provider response set to a single answer.

pub mod aggregate;
pub mod gateway;
pub mod prompts;
pub mod provider;
pub mod providers;

pub use aggregate::{Aggregator, Selection, Strategy};
pub use gateway::{GatewayConfig, ProviderGateway};
pub use provider::{Provider, ProviderError, ProviderResult};
