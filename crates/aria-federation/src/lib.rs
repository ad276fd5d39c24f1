//! Peer federation: a registry of other assistant instances plus the
//! messaging primitives built on top of it (point-to-point, broadcast,
//! knowledge sharing, capability discovery, health pings).

pub mod error;
pub mod registry;
pub mod transport;

pub use error::{FederationError, FederationResult};
pub use registry::PeerRegistry;
pub use transport::{HttpPeerTransport, PeerTransport};
