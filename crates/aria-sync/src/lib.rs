//! Background synchronization: periodic source refresh, the typed update
//! pipeline, the scheduler that drives both, and the developer-feedback
//! client.

pub mod error;
pub mod feedback;
pub mod scheduler;
pub mod sources;
pub mod updates;

pub use error::{SyncError, SyncResult};
pub use feedback::DeveloperFeedback;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use sources::SourceSyncEngine;
pub use updates::{UpdatePipeline, UpdatePipelineConfig};
