//! Built-in middlewares (§4.E).

pub mod delay_overlapping;
pub mod distributed_no_overlapping;
pub mod no_overlapping;
pub mod recovery;
pub mod tracing;

pub use delay_overlapping::delay_if_still_running;
pub use distributed_no_overlapping::{distributed_no_overlapping as distributed_no_overlapping_mw, DistributedMutex, NoopMutex};
pub use no_overlapping::skip_if_still_running;
pub use recovery::recovery;
pub use tracing::tracing as tracing_middleware;
