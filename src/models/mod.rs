pub mod insight;
pub mod metrics;
pub mod performance;
pub mod protocol;
pub mod tables;

pub use insight::*;
pub use metrics::*;
pub use performance::*;
pub use protocol::*;
pub use tables::*;
