pub mod args;
pub mod dispatcher;
pub mod job;
pub mod store;

pub use dispatcher::Dispatcher;
pub use job::{Job, JobId, JobOutcome, JobStatus};
pub use store::JobStore;
