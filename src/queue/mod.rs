// Asynchronous analysis jobs

pub mod jobs;
pub mod workers;

pub use jobs::{Job, JobStatus, JobStore, TransitionError};
pub use workers::AnalysisWorker;
