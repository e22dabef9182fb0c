pub mod remote_processor;
pub mod task_execution;

pub use remote_processor::{RemoteFrame, RemoteProcessor, RemoteReport, RemoteRequest};
pub use task_execution::{ExecutionOutcome, TaskExecutionManager};
