pub mod components;
pub mod local;
pub mod remote;
pub mod state;
pub mod worker;

pub use components::{ExecutionOutcome, TaskExecutionManager};
pub use local::LocalWorker;
pub use remote::{RemoteWorker, RemoteWorkerConfig};
pub use state::WorkerState;
pub use worker::Worker;
