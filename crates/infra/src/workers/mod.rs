//! Background workers.

pub mod controller_worker;

pub use controller_worker::{ControllerWorker, Retryable, WorkerHandle};
