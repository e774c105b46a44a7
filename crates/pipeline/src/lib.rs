//! The asynchronous import pipeline: claim, extract, resolve, persist.

pub mod health;
pub mod resolver;
pub mod worker;

pub use health::{health_report, WorkerHealth, WorkerStatus};
pub use resolver::{resolve, Resolution, ResolverPolicy};
pub use worker::ImportWorker;
