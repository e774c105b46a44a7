pub mod calendar;
pub mod config;
pub mod error;
pub mod job;
pub mod worker;

pub use calendar::*;
pub use config::Config;
pub use error::*;
pub use job::*;
pub use worker::*;
