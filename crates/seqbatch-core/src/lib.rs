pub mod config;
pub mod error;
pub mod logging;

pub mod deps;
pub mod fsutil;
pub mod jobs;
pub mod outcome;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod runinfo;
pub mod scheduler;

pub use error::BatchError;
