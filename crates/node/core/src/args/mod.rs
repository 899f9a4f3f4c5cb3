//! Command-line argument groups shared by tally binaries.

mod log;

pub use log::LogArgs;
