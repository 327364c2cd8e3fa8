pub mod audit;
pub mod aws;
pub mod config;
pub mod confirm;
pub mod deploy;
pub mod error;
pub mod fake;
pub mod poller;
pub mod provisioner;
pub mod registry;
pub mod secrets;
pub mod teardown;
pub mod types;

pub use error::{Result, StackError};
