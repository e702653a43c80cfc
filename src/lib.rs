pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod history;
pub mod monitor;
pub mod tui;
pub mod validator;

pub use error::{MonitorError, Result};
