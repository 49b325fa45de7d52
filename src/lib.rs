pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod rules;
pub mod slack;

pub use error::{NotifyError, Result};
