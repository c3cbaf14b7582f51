pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::KeyringStore;
pub use crate::config::{CliConfig, FileConfig};
pub use crate::core::session::Session;
pub use crate::core::workflow::{ReservationWorkflow, RetryPolicy};
pub use crate::utils::error::{MealError, Result};
