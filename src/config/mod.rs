pub mod file_config;

pub use file_config::FileConfig;

use crate::core::session::DEFAULT_BASE_URL;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mealrs")]
#[command(about = "Reserve a MealPal meal from the command line")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: String,

    /// Base URL of the MealPal service
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save the account password into the OS keychain
    SavePass,

    /// Reserve a meal for pickup
    Reserve {
        /// Restaurant name, matched exactly against today's menu
        restaurant: String,

        /// Pickup time window, e.g. "12:00pm-12:15pm"
        pickup_time: String,

        /// City name, matched exactly
        city: String,

        /// Reserve by meal name instead; takes precedence over the restaurant
        #[arg(long)]
        meal: Option<String>,

        /// Cancel the currently held reservation first (not supported upstream yet)
        #[arg(long)]
        cancel_first: bool,

        /// Give up after this many attempts per retry loop (default: retry forever)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Overall deadline in seconds for the whole run
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Show the currently reserved meal
    Status,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_non_empty_string("config", &self.config)?;

        if let Command::Reserve {
            restaurant,
            pickup_time,
            city,
            meal,
            ..
        } = &self.command
        {
            validation::validate_non_empty_string("restaurant", restaurant)?;
            validation::validate_non_empty_string("pickup_time", pickup_time)?;
            validation::validate_non_empty_string("city", city)?;
            if let Some(meal) = meal {
                validation::validate_non_empty_string("meal", meal)?;
            }
        }

        Ok(())
    }
}
