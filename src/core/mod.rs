pub mod catalog;
pub mod session;
pub mod workflow;

pub use crate::domain::model::{
    City, Credentials, KitchenSnapshot, MealSelector, ReservationRequest, Schedule,
};
pub use crate::domain::ports::{ConfigProvider, MealApi, SecretStore};
pub use crate::utils::error::Result;
