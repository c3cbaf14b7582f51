use crate::domain::model::{KitchenSnapshot, MealSelector, ReservationRequest, Schedule};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

/// The remote-service surface the reservation workflow runs against.
#[async_trait]
pub trait MealApi: Send + Sync {
    /// Returns the raw status code; a non-200 login is not an error here,
    /// status interpretation is the caller's job.
    async fn login(&self) -> Result<StatusCode>;

    /// Resolves a selector against today's menu for the named city.
    /// An absent match is an explicit not-found error, never a silent miss.
    async fn find_schedule(&self, selector: &MealSelector, city_name: &str) -> Result<Schedule>;

    /// Returns the raw status code of the reservation submission.
    async fn reserve(&self, request: &ReservationRequest) -> Result<StatusCode>;

    async fn current_meal(&self) -> Result<KitchenSnapshot>;

    /// Declared capability with no remote contract yet; implementations
    /// fail with an unsupported error rather than guessing an endpoint.
    async fn cancel_current_meal(&self) -> Result<()>;
}

pub trait SecretStore: Send + Sync {
    fn get_secret(&self, account: &str) -> Result<Option<String>>;
    fn set_secret(&self, account: &str, secret: &str) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn email_address(&self) -> &str;
    fn use_secret_store(&self) -> bool;
}
