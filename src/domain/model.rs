use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    #[serde(rename = "objectId")]
    pub object_id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub open: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close: Option<DateTime<Utc>>,
}

/// 每日菜單上的一筆供餐：餐點、餐廳與取餐時段的組合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    pub meal: Meal,
    pub restaurant: Restaurant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CitiesResponse {
    pub result: Vec<City>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuResponse {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationRequest {
    pub quantity: u32,
    pub schedule_id: String,
    pub pickup_time: String,
    pub source: String,
}

impl ReservationRequest {
    pub fn new(schedule_id: &str, pickup_time: &str) -> Self {
        Self {
            quantity: 1,
            schedule_id: schedule_id.to_string(),
            pickup_time: pickup_time.to_string(),
            source: "Web".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KitchenSnapshot {
    pub result: KitchenStatus,
}

impl KitchenSnapshot {
    pub fn reservation(&self) -> Option<&ReservedMeal> {
        self.result.reservation.as_ref()
    }

    pub fn has_reservation(&self) -> bool {
        self.result.reservation.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KitchenStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub reservation: Option<ReservedMeal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservedMeal {
    pub id: String,
    #[serde(rename = "pickupTime", default)]
    pub pickup_time: Option<String>,
    #[serde(rename = "orderNumber", default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub meal: Option<Meal>,
    #[serde(default)]
    pub restaurant: Option<Restaurant>,
}

/// 預約目標：以餐點名稱或餐廳名稱擇一查詢當日菜單
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealSelector {
    ByMeal(String),
    ByRestaurant(String),
}

impl MealSelector {
    /// The meal name wins when both are supplied.
    pub fn from_names(meal: Option<String>, restaurant: Option<String>) -> Option<Self> {
        meal.map(MealSelector::ByMeal)
            .or(restaurant.map(MealSelector::ByRestaurant))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MealSelector::ByMeal(_) => "meal",
            MealSelector::ByRestaurant(_) => "restaurant",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MealSelector::ByMeal(name) | MealSelector::ByRestaurant(name) => name,
        }
    }
}

impl fmt::Display for MealSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.name())
    }
}
