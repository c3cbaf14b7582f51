//! Exact-name matching over catalog snapshots.
//!
//! Matching is deliberately separate from fetching so every case is
//! unit-testable without a server. Matches are exact and case-sensitive,
//! mirroring the remote service's lack of a name lookup endpoint; when two
//! entries share a display name the first in listing order wins.

use crate::domain::model::{City, Schedule};

pub fn city_by_name<'a>(cities: &'a [City], name: &str) -> Option<&'a City> {
    cities.iter().find(|city| city.name == name)
}

pub fn schedule_by_restaurant<'a>(schedules: &'a [Schedule], name: &str) -> Option<&'a Schedule> {
    schedules.iter().find(|s| s.restaurant.name == name)
}

pub fn schedule_by_meal<'a>(schedules: &'a [Schedule], name: &str) -> Option<&'a Schedule> {
    schedules.iter().find(|s| s.meal.name == name)
}
