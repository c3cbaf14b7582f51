use crate::core::catalog;
use crate::domain::model::{
    CitiesResponse, City, Credentials, KitchenSnapshot, MealSelector, MenuResponse,
    ReservationRequest, Schedule,
};
use crate::domain::ports::MealApi;
use crate::utils::error::{MealError, Result};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://secure.mealpal.com";

const LOGIN_PATH: &str = "/1/login";
const CITIES_PATH: &str = "/1/functions/getCitiesWithNeighborhoods";
const RESERVATION_PATH: &str = "/api/v2/reservations";
const KITCHEN_PATH: &str = "/1/functions/checkKitchen3";

fn menu_path(city_id: &str) -> String {
    format!("/api/v1/cities/{}/product_offerings/lunch/menu", city_id)
}

/// One authenticated MealPal session: account credentials plus the cookie
/// jar the service fills in at login. Lives for a single workflow run.
pub struct Session {
    credentials: Credentials,
    base_url: Url,
    client: Client,
    cookies: Arc<Jar>,
}

impl Session {
    /// The base URL is configurable so tests can point at a mock server.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| MealError::InvalidConfigValueError {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let headers = Self::default_headers(&base_url)?;
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            credentials,
            base_url,
            client,
            cookies,
        })
    }

    // 服務端對這組標頭敏感：缺少 Origin/Referer 時會拒絕請求
    fn default_headers(base_url: &Url) -> Result<HeaderMap> {
        let invalid = |value: &str, reason: String| MealError::InvalidConfigValueError {
            field: "base_url".to_string(),
            value: value.to_string(),
            reason,
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let origin = base_url.origin().ascii_serialization();
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&origin).map_err(|e| invalid(&origin, e.to_string()))?,
        );

        let referer = base_url
            .join("/login")
            .map_err(|e| invalid(base_url.as_str(), e.to_string()))?;
        headers.insert(
            REFERER,
            HeaderValue::from_str(referer.as_str())
                .map_err(|e| invalid(referer.as_str(), e.to_string()))?,
        );

        Ok(headers)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| MealError::ConfigError {
            message: format!("Invalid endpoint path '{}': {}", path, e),
        })
    }

    pub fn cookie_jar(&self) -> &Jar {
        &self.cookies
    }

    /// Sends the credentials and returns the raw status code. Cookies from
    /// any response, success or failure, land in the jar and are overwritten
    /// by the next attempt; interpreting the status is the caller's job.
    pub async fn login(&self) -> Result<StatusCode> {
        let body = serde_json::json!({
            "username": self.credentials.username,
            "password": self.credentials.password,
        });

        tracing::debug!("POST {}", LOGIN_PATH);
        let response = self.client.post(self.url(LOGIN_PATH)?).json(&body).send().await?;
        Ok(response.status())
    }

    /// Fetched fresh on every call; the remote catalog may change between runs.
    pub async fn list_cities(&self) -> Result<Vec<City>> {
        tracing::debug!("POST {}", CITIES_PATH);
        let response = self
            .client
            .post(self.url(CITIES_PATH)?)
            .send()
            .await?
            .error_for_status()?;

        let body: CitiesResponse = response.json().await?;
        Ok(body.result)
    }

    pub async fn find_city(&self, city_name: &str) -> Result<Option<City>> {
        let cities = self.list_cities().await?;
        Ok(catalog::city_by_name(&cities, city_name).cloned())
    }

    pub async fn list_schedules(&self, city_name: &str) -> Result<Vec<Schedule>> {
        let city = self
            .find_city(city_name)
            .await?
            .ok_or_else(|| MealError::CityNotFound {
                name: city_name.to_string(),
            })?;

        let path = menu_path(&city.object_id);
        tracing::debug!("GET {}", path);
        let response = self
            .client
            .get(self.url(&path)?)
            .send()
            .await?
            .error_for_status()?;

        let body: MenuResponse = response.json().await?;
        Ok(body.schedules)
    }

    pub async fn find_schedule_by_restaurant(
        &self,
        restaurant_name: &str,
        city_name: &str,
    ) -> Result<Schedule> {
        let schedules = self.list_schedules(city_name).await?;
        catalog::schedule_by_restaurant(&schedules, restaurant_name)
            .cloned()
            .ok_or_else(|| MealError::ScheduleNotFound {
                kind: "restaurant".to_string(),
                name: restaurant_name.to_string(),
            })
    }

    pub async fn find_schedule_by_meal(&self, meal_name: &str, city_name: &str) -> Result<Schedule> {
        let schedules = self.list_schedules(city_name).await?;
        catalog::schedule_by_meal(&schedules, meal_name)
            .cloned()
            .ok_or_else(|| MealError::ScheduleNotFound {
                kind: "meal".to_string(),
                name: meal_name.to_string(),
            })
    }

    pub async fn reserve(&self, request: &ReservationRequest) -> Result<StatusCode> {
        tracing::debug!("POST {} (schedule {})", RESERVATION_PATH, request.schedule_id);
        let response = self
            .client
            .post(self.url(RESERVATION_PATH)?)
            .json(request)
            .send()
            .await?;
        Ok(response.status())
    }

    pub async fn current_meal(&self) -> Result<KitchenSnapshot> {
        tracing::debug!("POST {}", KITCHEN_PATH);
        let response = self
            .client
            .post(self.url(KITCHEN_PATH)?)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MealApi for Session {
    async fn login(&self) -> Result<StatusCode> {
        Session::login(self).await
    }

    async fn find_schedule(&self, selector: &MealSelector, city_name: &str) -> Result<Schedule> {
        match selector {
            MealSelector::ByMeal(name) => self.find_schedule_by_meal(name, city_name).await,
            MealSelector::ByRestaurant(name) => {
                self.find_schedule_by_restaurant(name, city_name).await
            }
        }
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<StatusCode> {
        Session::reserve(self, request).await
    }

    async fn current_meal(&self) -> Result<KitchenSnapshot> {
        Session::current_meal(self).await
    }

    async fn cancel_current_meal(&self) -> Result<()> {
        Err(MealError::UnsupportedError {
            operation: "cancel current meal".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reqwest::cookie::CookieStore;

    fn credentials() -> Credentials {
        Credentials {
            username: "user@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn session_for(server: &MockServer) -> Session {
        Session::new(&server.base_url(), credentials()).unwrap()
    }

    fn cities_body() -> serde_json::Value {
        serde_json::json!({
            "result": [
                {"objectId": "SF1", "name": "San Francisco", "state": "CA", "city_code": "SFO"},
                {"objectId": "SEA1", "name": "Seattle", "state": "WA", "city_code": "SEA"}
            ]
        })
    }

    fn menu_body() -> serde_json::Value {
        serde_json::json!({
            "generated_at": "2019-04-01T00:00:00Z",
            "schedules": [{
                "id": "SCHED1",
                "date": "20190401",
                "meal": {
                    "id": "MEAL1",
                    "name": "Spam and Eggs",
                    "description": "Breakfast for lunch",
                    "cuisine": "american"
                },
                "restaurant": {
                    "id": "REST1",
                    "name": "Chipotle",
                    "address": "123 Market St",
                    "open": "2019-04-01T00:00:00Z",
                    "close": "2019-04-01T00:00:00Z"
                }
            }]
        })
    }

    #[tokio::test]
    async fn login_returns_raw_status_and_sends_credentials() {
        let server = MockServer::start();
        let login_mock = server.mock(|when, then| {
            when.method(POST).path("/1/login").json_body(serde_json::json!({
                "username": "user@example.com",
                "password": "hunter2"
            }));
            then.status(200)
                .header("Set-Cookie", "sessionToken=r:abc; Path=/")
                .json_body(serde_json::json!({"id": "GUID", "sessionToken": "r:abc"}));
        });

        let session = session_for(&server);
        let status = session.login().await.unwrap();

        login_mock.assert();
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn failed_login_still_returns_status_and_keeps_cookies() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/login");
            then.status(404)
                .header("Set-Cookie", "sessionToken=r:stale; Path=/")
                .json_body(serde_json::json!({"code": 101, "error": "bad credentials"}));
        });

        let session = session_for(&server);
        let status = session.login().await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Cookies from the failed attempt are retained, not discarded.
        let url = Url::parse(&server.base_url()).unwrap();
        let stored = session.cookie_jar().cookies(&url).unwrap();
        assert!(stored.to_str().unwrap().contains("sessionToken=r:stale"));
    }

    #[tokio::test]
    async fn cookies_are_overwritten_by_the_next_login_attempt() {
        let server = MockServer::start();
        let mut first = server.mock(|when, then| {
            when.method(POST).path("/1/login");
            then.status(404)
                .header("Set-Cookie", "sessionToken=r:stale; Path=/");
        });

        let session = session_for(&server);
        assert_eq!(session.login().await.unwrap(), StatusCode::NOT_FOUND);
        first.delete();

        server.mock(|when, then| {
            when.method(POST).path("/1/login");
            then.status(200)
                .header("Set-Cookie", "sessionToken=r:fresh; Path=/");
        });
        assert_eq!(session.login().await.unwrap(), StatusCode::OK);

        let url = Url::parse(&server.base_url()).unwrap();
        let stored = session.cookie_jar().cookies(&url).unwrap();
        let stored = stored.to_str().unwrap().to_string();
        assert!(stored.contains("sessionToken=r:fresh"));
        assert!(!stored.contains("r:stale"));
    }

    #[tokio::test]
    async fn list_cities_decodes_the_result_array() {
        let server = MockServer::start();
        let cities_mock = server.mock(|when, then| {
            when.method(POST).path("/1/functions/getCitiesWithNeighborhoods");
            then.status(200).json_body(cities_body());
        });

        let session = session_for(&server);
        let cities = session.list_cities().await.unwrap();

        cities_mock.assert();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].object_id, "SF1");
        assert_eq!(cities[1].name, "Seattle");
    }

    #[tokio::test]
    async fn list_cities_fails_on_http_error_without_partial_data() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/functions/getCitiesWithNeighborhoods");
            then.status(400);
        });

        let session = session_for(&server);
        let err = session.list_cities().await.unwrap_err();
        match err {
            MealError::ApiError(e) => assert_eq!(e.status(), Some(StatusCode::BAD_REQUEST)),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn find_city_absent_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/functions/getCitiesWithNeighborhoods");
            then.status(200).json_body(cities_body());
        });

        let session = session_for(&server);
        assert!(session.find_city("Boston").await.unwrap().is_none());
        let found = session.find_city("Seattle").await.unwrap().unwrap();
        assert_eq!(found.object_id, "SEA1");
    }

    #[tokio::test]
    async fn list_schedules_requires_a_known_city() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/functions/getCitiesWithNeighborhoods");
            then.status(200).json_body(cities_body());
        });

        let session = session_for(&server);
        let err = session.list_schedules("Boston").await.unwrap_err();
        assert!(matches!(err, MealError::CityNotFound { ref name } if name == "Boston"));
    }

    #[tokio::test]
    async fn schedule_lookup_by_restaurant_and_meal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/functions/getCitiesWithNeighborhoods");
            then.status(200).json_body(cities_body());
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/cities/SF1/product_offerings/lunch/menu");
            then.status(200).json_body(menu_body());
        });

        let session = session_for(&server);

        let by_restaurant = session
            .find_schedule_by_restaurant("Chipotle", "San Francisco")
            .await
            .unwrap();
        assert_eq!(by_restaurant.id, "SCHED1");
        assert_eq!(by_restaurant.meal.name, "Spam and Eggs");

        let by_meal = session
            .find_schedule_by_meal("Spam and Eggs", "San Francisco")
            .await
            .unwrap();
        assert_eq!(by_meal.restaurant.name, "Chipotle");
    }

    #[tokio::test]
    async fn missing_schedule_is_an_explicit_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/functions/getCitiesWithNeighborhoods");
            then.status(200).json_body(cities_body());
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/cities/SF1/product_offerings/lunch/menu");
            then.status(200).json_body(menu_body());
        });

        let session = session_for(&server);
        let err = session
            .find_schedule_by_restaurant("NotARestaurant", "San Francisco")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, MealError::ScheduleNotFound { ref kind, .. } if kind == "restaurant"));
    }

    #[tokio::test]
    async fn menu_fetch_propagates_http_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/functions/getCitiesWithNeighborhoods");
            then.status(200).json_body(cities_body());
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/cities/SF1/product_offerings/lunch/menu");
            then.status(400);
        });

        let session = session_for(&server);
        let err = session.list_schedules("San Francisco").await.unwrap_err();
        assert!(matches!(err, MealError::ApiError(_)));
    }

    #[tokio::test]
    async fn reserve_returns_raw_status() {
        let server = MockServer::start();
        let reserve_mock = server.mock(|when, then| {
            when.method(POST).path("/api/v2/reservations").json_body(serde_json::json!({
                "quantity": 1,
                "schedule_id": "SCHED1",
                "pickup_time": "12:00pm-12:15pm",
                "source": "Web"
            }));
            then.status(500);
        });

        let session = session_for(&server);
        let request = ReservationRequest::new("SCHED1", "12:00pm-12:15pm");
        let status = session.reserve(&request).await.unwrap();

        reserve_mock.assert();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn current_meal_with_and_without_reservation() {
        let server = MockServer::start();
        let mut kitchen = server.mock(|when, then| {
            when.method(POST).path("/1/functions/checkKitchen3");
            then.status(200).json_body(serde_json::json!({
                "result": {"status": "OPEN", "time": "19:59"}
            }));
        });

        let session = session_for(&server);
        let snapshot = session.current_meal().await.unwrap();
        assert!(!snapshot.has_reservation());
        kitchen.delete();

        server.mock(|when, then| {
            when.method(POST).path("/1/functions/checkKitchen3");
            then.status(200).json_body(serde_json::json!({
                "result": {
                    "status": "OPEN",
                    "reservation": {
                        "id": "GUID",
                        "pickupTime": "12:30-12:45",
                        "orderNumber": "1111",
                        "meal": {"id": "GUID", "name": "Spam Eggs"},
                        "restaurant": {"id": "GUID", "name": "RestaurantName"}
                    }
                }
            }));
        });

        let snapshot = session.current_meal().await.unwrap();
        let held = snapshot.reservation().unwrap();
        assert_eq!(held.order_number.as_deref(), Some("1111"));
    }

    #[tokio::test]
    async fn kitchen_failure_surfaces_directly() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/functions/checkKitchen3");
            then.status(500);
        });

        let session = session_for(&server);
        assert!(matches!(
            session.current_meal().await.unwrap_err(),
            MealError::ApiError(_)
        ));
    }

    #[tokio::test]
    async fn cancel_current_meal_is_always_unsupported() {
        let server = MockServer::start();
        let session = session_for(&server);

        let err = MealApi::cancel_current_meal(&session).await.unwrap_err();
        assert!(matches!(err, MealError::UnsupportedError { .. }));
    }

    #[tokio::test]
    async fn requests_carry_the_fixed_header_set() {
        let server = MockServer::start();
        let origin = server.base_url();
        let cities_mock = server.mock(move |when, then| {
            when.method(POST)
                .path("/1/functions/getCitiesWithNeighborhoods")
                .header("content-type", "application/json")
                .header("origin", origin.clone())
                .header("referer", format!("{}/login", origin));
            then.status(200).json_body(serde_json::json!({"result": []}));
        });

        let session = session_for(&server);
        session.list_cities().await.unwrap();
        cities_mock.assert();
    }
}
