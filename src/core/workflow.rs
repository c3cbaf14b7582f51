use crate::domain::model::{MealSelector, ReservationRequest, Schedule};
use crate::domain::ports::MealApi;
use crate::utils::error::{MealError, Result};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 重試界限。預設沿用互動腳本的「重試到成功為止」，
/// 但上限與期限都可以由呼叫端收緊。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Per-loop attempt cap; `None` retries without bound.
    pub max_attempts: Option<u32>,
    /// Overall wall-clock budget for the whole run, measured from the
    /// first login attempt.
    pub deadline: Option<Duration>,
    /// Pause before re-resolving when the schedule has not shown up in the
    /// menu index yet. Generic reservation failures retry with no pause.
    pub not_found_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            deadline: None,
            not_found_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Cooperative cancellation, checked once per retry iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ReservationOutcome {
    pub schedule_id: String,
    pub meal: String,
    pub restaurant: String,
    pub pickup_time: String,
    pub login_attempts: u32,
    pub reserve_attempts: u32,
}

/// 預約流程：登入重試迴圈 → 菜單查詢 → 送出預約重試迴圈。
/// Generic over the API port so the retry logic runs against a mock in tests.
pub struct ReservationWorkflow<A: MealApi> {
    api: A,
    policy: RetryPolicy,
    cancel: CancelFlag,
}

impl<A: MealApi> ReservationWorkflow<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            policy: RetryPolicy::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// A handle the caller can trip from elsewhere to stop the loops.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn execute(
        &self,
        selector: &MealSelector,
        pickup_time: &str,
        city_name: &str,
        cancel_current: bool,
    ) -> Result<ReservationOutcome> {
        if cancel_current {
            self.api.cancel_current_meal().await?;
        }

        let started = Instant::now();
        let login_attempts = self.login_until_ok(started).await?;
        let (schedule, reserve_attempts) = self
            .reserve_until_ok(selector, pickup_time, city_name, started)
            .await?;

        Ok(ReservationOutcome {
            schedule_id: schedule.id,
            meal: schedule.meal.name,
            restaurant: schedule.restaurant.name,
            pickup_time: pickup_time.to_string(),
            login_attempts,
            reserve_attempts,
        })
    }

    fn check_budget(&self, stage: &str, attempts: u32, started: Instant) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(MealError::Cancelled {
                stage: stage.to_string(),
            });
        }
        if let Some(max) = self.policy.max_attempts {
            if attempts >= max {
                return Err(MealError::RetryExhausted {
                    stage: stage.to_string(),
                    attempts,
                });
            }
        }
        if let Some(deadline) = self.policy.deadline {
            if started.elapsed() >= deadline {
                return Err(MealError::RetryExhausted {
                    stage: stage.to_string(),
                    attempts,
                });
            }
        }
        Ok(())
    }

    /// Retries until the first 200 and not a call longer; non-200 statuses
    /// are reported and retried immediately, transport failures propagate.
    async fn login_until_ok(&self, started: Instant) -> Result<u32> {
        let mut attempts = 0;
        loop {
            self.check_budget("login", attempts, started)?;
            attempts += 1;

            let status = self.api.login().await?;
            if status == StatusCode::OK {
                tracing::info!("✅ Logged in after {} attempt(s)", attempts);
                return Ok(attempts);
            }
            tracing::warn!("Login failed with status {}, retrying", status);
        }
    }

    // 每一輪都重新查詢菜單：排程可能是稍後才出現在索引裡的
    async fn reserve_until_ok(
        &self,
        selector: &MealSelector,
        pickup_time: &str,
        city_name: &str,
        started: Instant,
    ) -> Result<(Schedule, u32)> {
        let mut attempts = 0;
        loop {
            self.check_budget("reservation", attempts, started)?;
            attempts += 1;

            let schedule = match self.api.find_schedule(selector, city_name).await {
                Ok(schedule) => schedule,
                Err(e) if e.is_not_found() => {
                    tracing::info!("{}; waiting for the menu index to catch up", e);
                    tokio::time::sleep(self.policy.not_found_delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let request = ReservationRequest::new(&schedule.id, pickup_time);
            let status = self.api.reserve(&request).await?;
            if status == StatusCode::OK {
                tracing::info!(
                    "✅ Reserved '{}' from {} at {}",
                    schedule.meal.name,
                    schedule.restaurant.name,
                    pickup_time
                );
                return Ok((schedule, attempts));
            }
            tracing::warn!(
                "Reservation attempt {} failed with status {}, retrying",
                attempts,
                status
            );
        }
    }
}
