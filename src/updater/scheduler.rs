//! 주기적 체크 트리거
//!
//! 일정 간격으로 게이트가 걸린 `request_check(false)`를 보냅니다.
//! 실제 빈도 제한은 코디네이터의 10분 게이트가 담당합니다.

use std::time::Duration;
use tokio::task::JoinHandle;

use super::coordinator::UpdateCoordinator;

pub const DEFAULT_SCHEDULE_INTERVAL: Duration = Duration::from_secs(60);

pub struct PeriodicCheck {
    coordinator: UpdateCoordinator,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicCheck {
    pub fn new(coordinator: UpdateCoordinator, period: Duration) -> Self {
        Self {
            coordinator,
            period,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// 스케줄러 시작. 간격이 0이면 비활성
    pub fn start(&mut self) {
        if self.period.is_zero() {
            tracing::info!("[Scheduler] Periodic update checks disabled");
            return;
        }
        if self.handle.is_some() {
            return;
        }

        let coordinator = self.coordinator.clone();
        let period = self.period;
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                tracing::debug!("[Scheduler] Periodic check triggered");
                // 확인 다이얼로그가 오래 걸려도 다음 틱을 막지 않도록 분리
                drop(coordinator.request_check(false));
            }
        });

        self.handle = Some(handle);
        tracing::info!("[Scheduler] Periodic update checks every {}s", period.as_secs());
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::info!("[Scheduler] Periodic update checks stopped");
        }
    }
}

impl Drop for PeriodicCheck {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
