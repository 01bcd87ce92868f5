//! 업데이트 코디네이터: 체크 게이팅, 확인 다이얼로그 시퀀스, 핸드오프
//!
//! ## 상태 머신
//! ```text
//! Idle → CheckInFlight → AwaitingWindowVisible → AwaitingUserResponse
//!      → { HandingOff | Suppressed | Idle(에러) }
//! ```
//! `HandingOff`는 종료 상태(프로세스가 끝남)이고, 나머지는 완료/실패 시 `Idle`로 돌아갑니다.
//!
//! `CheckState`는 짧은 구간에서만 잠그며 `await` 너머로 락을 들고 있지 않습니다.
//! 다이얼로그 플래그는 `DialogGuard`가 모든 종료 경로(패닉 포함)에서 해제합니다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::error::UpdaterError;
use super::handoff;
use super::host::{Choice, Collaborators, UpdatePrompt, UpdateSettings};
use super::version::{Channel, VersionTag};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_VISIBILITY_POLL: Duration = Duration::from_millis(100);
pub const DEFAULT_RELEASE_PAGE: &str = "https://github.com/HearthSim/Hearthstone-Deck-Tracker/releases";

/// 코디네이터 동작 파라미터
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// 자동 체크 최소 간격, 응답 후 재확인 기준 (기본 10분)
    pub check_interval: Duration,
    /// 다이얼로그 표시 전 대기 (기본 10초)
    pub settle_delay: Duration,
    /// 윈도우 표시 여부 폴링 간격 (기본 100ms)
    pub visibility_poll: Duration,
    /// 윈도우 표시 대기 상한. `None`이면 무한 대기
    pub visibility_timeout: Option<Duration>,
    /// 외부 업데이터 실행 파일
    pub updater_executable: PathBuf,
    /// 업데이터 실행 실패 시 여는 수동 다운로드 페이지
    pub release_page_url: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            visibility_poll: DEFAULT_VISIBILITY_POLL,
            visibility_timeout: None,
            updater_executable: PathBuf::from("HDTUpdate.exe"),
            release_page_url: DEFAULT_RELEASE_PAGE.to_string(),
        }
    }
}

/// 확인 시퀀스 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    CheckInFlight,
    AwaitingWindowVisible,
    AwaitingUserResponse,
    Suppressed,
    HandingOff,
}

/// 체크 요청이 버려진 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ChecksDisabled,
    Suppressed,
    GameInProgress,
    DialogInFlight,
    TooSoon,
}

/// 체크 요청 하나의 최종 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Skipped(SkipReason),
    UpToDate,
    /// 사용자가 "Not now" 선택: 재시작 전까지 자동 체크 중단
    Declined,
    /// 업데이터 실행 후 종료 요청까지 완료
    HandedOff { version: VersionTag },
    /// 업데이터 실행 실패, 릴리스 페이지로 대체
    LaunchFailed { version: VersionTag },
    Failed(String),
}

/// 프로세스 종료 코드 결정
///
/// - `0`: 업데이트 있음
/// - `1`: 실패
/// - `2`: 업데이트 없음 또는 건너뜀
pub fn exit_code(outcome: &CheckOutcome) -> i32 {
    match outcome {
        CheckOutcome::HandedOff { .. } | CheckOutcome::LaunchFailed { .. } | CheckOutcome::Declined => 0,
        CheckOutcome::Failed(_) => 1,
        CheckOutcome::Skipped(_) | CheckOutcome::UpToDate => 2,
    }
}

/// 구독자에게 브로드캐스트되는 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    PhaseChanged(Phase),
    UpdateFound { version: VersionTag, channel: Channel },
    CheckSkipped(SkipReason),
}

/// 상태 스냅샷 (표시용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStatus {
    pub phase: Phase,
    pub suppressed: bool,
    pub dialog_in_flight: bool,
    pub since_last_check: Option<Duration>,
}

/// 프로세스 수명 동안 유지되는 체크 상태 (영속화하지 않음)
#[derive(Debug, Default)]
pub struct CheckState {
    last_check: Option<Instant>,
    suppressed: bool,
    dialog_in_flight: bool,
    checks_in_flight: usize,
    phase: Phase,
}

impl CheckState {
    /// 게이트 판정. `force`면 다이얼로그 진행 여부만 봄
    pub fn gate(
        &self,
        force: bool,
        settings: &UpdateSettings,
        game_in_progress: bool,
        interval: Duration,
        now: Instant,
    ) -> Result<(), SkipReason> {
        if self.dialog_in_flight {
            return Err(SkipReason::DialogInFlight);
        }
        if force {
            return Ok(());
        }
        if !settings.check_for_updates {
            return Err(SkipReason::ChecksDisabled);
        }
        if self.suppressed {
            return Err(SkipReason::Suppressed);
        }
        if game_in_progress {
            return Err(SkipReason::GameInProgress);
        }
        match self.last_check {
            Some(last) if now.saturating_duration_since(last) < interval => Err(SkipReason::TooSoon),
            _ => Ok(()),
        }
    }

    /// 마지막 체크 시각은 앞으로만 이동
    pub fn record_check(&mut self, now: Instant) {
        self.last_check = Some(match self.last_check {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }

    pub fn last_check(&self) -> Option<Instant> {
        self.last_check
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn dialog_in_flight(&self) -> bool {
        self.dialog_in_flight
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

struct Inner {
    config: CoordinatorConfig,
    current: VersionTag,
    host: Collaborators,
    state: Mutex<CheckState>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, CheckState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, state: &mut CheckState, phase: Phase) {
        if state.phase != phase {
            state.phase = phase;
            let _ = self.events.send(CoordinatorEvent::PhaseChanged(phase));
        }
    }

    /// 다이얼로그가 끝난 뒤 돌아갈 상태
    fn settle_phase(&self, state: &mut CheckState) {
        let phase = if state.checks_in_flight > 0 {
            Phase::CheckInFlight
        } else {
            Phase::Idle
        };
        self.set_phase(state, phase);
    }
}

/// 다이얼로그 진행 플래그 해제 보장
struct DialogGuard {
    inner: Arc<Inner>,
}

impl Drop for DialogGuard {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();
        state.dialog_in_flight = false;
        if state.phase != Phase::HandingOff {
            self.inner.settle_phase(&mut state);
        }
    }
}

/// 업데이트 코디네이터. 복제해도 같은 상태를 공유
#[derive(Clone)]
pub struct UpdateCoordinator {
    inner: Arc<Inner>,
}

impl UpdateCoordinator {
    pub fn new(current: VersionTag, config: CoordinatorConfig, host: Collaborators) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                config,
                current,
                host,
                state: Mutex::new(CheckState::default()),
                events,
            }),
        }
    }

    pub fn current_version(&self) -> &VersionTag {
        &self.inner.current
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> CoordinatorStatus {
        let state = self.inner.lock_state();
        CoordinatorStatus {
            phase: state.phase,
            suppressed: state.suppressed,
            dialog_in_flight: state.dialog_in_flight,
            since_last_check: state.last_check.map(|t| t.elapsed()),
        }
    }

    /// 체크를 별도 태스크로 실행 (fire-and-forget 호출자는 핸들을 버리면 됨)
    pub fn request_check(&self, force: bool) -> JoinHandle<CheckOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.check(force).await })
    }

    /// 게이트 → 원격 체크 → (새 버전이면) 확인 시퀀스
    pub async fn check(&self, force: bool) -> CheckOutcome {
        let inner = &self.inner;
        let settings = inner.host.settings.current();
        let game_in_progress = !force && inner.host.game.is_game_in_progress();

        let gate = {
            let mut state = inner.lock_state();
            let now = Instant::now();
            let gate = state.gate(force, &settings, game_in_progress, inner.config.check_interval, now);
            if gate.is_ok() {
                // 네트워크 호출 전에 기록해야 느린 체크 동안 재시도가 몰리지 않음
                state.record_check(now);
                state.checks_in_flight += 1;
                if state.phase == Phase::Idle {
                    inner.set_phase(&mut state, Phase::CheckInFlight);
                }
            }
            gate
        };

        if let Err(reason) = gate {
            tracing::debug!("[Updater] Update check skipped: {:?}", reason);
            let _ = inner.events.send(CoordinatorEvent::CheckSkipped(reason));
            return CheckOutcome::Skipped(reason);
        }

        tracing::info!("[Updater] Checking for updates (force={})", force);
        let found = self.find_update(settings.check_for_beta_updates).await;

        let guard = {
            let mut state = inner.lock_state();
            state.checks_in_flight = state.checks_in_flight.saturating_sub(1);
            if found.is_some() && !state.dialog_in_flight {
                state.dialog_in_flight = true;
                inner.set_phase(&mut state, Phase::AwaitingWindowVisible);
                Some(DialogGuard { inner: inner.clone() })
            } else {
                if state.phase == Phase::CheckInFlight {
                    inner.settle_phase(&mut state);
                }
                None
            }
        };

        let Some((version, channel)) = found else {
            tracing::info!("[Updater] {} is up to date", inner.current);
            return CheckOutcome::UpToDate;
        };
        let _ = inner.events.send(CoordinatorEvent::UpdateFound {
            version: version.clone(),
            channel,
        });

        let Some(_guard) = guard else {
            tracing::debug!("[Updater] Update message already showing, dropping {}", version);
            return CheckOutcome::Skipped(SkipReason::DialogInFlight);
        };

        match self.run_confirmation(version, channel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[Updater] Error showing new update message: {}", e);
                CheckOutcome::Failed(e.to_string())
            }
        }
    }

    /// 안정 채널 먼저, 없으면 베타 구독자에 한해 베타 채널
    async fn find_update(&self, beta_opt_in: bool) -> Option<(VersionTag, Channel)> {
        if let Some(version) = self.fetch_newer(Channel::Stable).await {
            return Some((version, Channel::Stable));
        }
        if !beta_opt_in {
            return None;
        }
        self.fetch_newer(Channel::Beta)
            .await
            .map(|version| (version, Channel::Beta))
    }

    async fn fetch_newer(&self, channel: Channel) -> Option<VersionTag> {
        let version = self.inner.host.versions.check_for_updates(channel).await?;
        if version.is_newer_than(&self.inner.current) {
            tracing::info!("[Updater] New {} version available: {}", channel, version);
            Some(version)
        } else {
            tracing::debug!(
                "[Updater] Ignoring {} version {} (running {})",
                channel,
                version,
                self.inner.current
            );
            None
        }
    }

    async fn run_confirmation(
        &self,
        version: VersionTag,
        channel: Channel,
    ) -> Result<CheckOutcome, UpdaterError> {
        let inner = &self.inner;

        tokio::time::sleep(inner.config.settle_delay).await;
        inner.host.window.activate();
        self.wait_for_window().await?;

        self.transition(Phase::AwaitingUserResponse);
        let prompt = UpdatePrompt::new(&version, channel);
        let choice = inner
            .host
            .prompt
            .show_choice(prompt)
            .await
            .map_err(UpdaterError::Prompt)?;

        match choice {
            Choice::Affirmative => {
                let target = self.refresh_target(version, channel).await;
                Ok(self.hand_off(target))
            }
            Choice::Negative => {
                {
                    let mut state = inner.lock_state();
                    state.suppressed = true;
                    inner.set_phase(&mut state, Phase::Suppressed);
                }
                tracing::info!("[Updater] Update declined, automatic checks suppressed until restart");
                Ok(CheckOutcome::Declined)
            }
        }
    }

    /// 윈도우가 보이고 최소화되지 않을 때까지 협조적 폴링
    async fn wait_for_window(&self) -> Result<(), UpdaterError> {
        let window = &self.inner.host.window;
        let started = Instant::now();
        while !window.is_visible() || window.is_minimized() {
            if let Some(limit) = self.inner.config.visibility_timeout {
                if started.elapsed() >= limit {
                    return Err(UpdaterError::WindowNeverVisible {
                        waited: started.elapsed(),
                    });
                }
            }
            tokio::time::sleep(self.inner.config.visibility_poll).await;
        }
        Ok(())
    }

    /// 사용자가 오래 고민했다면 같은 채널을 다시 조회
    async fn refresh_target(&self, discovered: VersionTag, channel: Channel) -> VersionTag {
        let stale = {
            let state = self.inner.lock_state();
            state
                .last_check
                .map_or(true, |t| t.elapsed() > self.inner.config.check_interval)
        };
        if !stale {
            return discovered;
        }

        tracing::info!("[Updater] Re-checking {} channel before handoff", channel);
        match self.inner.host.versions.check_for_updates(channel).await {
            Some(latest) => latest,
            None => discovered,
        }
    }

    fn hand_off(&self, target: VersionTag) -> CheckOutcome {
        let inner = &self.inner;
        let host = &inner.host;

        match handoff::launch_updater(host.process.as_ref(), &inner.config.updater_executable, &target) {
            Ok(()) => {
                self.transition(Phase::HandingOff);
                handoff::finish(host.window.as_ref(), host.process.as_ref());
                CheckOutcome::HandedOff { version: target }
            }
            Err(e) => {
                tracing::error!("[Handoff] Error starting updater: {}", e);
                handoff::open_release_page(host.browser.as_ref(), &inner.config.release_page_url);
                CheckOutcome::LaunchFailed { version: target }
            }
        }
    }

    fn transition(&self, phase: Phase) {
        let mut state = self.inner.lock_state();
        self.inner.set_phase(&mut state, phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> UpdateSettings {
        UpdateSettings::default()
    }

    #[test]
    fn fresh_state_passes_gate() {
        let state = CheckState::default();
        let now = Instant::now();
        assert_eq!(state.gate(false, &enabled(), false, DEFAULT_CHECK_INTERVAL, now), Ok(()));
    }

    #[test]
    fn gate_reasons_for_unforced_requests() {
        let now = Instant::now();
        let interval = DEFAULT_CHECK_INTERVAL;

        let disabled = UpdateSettings { check_for_updates: false, ..enabled() };
        let state = CheckState::default();
        assert_eq!(state.gate(false, &disabled, false, interval, now), Err(SkipReason::ChecksDisabled));
        assert_eq!(state.gate(false, &enabled(), true, interval, now), Err(SkipReason::GameInProgress));

        let state = CheckState { suppressed: true, ..Default::default() };
        assert_eq!(state.gate(false, &enabled(), false, interval, now), Err(SkipReason::Suppressed));

        let mut state = CheckState::default();
        state.record_check(now);
        assert_eq!(state.gate(false, &enabled(), false, interval, now), Err(SkipReason::TooSoon));
        let later = now + interval;
        assert_eq!(state.gate(false, &enabled(), false, interval, later), Ok(()));
    }

    #[test]
    fn force_only_respects_dialog_in_flight() {
        let now = Instant::now();
        let disabled = UpdateSettings { check_for_updates: false, ..enabled() };
        let mut state = CheckState { suppressed: true, ..Default::default() };
        state.record_check(now);
        assert_eq!(state.gate(true, &disabled, true, DEFAULT_CHECK_INTERVAL, now), Ok(()));

        state.dialog_in_flight = true;
        assert_eq!(
            state.gate(true, &disabled, true, DEFAULT_CHECK_INTERVAL, now),
            Err(SkipReason::DialogInFlight)
        );
    }

    #[test]
    fn last_check_never_moves_backwards() {
        let now = Instant::now();
        let mut state = CheckState::default();
        state.record_check(now + Duration::from_secs(5));
        state.record_check(now);
        assert_eq!(state.last_check(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&CheckOutcome::HandedOff { version: VersionTag::new(1, 0, 0) }), 0);
        assert_eq!(exit_code(&CheckOutcome::Declined), 0);
        assert_eq!(exit_code(&CheckOutcome::Failed("x".into())), 1);
        assert_eq!(exit_code(&CheckOutcome::UpToDate), 2);
        assert_eq!(exit_code(&CheckOutcome::Skipped(SkipReason::TooSoon)), 2);
    }
}
