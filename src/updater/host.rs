//! 업데이트 코디네이터가 소비하는 외부 협력자 인터페이스
//!
//! 코디네이터는 UI, 네트워크, 프로세스를 직접 다루지 않고
//! 이 트레이트들을 통해서만 바깥과 대화합니다. 테스트에서는 가짜 구현을 주입합니다.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

use super::version::{Channel, VersionTag};

/// 원격 버전 체크 서비스
pub trait VersionSource: Send + Sync {
    /// 채널의 최신 버전. 최신 상태이거나 체크에 실패하면 `None` (에러를 던지지 않음)
    fn check_for_updates(&self, channel: Channel) -> BoxFuture<'_, Option<VersionTag>>;
}

/// 사용자 업데이트 설정 (읽기 전용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// 주기적 업데이트 확인 사용 여부
    pub check_for_updates: bool,
    /// 베타 릴리스 알림 수신 여부
    pub check_for_beta_updates: bool,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            check_for_updates: true,
            check_for_beta_updates: false,
        }
    }
}

/// 사용자 설정 저장소
pub trait SettingsSource: Send + Sync {
    fn current(&self) -> UpdateSettings;
}

impl SettingsSource for UpdateSettings {
    fn current(&self) -> UpdateSettings {
        self.clone()
    }
}

/// 설정 화면이 값을 바꾸면 다음 체크부터 반영됨
impl SettingsSource for watch::Receiver<UpdateSettings> {
    fn current(&self) -> UpdateSettings {
        self.borrow().clone()
    }
}

/// 게임 진행 상태 조회
pub trait GameState: Send + Sync {
    fn is_game_in_progress(&self) -> bool;
}

/// 메인 윈도우
pub trait MainWindow: Send + Sync {
    /// 포그라운드로 가져오기
    fn activate(&self);
    fn is_visible(&self) -> bool;
    fn is_minimized(&self) -> bool;
    fn close(&self);
}

/// 사용자 응답
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Affirmative,
    Negative,
}

/// 확인 다이얼로그 내용
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrompt {
    pub title: String,
    pub body: String,
    pub affirmative: String,
    pub negative: String,
    pub version: VersionTag,
    pub channel: Channel,
}

impl UpdatePrompt {
    pub fn new(version: &VersionTag, channel: Channel) -> Self {
        let beta = if channel.is_beta() { " BETA" } else { "" };
        Self {
            title: format!("New{} Update available!", beta),
            body: format!(
                "Version {}{} is available. Press \"Download\" to automatically download.",
                version, beta
            ),
            affirmative: "Download".to_string(),
            negative: "Not now".to_string(),
            version: version.clone(),
            channel,
        }
    }
}

/// 비동기 확인 UI: 사용자가 응답할 때까지 호출자를 중단시킴
pub trait ConfirmationPrompt: Send + Sync {
    fn show_choice(&self, prompt: UpdatePrompt) -> BoxFuture<'_, anyhow::Result<Choice>>;
}

/// 기본 브라우저 실행기 (실패는 삼킴)
pub trait BrowserLauncher: Send + Sync {
    fn open_url(&self, url: &str);
}

/// 프로세스 실행/종료
pub trait ProcessControl: Send + Sync {
    /// 외부 업데이터 실행. 실패는 호출자가 처리할 수 있어야 함
    fn spawn_updater(&self, executable: &Path, args: &[String]) -> std::io::Result<()>;
    fn current_pid(&self) -> u32;
    /// 현재 프로세스 종료 (실제 구현은 반환하지 않음)
    fn shutdown(&self);
}

/// 코디네이터에 주입되는 협력자 묶음
#[derive(Clone)]
pub struct Collaborators {
    pub versions: Arc<dyn VersionSource>,
    pub settings: Arc<dyn SettingsSource>,
    pub game: Arc<dyn GameState>,
    pub window: Arc<dyn MainWindow>,
    pub prompt: Arc<dyn ConfirmationPrompt>,
    pub browser: Arc<dyn BrowserLauncher>,
    pub process: Arc<dyn ProcessControl>,
}
