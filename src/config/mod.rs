//! 업데이터 설정 파일 관리
//!
//! `hdt-updater.toml`에서 설정을 로드합니다. 파일이 없으면 기본값을 사용합니다.
//!
//! ```toml
//! [updates]
//! check_for_updates = true
//! check_for_beta_updates = false
//!
//! [updater]
//! check_interval_secs = 600
//! settle_delay_secs = 10
//! updater_exe = "HDTUpdate.exe"
//!
//! [github]
//! owner = "HearthSim"
//! repo = "Hearthstone-Deck-Tracker"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::updater::coordinator::{DEFAULT_CHECK_INTERVAL, DEFAULT_RELEASE_PAGE, DEFAULT_SETTLE_DELAY};
use crate::updater::scheduler::DEFAULT_SCHEDULE_INTERVAL;
use crate::updater::{CoordinatorConfig, GitHubConfig, UpdateSettings, UpdaterLayout, VersionTag};

pub const CONFIG_FILE_NAME: &str = "hdt-updater.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 사용자 설정
    pub updates: UpdateSettings,
    /// 코디네이터 동작 및 파일 위치
    pub updater: UpdaterSection,
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterSection {
    pub check_interval_secs: u64,
    pub settle_delay_secs: u64,
    pub visibility_poll_ms: u64,
    /// 없으면 창이 보일 때까지 무한 대기
    pub visibility_timeout_secs: Option<u64>,
    /// 주기 체크 트리거 간격 (0이면 비활성)
    pub schedule_interval_secs: u64,
    pub release_page_url: String,
    /// 기본값: 실행 파일 디렉터리
    pub install_dir: Option<PathBuf>,
    pub updater_exe: String,
    pub staged_updater_exe: String,
    /// v0.9.6 이전 업데이터
    pub legacy_updater_exe: String,
    /// 실행 중인 앱 버전 오버라이드 (기본: 크레이트 버전)
    pub app_version: Option<String>,
}

impl Default for UpdaterSection {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL.as_secs(),
            settle_delay_secs: DEFAULT_SETTLE_DELAY.as_secs(),
            visibility_poll_ms: 100,
            visibility_timeout_secs: None,
            schedule_interval_secs: DEFAULT_SCHEDULE_INTERVAL.as_secs(),
            release_page_url: DEFAULT_RELEASE_PAGE.to_string(),
            install_dir: None,
            updater_exe: "HDTUpdate.exe".to_string(),
            staged_updater_exe: "HDTUpdate_new.exe".to_string(),
            legacy_updater_exe: "Updater.exe".to_string(),
            app_version: None,
        }
    }
}

/// 설정 파일 경로 결정
pub fn config_file_path() -> PathBuf {
    // 1. 실행 파일 옆 config/hdt-updater.toml 또는 hdt-updater.toml
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let cfg = dir.join("config").join(CONFIG_FILE_NAME);
            if cfg.exists() {
                return cfg;
            }
            let cfg = dir.join(CONFIG_FILE_NAME);
            if cfg.exists() {
                return cfg;
            }
        }
    }

    // 2. 기본: CWD의 config/hdt-updater.toml
    PathBuf::from("config").join(CONFIG_FILE_NAME)
}

impl AppConfig {
    /// 기본 위치에서 로드 (파일이 없으면 기본값)
    pub fn load() -> Result<Self> {
        let path = config_file_path();
        if !path.exists() {
            tracing::debug!("[Config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let cfg: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("[Config] Loaded from {}", path.display());
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// 업데이터 파일이 있는 설치 디렉터리
    pub fn install_dir(&self) -> PathBuf {
        self.updater.install_dir.clone().unwrap_or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    pub fn layout(&self) -> UpdaterLayout {
        let dir = self.install_dir();
        UpdaterLayout {
            live: dir.join(&self.updater.updater_exe),
            staged: dir.join(&self.updater.staged_updater_exe),
            legacy: dir.join(&self.updater.legacy_updater_exe),
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let section = &self.updater;
        CoordinatorConfig {
            check_interval: Duration::from_secs(section.check_interval_secs),
            settle_delay: Duration::from_secs(section.settle_delay_secs),
            visibility_poll: Duration::from_millis(section.visibility_poll_ms.max(1)),
            visibility_timeout: section.visibility_timeout_secs.map(Duration::from_secs),
            updater_executable: self.install_dir().join(&section.updater_exe),
            release_page_url: section.release_page_url.clone(),
        }
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.updater.schedule_interval_secs)
    }

    /// 실행 중인 앱 버전
    pub fn app_version(&self) -> Result<VersionTag> {
        let raw = self
            .updater
            .app_version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"));
        VersionTag::parse(raw).with_context(|| format!("Invalid app_version '{}'", raw))
    }
}
