//! GitHub Release API 기반 버전 체크
//!
//! 릴리스 목록을 가져와 draft를 제외하고, 채널에 맞는 릴리스
//! (stable = `prerelease: false`, beta = `prerelease: true`) 중
//! 현재 버전보다 높은 가장 최신 태그를 고릅니다.
//! 네트워크/HTTP/JSON 실패는 경고 로그 후 "업데이트 없음"으로 취급합니다.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::UpdaterError;
use super::host::VersionSource;
use super::version::{Channel, VersionTag};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub 저장소 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    /// API 베이스 URL 오버라이드 (테스트용 로컬 서버, 예: "http://127.0.0.1:9876")
    pub api_base_url: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: "HearthSim".to_string(),
            repo: "Hearthstone-Deck-Tracker".to_string(),
            api_base_url: None,
        }
    }
}

/// GitHub Release 응답 (필요한 필드만)
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    pub html_url: Option<String>,
}

pub struct GitHubVersionSource {
    owner: String,
    repo: String,
    base_url: String,
    current: VersionTag,
    http: reqwest::Client,
}

impl GitHubVersionSource {
    pub fn new(config: &GitHubConfig, current: VersionTag) -> Result<Self, UpdaterError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("hdt-updater/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            base_url: config
                .api_base_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            current,
            http,
        })
    }

    /// 릴리스 목록 (최대 per_page개)
    pub async fn fetch_releases(&self, per_page: u32) -> Result<Vec<GitHubRelease>, UpdaterError> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={}",
            self.base_url, self.owner, self.repo, per_page
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UpdaterError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }

    /// 채널의 최신 버전 중 현재보다 높은 것
    pub async fn latest_for(&self, channel: Channel) -> Result<Option<VersionTag>, UpdaterError> {
        let releases = self.fetch_releases(30).await?;
        Ok(select_newer(&releases, channel, &self.current))
    }
}

/// 릴리스 목록에서 채널에 맞는 가장 높은 새 버전 선택
pub fn select_newer(
    releases: &[GitHubRelease],
    channel: Channel,
    current: &VersionTag,
) -> Option<VersionTag> {
    releases
        .iter()
        .filter(|r| !r.draft && r.prerelease == channel.is_beta())
        .filter_map(|r| VersionTag::parse(&r.tag_name))
        .map(|v| if channel.is_beta() { v.into_beta() } else { v })
        .filter(|v| v.is_newer_than(current))
        .max()
}

impl VersionSource for GitHubVersionSource {
    fn check_for_updates(&self, channel: Channel) -> BoxFuture<'_, Option<VersionTag>> {
        async move {
            match self.latest_for(channel).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("[GitHub] {} update check failed: {}", channel, e);
                    None
                }
            }
        }
        .boxed()
    }
}
