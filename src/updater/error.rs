//! 업데이터 에러 타입
//!
//! ## 분류
//! - 무시 가능: 네트워크 체크 실패 → "업데이트 없음"으로 취급 (이 타입까지 오지 않음)
//! - 복구 가능, 보고: 업데이터 실행 실패 → 릴리스 페이지로 대체
//! - 복구 가능, 조용히: 확인 시퀀스 중 실패 → 로그 후 no-op
//! - 최선 노력: 정리(cleanup) 파일 작업 실패 → 로그만

use std::path::PathBuf;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum UpdaterError {
    #[error("Failed to start updater '{}': {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Confirmation prompt failed: {0}")]
    Prompt(#[source] anyhow::Error),

    #[error("Main window did not become visible within {}s", waited.as_secs())]
    WindowNeverVisible { waited: Duration },

    #[error("File system error during {operation} on '{}': {source}", path.display())]
    FileSystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl UpdaterError {
    pub fn from_io(err: std::io::Error, operation: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            operation,
            path: path.into(),
            source: err,
        }
    }

    /// 다음 주기 체크로 자연히 복구되는지 여부
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Launch { .. } | Self::Prompt(_) | Self::WindowNeverVisible { .. } => true,
            Self::Network(_) => true,
            // 5xx는 다음 주기에 다시 시도할 가치가 있음
            Self::Api { status_code, .. } => *status_code >= 500,
            Self::FileSystem { .. } | Self::Config(_) => false,
        }
    }

    /// 머신 리더블 에러 코드
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Launch { .. } => "LAUNCH_FAILED",
            Self::Prompt(_) => "PROMPT_FAILED",
            Self::WindowNeverVisible { .. } => "WINDOW_NEVER_VISIBLE",
            Self::FileSystem { .. } => "FILE_SYSTEM",
            Self::Network(_) => "NETWORK",
            Self::Api { .. } => "API_ERROR",
            Self::Config(_) => "CONFIG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn launch_error_mentions_path() {
        let err = UpdaterError::Launch {
            path: PathBuf::from("HDTUpdate.exe"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("HDTUpdate.exe"));
        assert!(msg.contains("missing"));
        assert_eq!(err.error_code(), "LAUNCH_FAILED");
        assert!(err.is_recoverable());
    }

    #[test]
    fn filesystem_errors_are_not_recoverable() {
        let err = UpdaterError::from_io(
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            "delete",
            "Updater.exe",
        );
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("during delete on 'Updater.exe'"));
    }

    #[test]
    fn api_errors_recoverable_only_for_server_side() {
        let server = UpdaterError::Api { status_code: 503, message: "unavailable".into() };
        let client = UpdaterError::Api { status_code: 404, message: "not found".into() };
        assert!(server.is_recoverable());
        assert!(!client.is_recoverable());
        assert_eq!(client.to_string(), "API error (404): not found");
    }

    #[test]
    fn window_timeout_reports_seconds() {
        let err = UpdaterError::WindowNeverVisible { waited: Duration::from_secs(30) };
        assert_eq!(err.to_string(), "Main window did not become visible within 30s");
    }
}
