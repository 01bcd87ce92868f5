//! # HDT 셀프 업데이트 코디네이터
//!
//! ## 동작 원리
//! - **체크 게이팅**: 설정 off / 거절 후 억제 / 게임 진행 중 / 다이얼로그 표시 중 /
//!   10분 이내 재요청이면 조용히 무시 (`force`는 다이얼로그 표시 중만 확인)
//! - **확인 시퀀스**: 10초 대기 → 창 활성화 → 창이 보일 때까지 폴링 →
//!   "Download" / "Not now" 선택
//! - **핸드오프**: 외부 업데이터(`HDTUpdate.exe <pid> <version>`) 실행 후 종료,
//!   실패하면 릴리스 페이지로 대체
//! - **정리**: 시작 시 스테이징된 업데이터 교체, 구버전 업데이터 삭제
//!
//! 네트워크, UI, 프로세스는 모두 [`host`]의 트레이트를 통해 주입됩니다.
//! 어떤 실패도 호스트 프로세스를 죽이지 않고 로그 한 줄로 끝납니다.

pub mod cleanup;
pub mod coordinator;
pub mod error;
pub mod github;
pub mod handoff;
pub mod host;
pub mod scheduler;
pub mod system;
pub mod version;


pub use cleanup::{CleanupReport, UpdaterLayout};
pub use coordinator::{
    CheckOutcome, CoordinatorConfig, CoordinatorEvent, CoordinatorStatus, Phase, SkipReason,
    UpdateCoordinator,
};
pub use error::UpdaterError;
pub use github::{GitHubConfig, GitHubVersionSource};
pub use host::{
    BrowserLauncher, Choice, Collaborators, ConfirmationPrompt, GameState, MainWindow,
    ProcessControl, SettingsSource, UpdatePrompt, UpdateSettings, VersionSource,
};
pub use scheduler::PeriodicCheck;
pub use version::{Channel, VersionTag};
