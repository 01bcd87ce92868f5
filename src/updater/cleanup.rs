//! 시작 시 업데이터 실행 파일 정리
//!
//! 업데이터는 실행 중인 자기 자신을 덮어쓸 수 없으므로, 새 업데이터를
//! `HDTUpdate_new.exe`로 스테이징해 두고 다음 실행 때 여기서 교체합니다.
//!
//! 순서: 기존 업데이터 삭제 → 스테이징 파일 이름 변경.
//! 두 단계 사이에 프로세스가 죽으면 업데이터가 없는 상태로 남습니다 (알려진 한계).
//! 각 단계는 독립적으로 실패를 허용하고, 실패는 로그만 남깁니다.

use std::path::{Path, PathBuf};

use super::error::UpdaterError;

/// 설치 디렉터리 내 업데이터 관련 파일 경로
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterLayout {
    /// 현재 업데이터 (`HDTUpdate.exe`)
    pub live: PathBuf,
    /// 스테이징된 교체본 (`HDTUpdate_new.exe`)
    pub staged: PathBuf,
    /// v0.9.6 이전 업데이터 (`Updater.exe`)
    pub legacy: PathBuf,
}

impl UpdaterLayout {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            live: dir.join("HDTUpdate.exe"),
            staged: dir.join("HDTUpdate_new.exe"),
            legacy: dir.join("Updater.exe"),
        }
    }
}

/// 정리 결과
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub replaced_updater: bool,
    pub removed_legacy: bool,
    pub errors: Vec<UpdaterError>,
}

impl CleanupReport {
    /// 아무것도 바뀌지 않았고 에러도 없음
    pub fn is_noop(&self) -> bool {
        !self.replaced_updater && !self.removed_legacy && self.errors.is_empty()
    }
}

/// 첫 체크 요청 전에 한 번 실행. 절대 실패로 끝나지 않음
pub fn run(layout: &UpdaterLayout) -> CleanupReport {
    let mut report = CleanupReport::default();

    match replace_staged_updater(layout) {
        Ok(replaced) => report.replaced_updater = replaced,
        Err(e) => {
            tracing::error!("[Cleanup] Error updating updater: {}", e);
            report.errors.push(e);
        }
    }

    match remove_legacy_updater(layout) {
        Ok(removed) => report.removed_legacy = removed,
        Err(e) => {
            tracing::error!("[Cleanup] Error deleting legacy updater: {}", e);
            report.errors.push(e);
        }
    }

    report
}

fn replace_staged_updater(layout: &UpdaterLayout) -> Result<bool, UpdaterError> {
    if !layout.staged.exists() {
        return Ok(false);
    }

    if layout.live.exists() {
        std::fs::remove_file(&layout.live)
            .map_err(|e| UpdaterError::from_io(e, "delete", &layout.live))?;
    }
    std::fs::rename(&layout.staged, &layout.live)
        .map_err(|e| UpdaterError::from_io(e, "rename", &layout.staged))?;

    tracing::info!(
        "[Cleanup] Replaced {} with staged {}",
        layout.live.display(),
        layout.staged.display()
    );
    Ok(true)
}

fn remove_legacy_updater(layout: &UpdaterLayout) -> Result<bool, UpdaterError> {
    if !layout.legacy.exists() {
        return Ok(false);
    }

    std::fs::remove_file(&layout.legacy)
        .map_err(|e| UpdaterError::from_io(e, "delete", &layout.legacy))?;
    tracing::info!("[Cleanup] Removed legacy updater {}", layout.legacy.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_uses_default_names() {
        let layout = UpdaterLayout::in_dir("/opt/hdt");
        assert_eq!(layout.live, PathBuf::from("/opt/hdt/HDTUpdate.exe"));
        assert_eq!(layout.staged, PathBuf::from("/opt/hdt/HDTUpdate_new.exe"));
        assert_eq!(layout.legacy, PathBuf::from("/opt/hdt/Updater.exe"));
    }

    #[test]
    fn empty_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(&UpdaterLayout::in_dir(dir.path()));
        assert!(report.is_noop());
    }
}
