//! 프로세스 핸드오프: 외부 업데이터를 띄우고 현재 프로세스를 종료
//!
//! 1. 업데이터 실행 (`<pid> <major.minor.build>`)
//! 2. 메인 윈도우 닫기
//! 3. 현재 프로세스 종료
//!
//! 1단계가 실패하면 프로세스는 계속 살아 있고 릴리스 페이지를 대신 엽니다.

use std::path::Path;

use super::error::UpdaterError;
use super::host::{BrowserLauncher, MainWindow, ProcessControl};
use super::version::VersionTag;

/// 업데이터에 넘길 인자: 현재 PID와 대상 버전
pub fn handoff_args(pid: u32, target: &VersionTag) -> Vec<String> {
    vec![pid.to_string(), target.to_string()]
}

pub fn launch_updater(
    process: &dyn ProcessControl,
    executable: &Path,
    target: &VersionTag,
) -> Result<(), UpdaterError> {
    let args = handoff_args(process.current_pid(), target);
    tracing::info!(
        "[Handoff] Starting {} {}",
        executable.display(),
        args.join(" ")
    );
    process
        .spawn_updater(executable, &args)
        .map_err(|source| UpdaterError::Launch {
            path: executable.to_path_buf(),
            source,
        })
}

/// 업데이터 실행 성공 후: 되돌아오지 않는 전이
pub fn finish(window: &dyn MainWindow, process: &dyn ProcessControl) {
    tracing::info!("[Handoff] Updater spawned, closing main window and exiting");
    window.close();
    process.shutdown();
}

pub fn open_release_page(browser: &dyn BrowserLauncher, url: &str) {
    tracing::info!("[Handoff] Opening release page for manual download: {}", url);
    browser.open_url(url);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct RecordingProcess {
        fail: bool,
        spawned: Mutex<Vec<(PathBuf, Vec<String>)>>,
    }

    impl ProcessControl for RecordingProcess {
        fn spawn_updater(&self, executable: &Path, args: &[String]) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
            }
            self.spawned
                .lock()
                .unwrap()
                .push((executable.to_path_buf(), args.to_vec()));
            Ok(())
        }

        fn current_pid(&self) -> u32 {
            1234
        }

        fn shutdown(&self) {}
    }

    #[test]
    fn args_are_pid_then_version() {
        let args = handoff_args(1234, &VersionTag::new(2, 4, 1));
        assert_eq!(args.join(" "), "1234 2.4.1");
    }

    #[test]
    fn launch_passes_args_to_process() {
        let process = RecordingProcess { fail: false, spawned: Mutex::new(Vec::new()) };
        launch_updater(&process, Path::new("HDTUpdate.exe"), &VersionTag::new(2, 4, 1)).unwrap();
        let spawned = process.spawned.lock().unwrap();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].0, PathBuf::from("HDTUpdate.exe"));
        assert_eq!(spawned[0].1, vec!["1234".to_string(), "2.4.1".to_string()]);
    }

    #[test]
    fn launch_failure_is_reported_with_path() {
        let process = RecordingProcess { fail: true, spawned: Mutex::new(Vec::new()) };
        let err = launch_updater(&process, Path::new("HDTUpdate.exe"), &VersionTag::new(2, 4, 1))
            .unwrap_err();
        assert!(matches!(err, UpdaterError::Launch { .. }));
        assert!(err.to_string().contains("HDTUpdate.exe"));
    }
}
