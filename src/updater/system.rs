//! 실제 OS 협력자 구현 (독립 실행 바이너리용)

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::path::Path;
use std::process::{Command, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::host::{BrowserLauncher, Choice, ConfirmationPrompt, GameState, MainWindow, ProcessControl, UpdatePrompt};

/// 업데이터 스폰 + 프로세스 종료
pub struct SystemProcess;

impl ProcessControl for SystemProcess {
    fn spawn_updater(&self, executable: &Path, args: &[String]) -> std::io::Result<()> {
        let mut cmd = Command::new(executable);
        cmd.args(args);

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            // DETACHED_PROCESS | CREATE_BREAKAWAY_FROM_JOB | CREATE_NEW_PROCESS_GROUP
            cmd.creation_flags(0x00000008 | 0x01000000 | 0x00000200);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }

    fn current_pid(&self) -> u32 {
        std::process::id()
    }

    fn shutdown(&self) {
        tracing::info!("[Handoff] Exiting for update");
        std::process::exit(0);
    }
}

/// 기본 브라우저로 URL 열기
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open_url(&self, url: &str) {
        if let Err(e) = open::that(url) {
            tracing::warn!("[Browser] Failed to open {}: {}", url, e);
        }
    }
}

/// 터미널 y/n 프롬프트
pub struct ConsolePrompt;

impl ConfirmationPrompt for ConsolePrompt {
    fn show_choice(&self, prompt: UpdatePrompt) -> BoxFuture<'_, anyhow::Result<Choice>> {
        async move {
            let mut stdout = tokio::io::stdout();
            let text = format!(
                "\n{}\n{}\n[y] {} / [n] {}: ",
                prompt.title, prompt.body, prompt.affirmative, prompt.negative
            );
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await?;

            let mut line = String::new();
            BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
            Ok(parse_answer(&line))
        }
        .boxed()
    }
}

/// "y"/"yes"/"download"만 긍정, 나머지(빈 입력, EOF 포함)는 부정
fn parse_answer(line: &str) -> Choice {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "download" => Choice::Affirmative,
        _ => Choice::Negative,
    }
}

/// 항상 보이는 창 (콘솔 모드)
pub struct HeadlessWindow;

impl MainWindow for HeadlessWindow {
    fn activate(&self) {}

    fn is_visible(&self) -> bool {
        true
    }

    fn is_minimized(&self) -> bool {
        false
    }

    fn close(&self) {
        tracing::debug!("[Window] Close requested");
    }
}

/// Hearthstone 클라이언트 프로세스가 떠 있으면 게임 중으로 간주
pub struct HearthstoneProcess {
    process_name: String,
}

impl HearthstoneProcess {
    pub fn new() -> Self {
        #[cfg(target_os = "windows")]
        let process_name = "Hearthstone.exe".to_string();
        #[cfg(not(target_os = "windows"))]
        let process_name = "Hearthstone".to_string();
        Self { process_name }
    }

    pub fn with_name(process_name: impl Into<String>) -> Self {
        Self { process_name: process_name.into() }
    }

    #[cfg(target_os = "windows")]
    fn is_running(&self) -> bool {
        let output = Command::new("tasklist")
            .args(["/FI", &format!("IMAGENAME eq {}", self.process_name)])
            .output();

        match output {
            Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&self.process_name),
            Err(_) => false,
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn is_running(&self) -> bool {
        let output = Command::new("pgrep").arg("-x").arg(&self.process_name).output();

        match output {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

impl Default for HearthstoneProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for HearthstoneProcess {
    fn is_game_in_progress(&self) -> bool {
        self.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers() {
        assert_eq!(parse_answer("y\n"), Choice::Affirmative);
        assert_eq!(parse_answer("  Download "), Choice::Affirmative);
        assert_eq!(parse_answer("n"), Choice::Negative);
        assert_eq!(parse_answer(""), Choice::Negative);
    }

    #[test]
    fn missing_process_is_not_a_game() {
        let probe = HearthstoneProcess::with_name("hdt-updater-test-no-such-process");
        assert!(!probe.is_game_in_progress());
    }

    #[test]
    fn spawning_missing_updater_fails() {
        let err = SystemProcess
            .spawn_updater(Path::new("./definitely-missing-HDTUpdate.exe"), &["1".into(), "2.4.1".into()])
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
