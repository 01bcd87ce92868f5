//! hdt-updater: 업데이트 코디네이터 독립 실행 바이너리
//!
//! ## 사용법
//! ```
//! hdt-updater                  # run: 정리 후 주기 체크, Ctrl+C까지
//! hdt-updater check [--force]  # 한 번 체크
//! hdt-updater cleanup          # 업데이터 파일 정리만
//! hdt-updater config           # 유효 설정 출력
//! ```

use std::sync::Arc;

use hdt_updater::config::AppConfig;
use hdt_updater::updater::coordinator::exit_code;
use hdt_updater::updater::system::{ConsolePrompt, HeadlessWindow, HearthstoneProcess, SystemBrowser, SystemProcess};
use hdt_updater::updater::{cleanup, Collaborators, GitHubVersionSource, PeriodicCheck, UpdateCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 로그는 stderr로 보내 stdout의 프롬프트와 섞이지 않게 함
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args_ref: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    match args_ref.first().copied().unwrap_or("run") {
        "run" => run().await,
        "check" => {
            let force = args_ref.contains(&"--force");
            let code = check_once(force).await?;
            std::process::exit(code);
        }
        "cleanup" => {
            let cfg = AppConfig::load()?;
            let report = cleanup::run(&cfg.layout());
            if report.is_noop() {
                println!("Nothing to clean up");
            }
            if report.replaced_updater {
                println!("✓ Replaced updater with staged version");
            }
            if report.removed_legacy {
                println!("✓ Removed legacy updater");
            }
            for e in &report.errors {
                println!("✗ {}", e);
            }
            Ok(())
        }
        "config" => {
            let cfg = AppConfig::load()?;
            print!("{}", cfg.to_toml()?);
            Ok(())
        }
        "--version" | "-V" => {
            println!("hdt-updater {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(1);
        }
    }
}

fn build_coordinator(cfg: &AppConfig) -> anyhow::Result<UpdateCoordinator> {
    let current = cfg.app_version()?;
    let versions = GitHubVersionSource::new(&cfg.github, current.clone())?;

    let host = Collaborators {
        versions: Arc::new(versions),
        settings: Arc::new(cfg.updates.clone()),
        game: Arc::new(HearthstoneProcess::new()),
        window: Arc::new(HeadlessWindow),
        prompt: Arc::new(ConsolePrompt),
        browser: Arc::new(SystemBrowser),
        process: Arc::new(SystemProcess),
    };

    Ok(UpdateCoordinator::new(current, cfg.coordinator_config(), host))
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load()?;
    tracing::info!("HDT updater starting (install dir: {})", cfg.install_dir().display());

    // 첫 체크 요청 전에 정리
    cleanup::run(&cfg.layout());

    let coordinator = build_coordinator(&cfg)?;
    drop(coordinator.request_check(false));

    let mut scheduler = PeriodicCheck::new(coordinator, cfg.schedule_interval());
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    scheduler.stop();
    Ok(())
}

async fn check_once(force: bool) -> anyhow::Result<i32> {
    let cfg = AppConfig::load()?;
    let coordinator = build_coordinator(&cfg)?;
    let outcome = coordinator.check(force).await;
    println!("{:?}", outcome);
    Ok(exit_code(&outcome))
}

fn print_help() {
    println!("hdt-updater {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("  hdt-updater [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  run              Clean up, then check periodically until Ctrl+C (default)");
    println!("  check [--force]  Check once; exit 0 = update found, 1 = error, 2 = none");
    println!("  cleanup          Replace staged updater and remove legacy files");
    println!("  config           Print the effective configuration");
    println!("  help             Show this help");
}
