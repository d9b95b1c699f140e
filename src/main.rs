use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

use gardensync::app::{App, Services};
use gardensync::model::config::{self, AppConfig};
use gardensync::model::settings::{SettingsContext, SettingsStore};
use gardensync::msg::Msg;
use gardensync::sync::GitHubContents;
use gardensync::workflow::CommandPullRequestCreator;

fn main() -> Result<()> {
    // Initialize logging to file (never stdout)
    let log_dir = config::data_dir().unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "gardensync.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gardensync=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .init();

    tracing::info!("gardensync starting");

    let config = AppConfig::load()?;
    let (settings, settings_error) =
        SettingsContext::open_or_default(SettingsStore::new(config.settings_path()?));

    // All network work runs cooperatively on one worker.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("gardensync-io")
        .enable_all()
        .build()
        .context("build async runtime")?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(
        &mut terminal,
        config,
        settings,
        settings_error.is_some(),
        runtime.handle().clone(),
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    runtime.shutdown_timeout(Duration::from_millis(500));

    if let Err(e) = result {
        eprintln!("gardensync error: {e:?}");
    }

    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: AppConfig,
    settings: SettingsContext,
    settings_reset: bool,
    runtime: Handle,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();

    let services = Services {
        store: Arc::new(GitHubContents::new(&config.github)?),
        creator: Arc::new(CommandPullRequestCreator::new(
            config.pull_request.command.clone(),
        )),
        http: gardensync::sync::http_client(&config.github.user_agent)?,
    };

    let mut app = App::new(config, settings, services, runtime, tx.clone());
    app.request_catalog();
    if settings_reset {
        app.push_notification("Saved settings could not be read; starting fresh.".to_string());
    }

    // Input thread: reads terminal events and forwards them as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event) = event::read() {
                let msg = match event {
                    Event::Key(k) => Msg::Key(k),
                    Event::Resize(w, h) => Msg::Resize(w, h),
                    _ => continue,
                };
                if tx_input.send(msg).is_err() {
                    break;
                }
            }
        }
    });

    // Tick thread: redraws the loading indicator between events
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_millis(100));
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            app.update(msg)?;
        }

        if app.should_quit {
            app.shutdown();
            break;
        }

        terminal.draw(|f| app.view(f))?;
    }

    Ok(())
}
