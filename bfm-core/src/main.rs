//! src/main.rs
//! Terminal file browser: command line, logging, config, terminal setup and
//! the event loop.

use std::{
    io::{self, Stdout},
    panic::PanicHookInfo,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use bfm_core::{
    config::Config,
    controller::{
        EventLoop, ProcessLauncher, StalenessMonitor, event_loop::spawn_input_reader,
    },
    logging::init_logging,
    model::SessionManager,
};

type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Keyboard-driven file browser with independent sessions.
#[derive(Debug, Parser)]
#[command(name = "bfm", version, about)]
struct Cli {
    /// Directory to open (defaults to the current directory).
    path: Option<PathBuf>,

    /// Read settings from FILE instead of the default location.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start with dotfiles visible.
    #[arg(short = 'a', long)]
    show_dotfiles: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let cli: Cli = Cli::parse();

    let mut config: Config = Config::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    if cli.show_dotfiles {
        config.show_dotfiles = true;
    }

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let _log_guard: Option<WorkerGuard> = match Config::log_dir() {
        Ok(dir) => match init_logging(dir).await {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("bfm: logging disabled: {e:#}");
                None
            }
        },
        Err(e) => {
            eprintln!("bfm: logging disabled: {e:#}");
            None
        }
    };

    setup_panic_handler();
    info!("Starting bfm");

    let app = App::new(cli, config)
        .await
        .context("Failed to initialize application")?;
    app.run().await.context("Application runtime error")?;

    info!("Application exited cleanly");
    Ok(())
}

struct App {
    terminal: AppTerminal,
    /// Keyboard enhancement flags were pushed and must be popped.
    enhanced_keys: bool,
    event_loop: EventLoop,
    monitor: StalenessMonitor,
    cancel: CancellationToken,
}

impl App {
    async fn new(cli: Cli, config: Config) -> Result<Self> {
        let keymap = config.keymap()?;

        let base: PathBuf = std::env::current_dir().context("Failed to get current directory")?;
        let initial: PathBuf = cli.path.unwrap_or_else(|| base.clone());

        let mut manager: SessionManager = SessionManager::new(config.manager_settings());
        manager
            .open_session(&initial, &base)
            .await
            .with_context(|| format!("Cannot open {}", initial.display()))?;

        let (launcher, reports) = ProcessLauncher::new();
        let event_loop: EventLoop = EventLoop::new(
            manager,
            keymap,
            Arc::new(launcher),
            reports,
            config.time_format.clone(),
        );

        let (terminal, enhanced_keys) =
            setup_terminal().context("Failed to initialize terminal")?;

        Ok(Self {
            terminal,
            enhanced_keys,
            event_loop,
            monitor: StalenessMonitor::new(config.poll_duration()),
            cancel: CancellationToken::new(),
        })
    }

    async fn run(mut self) -> Result<()> {
        self.setup_shutdown_handler();

        let events = spawn_input_reader(self.cancel.child_token());
        let (ticks, monitor_handle) = self.monitor.spawn(self.cancel.child_token());

        let result: Result<()> = self
            .event_loop
            .run(&mut self.terminal, events, ticks, self.cancel.clone())
            .await;

        self.cancel.cancel();
        if let Err(e) = monitor_handle.await {
            warn!("Staleness monitor ended abnormally: {e}");
        }

        result
    }

    fn setup_shutdown_handler(&self) {
        let cancel: CancellationToken = self.cancel.clone();

        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let (mut sigterm, mut sigint) =
                    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                        (Ok(term), Ok(int)) => (term, int),
                        (Err(e), _) | (_, Err(e)) => {
                            warn!("Failed to install signal handlers: {e}");
                            return;
                        }
                    };

                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = sigint.recv() => info!("Received SIGINT"),
                    () = cancel.cancelled() => return,
                }
            }

            #[cfg(not(unix))]
            {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => match result {
                        Ok(()) => info!("Received Ctrl+C"),
                        Err(e) => {
                            warn!("Failed to listen for Ctrl+C: {e}");
                            return;
                        }
                    },
                    () = cancel.cancelled() => return,
                }
            }

            cancel.cancel();
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Err(e) = cleanup_terminal(&mut self.terminal, self.enhanced_keys) {
            warn!("Failed to cleanup terminal: {}", e);
        }
    }
}

/// Raw mode, alternate screen and, where the terminal supports it,
/// disambiguated key reporting so chords like `Ctrl+.` arrive intact.
fn setup_terminal() -> Result<(AppTerminal, bool)> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let enhanced_keys: bool = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("Failed to enable keyboard enhancement")?;
    }

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;

    info!(enhanced_keys, "Terminal setup complete");
    Ok((terminal, enhanced_keys))
}

fn cleanup_terminal(terminal: &mut AppTerminal, enhanced_keys: bool) -> Result<()> {
    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("Failed to disable keyboard enhancement")?;
    }
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    info!("Terminal cleanup complete");
    Ok(())
}

fn setup_panic_handler() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);

        error!("Application panicked: {}", panic_info);
        original_hook(panic_info);
    }));
}
