use std::{
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use tracing::{info, warn};
use tt::{
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{self, CrosstermEventSource, FramePacer, Runner},
    telemetry,
    typing_test::{Flow, TypingTest},
    ui::TestView,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// a minimalist terminal typing speed test
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type the phrase before the countdown runs out. Press . to start, tab to reset and esc to quit."
)]
pub struct Cli {
    /// phrase to type instead of the configured one
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// JSON config file (defaults to the platform config dir)
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write trace logs to $TT_LOG_FILE (or tt.log in the temp dir)
    #[clap(long)]
    log: bool,

    /// save the effective config (including -p) to the config file and exit
    #[clap(long)]
    write_config: bool,
}

impl Cli {
    /// An explicitly named config file must load; the default one falls
    /// back to built-in settings.
    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => FileConfigStore::with_path(path)
                .load()
                .with_context(|| format!("loading {}", path.display()))?,
            None => {
                let store = FileConfigStore::new();
                store.load().unwrap_or_else(|e| {
                    warn!(error = %e, path = %store.path().display(), "using default config");
                    Config::default()
                })
            }
        };

        self.apply_prompt(config)
    }

    fn apply_prompt(&self, config: Config) -> Result<Config> {
        match &self.prompt {
            Some(prompt) => Ok(config.with_phrase(prompt.as_str()).validate()?),
            None => Ok(config),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

/// Raw mode and the alternate screen, undone on drop whichever way the
/// session ends.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, SetTitle("tt."))?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = disable_raw_mode();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log);

    if cli.write_config {
        // a file that fails to load is left alone rather than overwritten
        let store = cli.config_store();
        let config = store
            .load()
            .with_context(|| format!("loading {}", store.path().display()))?;
        store.save(&cli.apply_prompt(config)?)?;
        println!("wrote {}", store.path().display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config = cli.load_config()?;
    info!(phrase = %config.phrase, "starting");

    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    start_tui(&mut terminal, config)
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, config: Config) -> Result<()> {
    let (sender, rx) = runtime::event_queue();
    #[cfg(unix)]
    let _signals = runtime::SignalForwarder::spawn(sender.clone())?;
    let mut test = TypingTest::with_tick_sink(config, sender.tick_sink());
    let runner = Runner::new(CrosstermEventSource::new(sender, rx), POLL_INTERVAL);

    let size = terminal.size()?;
    test.handle_resize(size.width, size.height);

    let mut pacer = FramePacer::new(FRAME_INTERVAL, POLL_INTERVAL);
    loop {
        let now = Instant::now();
        if pacer.should_draw(now) {
            terminal.draw(|f| ui(&test, f))?;
            pacer.drawn(now);
        }

        let Some(event) = runner.step_for(pacer.wait(Instant::now()))? else {
            continue;
        };
        if test.handle_event(event) == Flow::Quit {
            return Ok(());
        }
        pacer.mark_dirty();
    }
}

fn ui(test: &TypingTest, f: &mut Frame) {
    let snapshot = test.snapshot();
    let theme = test.config().theme;
    f.render_widget(TestView::new(&snapshot, &theme), f.area());
}
