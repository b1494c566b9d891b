mod ui;

use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::thread_rng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use tracing::{info, warn};
use typlax::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::{HistoryDb, HistoryError, SessionResult, RECENT_RESULTS_LIMIT},
    input::KeyPress,
    logging::init_file_logging,
    metrics::SessionStats,
    modes::{ModeId, PassageSet},
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    session::PlaySession,
};

use crate::ui::screen::current_screen;

/// typing practice in the terminal, with live speed and accuracy
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "Type a passage while a live HUD tracks your speed, accuracy and progress. Finished sessions get a scorecard with burst speed and consistency and are kept in a local history."
)]
pub struct Cli {
    /// mode to play (defaults to the configured mode)
    #[clap(short = 'm', long, value_enum)]
    mode: Option<ModeId>,

    /// custom prompt to type instead of a built-in passage
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// open the history screen first
    #[clap(long)]
    history: bool,

    /// write every recorded session to FILE as CSV and exit
    #[clap(long, value_name = "FILE")]
    export_history: Option<PathBuf>,

    /// history database to use instead of the default one
    #[clap(long, value_name = "FILE")]
    history_db: Option<PathBuf>,

    /// preferences file to use instead of the default one
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// hide the on-screen keyboard
    #[clap(long)]
    no_keyboard: bool,

    /// use a high contrast palette instead of the mode colors
    #[clap(long)]
    high_contrast: bool,

    /// print the available modes and exit
    #[clap(long)]
    list_modes: bool,

    /// store the effective preferences (after flags) as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags override stored preferences
    fn apply(&self, mut config: Config) -> Config {
        if let Some(mode) = self.mode {
            config.default_mode = mode;
        }
        if self.no_keyboard {
            config.show_keyboard = false;
        }
        if self.high_contrast {
            config.high_contrast = true;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }

    fn open_history(&self) -> Result<HistoryDb, HistoryError> {
        match &self.history_db {
            Some(path) => HistoryDb::open(path),
            None => HistoryDb::open_default(),
        }
    }

    /// The game runs without history if the database can't be opened
    fn optional_history(&self) -> Option<HistoryDb> {
        self.open_history()
            .map_err(|e| warn!(error = %e, "history disabled"))
            .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

#[derive(Debug)]
pub struct App {
    pub cli: Cli,
    pub config: Config,
    pub passages: PassageSet,
    pub session: PlaySession,
    pub state: AppState,
    /// Stats shown by the HUD, refreshed on every tick
    pub hud: SessionStats,
    pub last_milestone: Option<u8>,
    pub history: Option<HistoryDb>,
    /// Row of the finished session in history, replaced after corrections
    pub recorded: Option<i64>,
    pub recent: Vec<SessionResult>,
    /// Best WPM for the mode before the last finished session
    pub best_wpm: Option<u32>,
    pub should_quit: bool,
}

impl App {
    pub fn new(cli: Cli, config: Config, passages: PassageSet, history: Option<HistoryDb>) -> Self {
        let text = next_text(&cli, &passages);
        let session = PlaySession::new(config.default_mode, &text);
        let show_history = cli.history;

        let mut app = Self {
            hud: session.poll(),
            cli,
            config,
            passages,
            session,
            state: AppState::Typing,
            last_milestone: None,
            history,
            recorded: None,
            recent: Vec::new(),
            best_wpm: None,
            should_quit: false,
        };

        app.enter_typing();
        if show_history {
            app.show_history();
        }
        app
    }

    /// Same passage again
    pub fn restart(&mut self) {
        self.session.reset();
        self.enter_typing();
    }

    pub fn new_passage(&mut self) {
        let text = next_text(&self.cli, &self.passages);
        self.session = PlaySession::new(self.config.default_mode, &text);
        self.enter_typing();
    }

    fn enter_typing(&mut self) {
        self.hud = self.session.poll();
        self.last_milestone = None;
        self.best_wpm = None;
        self.recorded = None;
        self.state = if self.session.is_complete() {
            AppState::Results
        } else {
            AppState::Typing
        };
    }

    fn finish(&mut self) {
        self.hud = self.session.poll();
        self.state = AppState::Results;

        let (Some(result), Some(db)) = (self.session.scorecard(), &self.history) else {
            return;
        };

        if let Some(id) = self.recorded {
            if let Err(e) = db.replace(id, &result) {
                warn!(error = %e, "failed to update corrected session");
            }
            return;
        }

        self.best_wpm = db.best_wpm(result.mode).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read personal best");
            None
        });
        match db.record(&result) {
            Ok(id) => self.recorded = Some(id),
            Err(e) => warn!(error = %e, "failed to record session"),
        }
    }

    /// Reopens a finished session to fix the last characters
    fn correct(&mut self) {
        self.session.handle_key(&KeyPress::backspace());
        if !self.session.is_complete() {
            self.hud = self.session.poll();
            self.state = AppState::Typing;
        }
    }

    pub fn show_history(&mut self) {
        self.recent = match &self.history {
            Some(db) => db.recent(RECENT_RESULTS_LIMIT).unwrap_or_else(|e| {
                warn!(error = %e, "failed to load history");
                Vec::new()
            }),
            None => Vec::new(),
        };
        self.state = AppState::History;
    }

    /// Refreshes the HUD while a session is running. Returns true if the
    /// screen needs a redraw.
    pub fn on_tick(&mut self) -> bool {
        if self.state == AppState::Typing
            && self.session.has_started()
            && !self.session.is_complete()
        {
            self.hud = self.session.poll();
            return true;
        }
        false
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Left => self.restart(),
                KeyCode::Right => self.new_passage(),
                _ => {
                    let outcome = self.session.handle_key(&KeyPress::from(key));
                    if let Some(milestone) = outcome.milestone {
                        self.last_milestone = Some(milestone);
                    }
                    if outcome.finished {
                        self.finish();
                    }
                }
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Left => self.restart(),
                KeyCode::Char('n') | KeyCode::Right => self.new_passage(),
                KeyCode::Char('h') => self.show_history(),
                KeyCode::Backspace => self.correct(),
                _ => {}
            },
            AppState::History => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => {
                    self.state = if self.session.final_stats().is_some() {
                        AppState::Results
                    } else {
                        AppState::Typing
                    };
                }
                KeyCode::Char('n') => self.new_passage(),
                _ => {}
            },
        }
    }
}

/// The custom prompt if one was given, otherwise a random built-in passage
fn next_text(cli: &Cli, passages: &PassageSet) -> String {
    match &cli.prompt {
        Some(prompt) => prompt.clone(),
        None => passages
            .random(&mut thread_rng())
            .unwrap_or_default()
            .to_string(),
    }
}

fn write_mode_list<W: Write>(out: &mut W) -> io::Result<()> {
    for id in ModeId::ALL {
        let mode = id.mode();
        writeln!(
            out,
            "{:<14} {:<17} {:<9} {}",
            id.to_string(),
            mode.name,
            mode.difficulty.to_string(),
            mode.description
        )?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        // the game runs without a log file
        let _ = init_file_logging(&log_path);
    }

    let store = cli.config_store();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "saved preferences");
    }

    if cli.list_modes {
        write_mode_list(&mut io::stdout().lock())?;
        return Ok(());
    }

    if let Some(path) = &cli.export_history {
        let history = cli.open_history()?;
        let count = history.export_csv(File::create(path)?)?;
        info!(count, path = %path.display(), "exported history");
        println!("exported {count} sessions to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let history = cli.optional_history();
    let passages = PassageSet::classic()?;
    let ticker = FixedTicker::from_millis(config.hud_refresh_ms.max(1));
    let mut app = App::new(cli, config, passages, history);
    let mut runner = Runner::new(CrosstermEventSource::new(), ticker);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    while !app.should_quit {
        let redraw = match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => true,
            AppEvent::Key(key) => {
                app.on_key(key);
                true
            }
        };

        if redraw && !app.should_quit {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    current_screen(&app.state).render(app, f);
}
