use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use node_globe::app::{App, ViewOptions};
use node_globe::config::Settings;
use node_globe::data::feed::LocationFeed;
use node_globe::data::{spawn_land_loader, DataEvent, LandSource};
use node_globe::map::DotFieldBuilder;
use node_globe::ui;

#[derive(Parser)]
#[command(name = "node-globe")]
#[command(version)]
#[command(about = "Spinning braille globe of active network nodes", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/node-globe/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL serving /node-locations
    #[arg(long, env = "BACKEND_URL")]
    api_url: Option<String>,

    /// Land GeoJSON: http(s) URL or local file
    #[arg(long)]
    land: Option<String>,

    /// Seconds between location polls
    #[arg(long)]
    poll_secs: Option<u64>,

    /// Land dot spacing (grid step is spacing * 0.08 degrees)
    #[arg(long)]
    dot_spacing: Option<f64>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Owns the terminal while the UI runs: alternate screen plus mouse
/// capture on creation, both undone on drop.
struct TerminalSession {
    terminal: DefaultTerminal,
}

impl TerminalSession {
    fn attach() -> Result<Self> {
        let session = Self {
            terminal: ratatui::init(),
        };
        execute!(std::io::stdout(), EnableMouseCapture)?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        ratatui::restore();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let (mut settings, config_error) = match Settings::load(&config_path) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    apply_overrides(&mut settings, cli);

    let log_path = init_logging(&settings);
    if let Some(e) = config_error {
        warn!(path = %config_path.display(), error = %format!("{e:#}"), "ignoring config file");
    }
    info!(log = ?log_path, api_url = %settings.feed.api_url, "starting node-globe");

    let mut session = TerminalSession::attach()?;
    session.terminal.clear()?;
    let size = session.terminal.size()?;

    let options = ViewOptions {
        interaction: settings.interaction(),
        hit_radius: settings.globe.hit_radius,
        wheel_step: settings.globe.wheel_step,
    };
    let mut app = App::new(size.width as usize, size.height as usize, options);

    let (tx, rx) = mpsc::channel();
    // Detached: a slow download must not hold up quitting
    let _ = spawn_land_loader(
        LandSource::parse(&settings.land.source),
        DotFieldBuilder::new(settings.land.dot_spacing),
        settings.land_timeout(),
        tx.clone(),
    )?;
    let poller = LocationFeed::new(&settings.feed.api_url, settings.feed_timeout())
        .spawn_poller(settings.poll_interval(), tx)?;

    let result = run(&mut session.terminal, &mut app, &rx, settings.frame_interval());

    app.detach();
    poller.stop();
    drop(session);
    info!("node-globe stopped");

    result
}

fn apply_overrides(settings: &mut Settings, cli: Cli) {
    if let Some(url) = cli.api_url {
        settings.feed.api_url = url;
    }
    if let Some(land) = cli.land {
        settings.land.source = land;
    }
    if let Some(secs) = cli.poll_secs {
        settings.feed.poll_secs = secs;
    }
    if let Some(spacing) = cli.dot_spacing {
        settings.land.dot_spacing = spacing;
    }
    if let Some(file) = cli.log_file {
        settings.log.file = Some(file);
    }
}

/// File-backed `tracing` subscriber. Returns the log path, or `None` when
/// the file could not be opened (logging is then off).
fn init_logging(settings: &Settings) -> Option<PathBuf> {
    let path = settings.log_path();
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(path)
}

/// Handle mouse events for dragging, hovering and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.pointer_move(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(Instant::now()),
        MouseEventKind::Moved => app.hover(mouse.column, mouse.row),
        _ => {}
    }
}

/// Frame clock: input is handled as it arrives, and one tick plus draw
/// happens per frame interval.
fn run(terminal: &mut DefaultTerminal, app: &mut App, rx: &Receiver<DataEvent>, frame_interval: Duration) -> Result<()> {
    let mut next_frame = Instant::now();

    loop {
        while let Ok(event) = rx.try_recv() {
            app.receive(event);
        }

        let now = Instant::now();
        if now >= next_frame {
            app.tick(now);
            terminal.draw(|frame| ui::render(frame, app))?;
            next_frame = now + frame_interval;
        }

        if event::poll(next_frame.saturating_duration_since(Instant::now()))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
