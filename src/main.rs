mod app;
mod basemap;
mod braille;
mod config;
mod data;
mod error;
mod events;
mod layout;
mod loader;
mod map;
mod markers;
mod sidebar;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::MapConfig;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use loader::Loader;
use ratatui::DefaultTerminal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Terminal map of spreadsheet-published locations
#[derive(Parser, Debug)]
#[command(name = "tui-sheetmap", version, about)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV URL of the point dataset
    #[arg(short, long)]
    url: Option<String>,

    /// Marker style: marker, circleMarker or circle
    #[arg(short, long)]
    marker_style: Option<String>,

    /// Don't fetch basemap tiles
    #[arg(long)]
    no_tiles: bool,

    /// Log file (the terminal is taken by the map)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MapConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.url {
        config.points_url = url;
    }
    if let Some(style) = args.marker_style {
        config.markers.style = style;
    }
    if args.no_tiles {
        config.tiles.enabled = false;
    }
    config.validate().context("Invalid configuration")?;

    init_logging(args.log_file, args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let mut loader = Loader::new(runtime.handle().clone(), Duration::from_secs(config.request_timeout_secs))
        .context("Failed to build HTTP client")?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, config, &mut loader);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

/// Send tracing output to a file since the TUI owns stdout. Logging stays
/// off when no file can be opened.
fn init_logging(path: Option<PathBuf>, verbose: bool) {
    let Some(path) = path.or_else(|| dirs::cache_dir().map(|dir| dir.join("tui-sheetmap").join("tui-sheetmap.log")))
    else {
        return;
    };
    let file = match open_log_file(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            return;
        }
    };

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .init();
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Handle mouse events for panning, zooming and clicks
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Press, then either drag to pan or release to click
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: MapConfig, loader: &mut Loader) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, size.width, size.height);
    info!(url = %app.config.points_url, "map mounted, loading dataset");
    loader.fetch_dataset(&app.config.points_url);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Apply finished requests
        while let Some(event) = loader.try_next() {
            app.on_load_event(event);
        }
        for (coord, url) in app.request_tiles() {
            loader.fetch_tile(coord, url);
        }

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') => app.quit(),
                            KeyCode::Esc => {
                                if app.sidebar.is_open() {
                                    app.sidebar.close_active();
                                } else {
                                    app.quit();
                                }
                            }

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Walk through markers
                            KeyCode::Tab => app.cycle_marker(true),
                            KeyCode::BackTab => app.cycle_marker(false),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            // Retry a failed dataset load
                            KeyCode::Char('R') => {
                                if app.begin_retry() {
                                    info!("retrying dataset load");
                                    loader.fetch_dataset(&app.config.points_url);
                                }
                            }

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width, height);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.teardown();
    info!("map torn down");
    Ok(())
}
