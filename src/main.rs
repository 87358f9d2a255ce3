mod app;
mod ui;

use anyhow::{bail, Result};
use app::App;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui_layermap::config::MapSettings;
use tui_layermap::data;
use tui_layermap::demo::DemoKind;
use tui_layermap::element::{ElementKind, ElementRegistry};
use tui_layermap::map::LineString;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal map with selectable GeoJSON layer groups")]
struct Args {
    /// Demo page to open, by element tag
    #[arg(long, default_value = "map-demo")]
    demo: String,

    /// JSON map settings (center, zoom, basemaps)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory with basemap outline GeoJSON files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Log file; the terminal belongs to the map
    #[arg(long, default_value = "tui-layermap.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log = File::create(&args.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let elements = ElementRegistry::bootstrap()?;
    let kind = match elements.lookup(&args.demo)? {
        ElementKind::Demo(kind) => kind,
        other => bail!("{} is a {} element, not a demo page", args.demo, other.name()),
    };
    let settings = args.settings.as_deref().map(MapSettings::load).transpose()?;
    let outlines = data::load_outlines(Some(&args.data_dir));
    info!(demo = kind.tag(), outlines = outlines.len(), "starting");

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, kind, settings, outlines);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Mouse: wheel zooms, drag pans, click selects, right click drops a point
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Right) => app.drop_point(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    kind: DemoKind,
    settings: Option<MapSettings>,
    outlines: Vec<LineString>,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(kind, settings, outlines, size.width, size.height);

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.status = None;
                    match key.code {
                        KeyCode::Char('q') => app.quit(),
                        KeyCode::Esc => app.escape(),

                        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                        KeyCode::Char('b') | KeyCode::Char('B') => app.map.renderer_mut().toggle_basemap(),
                        KeyCode::Char('L') => app.map.renderer_mut().toggle_labels(),
                        KeyCode::Char('m') | KeyCode::Char('M') => app.map.next_basemap(),

                        KeyCode::Char('p') => app.cycle_province(true),
                        KeyCode::Char('P') => app.cycle_province(false),
                        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_legend(),
                        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_layer(),
                        KeyCode::Char('f') | KeyCode::Char('F') => app.fit_to_layer(),
                        KeyCode::Char('c') | KeyCode::Char('C') => app.clear(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset_colors(),

                        KeyCode::Tab => app.map.focus_next_button(),
                        KeyCode::Enter => app.press_popup_button(),

                        _ => {}
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
