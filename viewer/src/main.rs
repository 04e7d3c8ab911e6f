mod capture;
mod resize;
mod render;
mod snapshot;

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use ansicam_core::config::{Config, ResizeFilter};
use ansicam_core::geometry::GridSize;
use ansicam_core::grid::{compute_delta, quantize_frame, CellGrid, FrameDiff};
use ansicam_core::palette::XTERM;
use ansicam_core::pixel::PixelLayout;
use ansicam_core::quantize::{ColorMode, QuantizeOptions, Quantizer, DEFAULT_GREY_LEVELS, MIN_GREY_LEVELS};

use crate::capture::Capture;
use crate::render::CellStyle;
use crate::resize::FrameResizer;

#[derive(Parser)]
#[command(name = "ansicam", version, about = "Live camera view in 256 terminal colors")]
struct Cli {
    /// Camera device, video file or URL (default: /dev/video0, or 0 on macOS)
    input: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ffmpeg input format, e.g. v4l2, avfoundation, dshow
    #[arg(short, long)]
    format: Option<String>,

    /// Requested capture size, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Requested capture frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Pixels at or below this saturation (0-255) render in grey
    #[arg(short = 't', long)]
    threshold: Option<u8>,

    /// Grey levels used in grey mode (2-26)
    #[arg(long)]
    grey_levels: Option<u8>,

    /// Width:height of one terminal character cell
    #[arg(long)]
    cell_aspect: Option<f64>,

    /// Render in greys only
    #[arg(short, long)]
    grey: bool,

    /// Do not flip the picture horizontally
    #[arg(long)]
    no_mirror: bool,

    /// Draw each cell two columns wide
    #[arg(short, long)]
    wide: bool,

    /// Draw brightness glyphs instead of colored blanks
    #[arg(short, long)]
    ascii: bool,

    /// Resampling filter
    #[arg(long, value_enum)]
    filter: Option<Filter>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Write logs here instead of stderr (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Filter {
    Nearest,
    Bilinear,
    Lanczos3,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("{v:?}: {e}"));
    Ok((parse(w)?, parse(h)?))
}

/// `RUST_LOG` filtering, default `warn`. Stderr shares the screen with the
/// picture, so a log file is the useful target while viewing.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.format_timestamp_micros().target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Load the config file if given, then apply flag overrides and validate.
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let capture = &mut config.capture;
    if let Some(input) = &cli.input {
        capture.input = input.clone();
    }
    if cli.format.is_some() {
        capture.format = cli.format.clone();
    }
    if let Some((w, h)) = cli.size {
        capture.width = w;
        capture.height = h;
    }
    if let Some(fps) = cli.fps {
        capture.fps = fps;
    }

    let render = &mut config.render;
    if let Some(t) = cli.threshold {
        render.saturation_threshold = t;
    }
    if let Some(levels) = cli.grey_levels {
        render.grey_levels = levels;
    }
    if let Some(aspect) = cli.cell_aspect {
        render.cell_aspect = aspect;
    }
    if cli.grey {
        render.mode = ColorMode::Grey;
    }
    if cli.no_mirror {
        render.mirror = false;
    }
    render.wide |= cli.wide;
    render.ascii |= cli.ascii;
    if let Some(filter) = cli.filter {
        render.filter = match filter {
            Filter::Nearest => ResizeFilter::Nearest,
            Filter::Bilinear => ResizeFilter::Bilinear,
            Filter::Lanczos3 => ResizeFilter::Lanczos3,
        };
    }
    if let Some(dir) = &cli.snapshot_dir {
        render.snapshot_dir = dir.clone();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Settings the keyboard can change while running.
struct ViewState {
    options: QuantizeOptions,
    mirror: bool,
    style: CellStyle,
    cell_aspect: f64,
    snapshot_dir: PathBuf,
    snapshots: u32,
}

impl ViewState {
    fn new(config: &Config) -> Self {
        Self {
            options: config.render.quantize_options(),
            mirror: config.render.mirror,
            style: CellStyle {
                wide: config.render.wide,
                ascii: config.render.ascii,
            },
            cell_aspect: config.render.cell_aspect,
            snapshot_dir: config.render.snapshot_dir.clone(),
            snapshots: 0,
        }
    }

    /// Grid that fits the terminal, or `None` if it has no room at all.
    fn grid_for(&self, term_cols: u16, term_rows: u16) -> Option<GridSize> {
        let cols = term_cols / self.style.columns();
        (cols > 0 && term_rows > 0).then(|| GridSize::new(cols, term_rows))
    }

    fn drawn_cell_aspect(&self) -> f64 {
        self.cell_aspect * f64::from(self.style.columns())
    }
}

/// Save the last drawn grid. Failures are logged; the session goes on.
fn take_snapshot(grid: Option<&CellGrid>, state: &mut ViewState) -> Option<PathBuf> {
    let Some(grid) = grid else {
        log::warn!("nothing drawn yet, snapshot skipped");
        return None;
    };
    match snapshot::save(grid, state.style, &state.snapshot_dir, state.snapshots) {
        Ok(path) => {
            state.snapshots += 1;
            log::info!("saved snapshot {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::error!("snapshot failed: {e:#}");
            None
        }
    }
}

enum Action {
    None,
    Quit,
    Redraw,
    Snapshot,
}

fn handle_key(key: KeyEvent, state: &mut ViewState) -> Action {
    let opts = &mut state.options;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('m') => {
            state.mirror = !state.mirror;
            Action::Redraw
        }
        KeyCode::Char('g') => {
            opts.mode = match opts.mode {
                ColorMode::Color => ColorMode::Grey,
                ColorMode::Grey => ColorMode::Color,
            };
            Action::Redraw
        }
        KeyCode::Char('a') => {
            state.style.ascii = !state.style.ascii;
            Action::Redraw
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            opts.saturation_threshold = opts.saturation_threshold.saturating_add(8);
            log::info!("saturation threshold {}", opts.saturation_threshold);
            Action::Redraw
        }
        KeyCode::Char('-') => {
            opts.saturation_threshold = opts.saturation_threshold.saturating_sub(8);
            log::info!("saturation threshold {}", opts.saturation_threshold);
            Action::Redraw
        }
        KeyCode::Char(']') => {
            opts.grey_levels = (opts.grey_levels + 1).min(DEFAULT_GREY_LEVELS);
            Action::Redraw
        }
        KeyCode::Char('[') => {
            opts.grey_levels = opts.grey_levels.saturating_sub(1).max(MIN_GREY_LEVELS);
            Action::Redraw
        }
        KeyCode::Char('s') => Action::Snapshot,
        _ => Action::None,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref())?;

    let config = resolve_config(&cli)?;
    let capture = Capture::open(&config.capture)?;
    let mut state = ViewState::new(&config);
    let mut resizer = FrameResizer::new(config.render.filter);

    // Set up panic hook for terminal cleanup
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        cleanup_terminal();
        original_hook(info);
    }));

    // Enter alternate screen, raw mode, hide cursor
    terminal::enable_raw_mode()?;
    let stdout = std::io::stdout();
    let mut stdout = BufWriter::with_capacity(256 * 1024, stdout.lock());
    stdout.write_all(b"\x1b[?1049h")?; // enter alternate screen
    stdout.write_all(b"\x1b[?25l")?; // hide cursor
    stdout.flush()?;

    let result = run_view_loop(&capture, &mut resizer, &mut state, &mut stdout);

    // Cleanup
    stdout.write_all(b"\x1b[0m")?; // reset colors
    stdout.write_all(b"\x1b[?25h")?; // show cursor
    stdout.write_all(b"\x1b[?1049l")?; // leave alternate screen
    stdout.flush()?;
    terminal::disable_raw_mode()?;
    drop(capture);

    result
}

fn run_view_loop(
    capture: &Capture,
    resizer: &mut FrameResizer,
    state: &mut ViewState,
    stdout: &mut impl Write,
) -> anyhow::Result<()> {
    let mut render_buf = Vec::with_capacity(256 * 1024);
    let mut prev: Option<CellGrid> = None;
    let mut force_full = true;
    let mut clear = true;

    loop {
        // Drain input (non-blocking)
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match handle_key(key, state) {
                    Action::Quit => return Ok(()),
                    Action::Redraw => {
                        force_full = true;
                        clear = true;
                    }
                    Action::Snapshot => {
                        take_snapshot(prev.as_ref(), state);
                    }
                    Action::None => {}
                },
                Event::Resize(..) => {
                    force_full = true;
                    clear = true;
                }
                _ => {}
            }
        }

        let Some(frame) = capture.next_frame(Duration::from_millis(50))? else {
            continue;
        };

        let (term_cols, term_rows) = terminal::size()?;
        let Some(grid) = state.grid_for(term_cols, term_rows) else {
            log::debug!("terminal {term_cols}x{term_rows} too small, skipping frame");
            continue;
        };
        if resizer.configure(frame.width, frame.height, grid, state.drawn_cell_aspect()) {
            force_full = true;
            clear = true;
        }

        let samples = resizer.resize(frame)?;
        let quantizer = Quantizer::new(&XTERM, state.options);
        let cells = quantize_frame(&samples, PixelLayout::Rgb, grid, &quantizer, state.mirror)?;

        match compute_delta(prev.as_ref(), &cells, force_full) {
            FrameDiff::Full => render::render_full(&cells, state.style, &mut render_buf),
            FrameDiff::Delta(ref deltas) => render::render_delta(deltas, state.style, &mut render_buf),
        }

        if clear {
            stdout.write_all(b"\x1b[0m\x1b[2J")?;
            clear = false;
        }
        stdout.write_all(&render_buf)?;
        stdout.flush()?;

        prev = Some(cells);
        force_full = false;
    }
}

fn cleanup_terminal() {
    let _ = std::io::stdout().write_all(b"\x1b[0m\x1b[?25h\x1b[?1049l");
    let _ = std::io::stdout().flush();
    let _ = terminal::disable_raw_mode();
}
