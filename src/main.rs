// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Application entry point and event loop.
//!
//! This module:
//! - parses CLI args (frame list JSON, or image files/directories)
//! - sets up file logging (the terminal belongs to the UI)
//! - holds the terminal session (raw mode, alternate screen, mouse capture)
//! - runs the input loop: mouse clicks select, keys page/resize/save
//!
//! Every input is applied to `GalleryController` synchronously before the next
//! draw; resize events re-measure the grid and the last one wins.

mod config;
mod data;
mod export;
mod gallery;
mod grid;
mod interval;
mod pagination;
mod selection;
mod thumbs;
mod view;

use std::io::{Stdout, stdout};
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui_image::picker::Picker;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::export::{ExportSink, ExportTarget};
use crate::gallery::GalleryController;
use crate::pagination::History;
use crate::thumbs::Thumbnails;

#[derive(Parser, Debug)]
#[command(name = "framepick", about = "Pick frames from a paginated thumbnail grid")]
struct Cli {
    /// Frame list (.json) or image file(s) and/or directory path(s)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Initial page, as a number or a route like `/3`
    #[arg(long, alias = "route", default_value = "/")]
    page: String,

    /// Thumbnail width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Export target: stdout, clipboard or file:<path>
    #[arg(long)]
    export: Option<String>,
}

fn init_logging(config: &Config) {
    let Some(path) = config.log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("framepick=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// Raw mode + alternate screen for as long as it lives; mouse capture once enabled.
/// Everything acquired is released on drop, including on error paths.
struct TerminalSession {
    mouse: bool,
}

impl TerminalSession {
    fn enter() -> std::io::Result<Self> {
        use ratatui::crossterm::{
            cursor::Hide,
            execute,
            terminal::{Clear, ClearType, EnterAlternateScreen, enable_raw_mode},
        };

        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Clear(ClearType::All), Hide)?;
        Ok(Self { mouse: false })
    }

    fn capture_mouse(&mut self) -> std::io::Result<()> {
        use ratatui::crossterm::{event::EnableMouseCapture, execute};

        execute!(stdout(), EnableMouseCapture)?;
        self.mouse = true;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        use ratatui::crossterm::{
            cursor::Show,
            event::DisableMouseCapture,
            execute,
            terminal::{LeaveAlternateScreen, disable_raw_mode},
        };

        if self.mouse {
            let _ = execute!(stdout(), DisableMouseCapture);
        }
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, Show);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, config_err) = Config::load();
    if let Some(width) = cli.width {
        config.image_width = width;
        config.clamp_values();
    }
    if let Some(export) = &cli.export {
        config.export = export.clone();
    }
    init_logging(&config);
    if let Some(err) = config_err {
        tracing::warn!("ignoring config file: {err:#}");
    }

    let target: ExportTarget = config.export.parse()?;
    let frames = data::load(&cli.paths)?;
    if frames.is_empty() {
        tracing::warn!("frame list is empty");
    }
    let mut gallery = GalleryController::new(frames, &config, History::new(&cli.page));
    let mut sink = export::open(&target);

    let result = {
        let mut session = TerminalSession::enter().context("entering terminal session")?;
        let picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::from_fontsize((8, 16)));
        session.capture_mouse()?;
        let threads = if config.thumbnails {
            config.thumbnail_threads
        } else {
            0
        };
        let mut thumbs = Thumbnails::new(picker, threads, config.thumbnail_cache_size);
        run(&mut gallery, &mut thumbs, sink.as_mut())
    };

    sink.finish()?;
    if let Err(err) = &result {
        tracing::error!("exiting with error: {err:#}");
    }
    result
}

/// Paths of the visible frames that point at local files.
fn visible_paths(gallery: &GalleryController) -> Vec<PathBuf> {
    gallery
        .visible()
        .filter_map(|(_, image)| image.local_path())
        .collect()
}

fn run(
    gallery: &mut GalleryController,
    thumbs: &mut Thumbnails,
    sink: &mut dyn ExportSink,
) -> Result<()> {
    let mut terminal: Terminal<CrosstermBackend<Stdout>> =
        Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut count: u32 = 0;
    let mut page: Option<(Range<usize>, Vec<PathBuf>)> = None;

    loop {
        let (w, h) = ratatui::crossterm::terminal::size()?;
        let areas = view::split(Rect::new(0, 0, w, h));
        gallery.measure(view::container_for(areas.grid, thumbs.cell_size()));

        let range = gallery.visible_range();
        if page.as_ref().is_none_or(|(r, _)| *r != range) {
            page = Some((range, visible_paths(gallery)));
        }
        if let Some((_, paths)) = &page {
            thumbs.request_page(paths, gallery.image_width());
        }
        thumbs.poll();

        terminal.draw(|frame| view::draw(frame, gallery, thumbs))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        // Drain everything that is queued; a burst of resizes collapses into one measure.
        loop {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let KeyCode::Char(c) = key.code
                        && c.is_ascii_digit()
                        && (c != '0' || count != 0)
                    {
                        // Vim-like count prefix for `g`.
                        count = count
                            .saturating_mul(10)
                            .saturating_add((c as u8 - b'0') as u32);
                    } else {
                        handle_key(gallery, sink, key.code, count);
                        count = 0;
                    }
                }
                Event::Mouse(mouse) => handle_mouse(gallery, areas.grid, mouse),
                _ => {}
            }
            if gallery.should_quit || !event::poll(Duration::ZERO)? {
                break;
            }
        }

        if gallery.should_quit {
            break;
        }
    }

    Ok(())
}

/// Count prefix as a step count: at least 1, saturating at `i32::MAX`.
fn step_count(count: u32) -> i32 {
    i32::try_from(count.max(1)).unwrap_or(i32::MAX)
}

fn handle_key(gallery: &mut GalleryController, sink: &mut dyn ExportSink, code: KeyCode, count: u32) {
    gallery.clear_message();
    match code {
        KeyCode::Char('q') | KeyCode::Esc => gallery.should_quit = true,
        KeyCode::Char('+') | KeyCode::Char('=') => gallery.adjust_width(step_count(count)),
        KeyCode::Char('-') => gallery.adjust_width(-step_count(count)),
        KeyCode::Char('a') => gallery.select_all(),
        KeyCode::Char('d') => gallery.deselect_all(),
        KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
            gallery.next_page();
        }
        KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
            gallery.prev_page();
        }
        KeyCode::Char('g') => gallery.go_to_page(count.max(1)),
        KeyCode::Char('G') => {
            let last = gallery.pagination().page_count().max(1) as u32;
            gallery.go_to_page(if count > 0 { count } else { last });
        }
        KeyCode::Char('u') | KeyCode::Backspace => {
            if !gallery.history_back() {
                gallery.set_message("no earlier page");
            }
        }
        KeyCode::Char('s') => {
            if gallery.can_save() {
                // Failures are logged and shown on the status line.
                let _ = gallery.save(sink);
            } else {
                gallery.set_message("save is available on the last page");
            }
        }
        _ => {}
    }
}

fn handle_mouse(gallery: &mut GalleryController, grid: Rect, mouse: MouseEvent) {
    let MouseEventKind::Down(button) = mouse.kind else {
        return;
    };
    let Some(slot) = view::hit_test(grid, gallery.layout(), mouse.column, mouse.row) else {
        return;
    };
    gallery.clear_message();
    match button {
        MouseButton::Left => gallery.primary_click(slot),
        MouseButton::Right => gallery.secondary_click(slot),
        MouseButton::Middle => {}
    }
}
