// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Screen projection of the gallery state.
//!
//! Layout: one status row, the thumbnail grid, one key-help row. Tiles are
//! spread over whole cells so that every tile boundary is cell-aligned, and the
//! same geometry is used to map mouse positions back to page-relative indices.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui_image::StatefulImage;

use crate::gallery::GalleryController;
use crate::grid::{Container, GridLayout};
use crate::selection::RenderClass;
use crate::thumbs::Thumbnails;

const HELP: &str =
    "click: mark from/to | right-click: unmark run | +/-: width | a/d: all/none | n/p: page | Ng: go | u: back | q: quit";

pub struct Areas {
    pub status: Rect,
    pub grid: Rect,
    pub help: Rect,
}

pub fn split(full: Rect) -> Areas {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(full);
    Areas {
        status: chunks[0],
        grid: chunks[1],
        help: chunks[2],
    }
}

/// Grid area size in pixels.
pub fn container_for(grid: Rect, cell_size: (u16, u16)) -> Container {
    Container::new(
        u32::from(grid.width) * u32::from(cell_size.0),
        u32::from(grid.height) * u32::from(cell_size.1),
    )
}

/// Cell-aligned rectangle of each page slot, row-major.
pub fn tile_rects(grid: Rect, layout: GridLayout) -> Vec<Rect> {
    let (cols, rows) = (layout.columns as u32, layout.rows as u32);
    if cols == 0 || rows == 0 {
        return Vec::new();
    }
    let (w, h) = (u32::from(grid.width), u32::from(grid.height));
    let mut out = Vec::with_capacity(layout.images_per_page());
    for row in 0..rows {
        for col in 0..cols {
            let x0 = col * w / cols;
            let x1 = (col + 1) * w / cols;
            let y0 = row * h / rows;
            let y1 = (row + 1) * h / rows;
            out.push(Rect::new(
                grid.x + x0 as u16,
                grid.y + y0 as u16,
                (x1 - x0) as u16,
                (y1 - y0) as u16,
            ));
        }
    }
    out
}

/// Page-relative slot under a terminal cell.
pub fn hit_test(grid: Rect, layout: GridLayout, column: u16, row: u16) -> Option<usize> {
    let pos = Position::new(column, row);
    tile_rects(grid, layout)
        .iter()
        .position(|r| r.contains(pos))
}

fn class_style(class: RenderClass) -> (Style, &'static str) {
    match class {
        RenderClass::Anchor => (
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            "> ",
        ),
        RenderClass::Selected => (
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            "+ ",
        ),
        RenderClass::Plain => (Style::default().fg(Color::DarkGray), ""),
    }
}

pub fn draw(frame: &mut Frame, gallery: &GalleryController, thumbs: &mut Thumbnails) {
    let areas = split(frame.area());

    let nav = gallery.pagination();
    let mut status = vec![Span::raw(gallery.status_text())];
    if nav.has_prev_page() {
        status.push(Span::styled("  [p] prev", Style::default().fg(Color::Cyan)));
    }
    if nav.has_next_page() {
        status.push(Span::styled("  [n] next", Style::default().fg(Color::Cyan)));
    } else if gallery.can_save() {
        status.push(Span::styled(
            "  [s] save",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(status)), areas.status);

    let rects = tile_rects(areas.grid, gallery.layout());
    for ((global, image), rect) in gallery.visible().zip(rects) {
        let (style, marker) = class_style(gallery.render_class(global));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(format!("{marker}{}", image.id));
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        if inner.width < 2 || inner.height < 1 {
            continue;
        }

        let path = image.local_path();
        if let Some(protocol) = path.as_deref().and_then(|p| thumbs.get_mut(p)) {
            let widget = StatefulImage::default();
            frame.render_stateful_widget(widget, inner, protocol);
            continue;
        }

        let label = match &path {
            Some(p) if thumbs.is_loading(p) => "loading...".to_string(),
            _ => image.display_name().to_string(),
        };
        let y = inner.y + inner.height.saturating_sub(1) / 2;
        frame.render_widget(
            Paragraph::new(label)
                .style(style)
                .alignment(Alignment::Center),
            Rect::new(inner.x, y, inner.width, 1),
        );
    }

    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        areas.help,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::{FrameSet, Image, ImageId};
    use crate::pagination::History;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui_image::picker::Picker;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draw_thumbnail_and_text_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("local.png");
        image::RgbaImage::new(32, 18).save(&local).unwrap();

        let frames = FrameSet::new(vec![
            Image {
                id: ImageId::from(7u64),
                url: local.to_string_lossy().into_owned(),
                marked: true,
                extra: Default::default(),
            },
            Image {
                id: ImageId::from("remote"),
                url: "http://host/clip/frame-2.jpg".to_string(),
                marked: false,
                extra: Default::default(),
            },
        ]);
        let mut gallery = GalleryController::new(frames, &Config::default(), History::default());
        let full = Rect::new(0, 0, 80, 24);
        gallery.measure(container_for(split(full).grid, (8, 16)));

        let mut thumbs = Thumbnails::new(Picker::from_fontsize((8, 16)), 0, 4);
        thumbs.insert_decoded(local, image::DynamicImage::ImageRgba8(image::RgbaImage::new(32, 18)));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| draw(frame, &gallery, &mut thumbs))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("1 done / 0 left"));
        assert!(text.contains("+ 7"));
        assert!(text.contains("remote"));
        assert!(text.contains("frame-2.jpg"));
    }

    #[test]
    fn test_split_reserves_status_and_help() {
        let areas = split(Rect::new(0, 0, 80, 24));
        assert_eq!(areas.status, Rect::new(0, 0, 80, 1));
        assert_eq!(areas.grid, Rect::new(0, 1, 80, 22));
        assert_eq!(areas.help, Rect::new(0, 23, 80, 1));
    }

    #[test]
    fn test_container_in_pixels() {
        let c = container_for(Rect::new(0, 1, 200, 50), (8, 16));
        assert_eq!(c, Container::new(1600, 800));
    }

    #[test]
    fn test_tiles_cover_grid_without_overlap() {
        let grid = Rect::new(0, 1, 100, 40);
        let layout = GridLayout { columns: 3, rows: 2 };
        let rects = tile_rects(grid, layout);
        assert_eq!(rects.len(), 6);
        let area: u32 = rects.iter().map(|r| u32::from(r.width) * u32::from(r.height)).sum();
        assert_eq!(area, 100 * 40);
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(*b));
            }
        }
    }

    #[test]
    fn test_hit_test_maps_cells_to_slots() {
        let grid = Rect::new(0, 1, 90, 40);
        let layout = GridLayout { columns: 3, rows: 2 };
        assert_eq!(hit_test(grid, layout, 0, 1), Some(0));
        assert_eq!(hit_test(grid, layout, 45, 1), Some(1));
        assert_eq!(hit_test(grid, layout, 89, 40), Some(5));
        assert_eq!(hit_test(grid, layout, 10, 0), None);
        assert_eq!(hit_test(grid, layout, 10, 41), None);
    }

    #[test]
    fn test_no_tiles_without_layout() {
        assert!(tile_rects(Rect::new(0, 0, 10, 10), GridLayout::default()).is_empty());
    }
}
