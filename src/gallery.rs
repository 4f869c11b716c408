// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Gallery state and orchestration.
//!
//! `GalleryController` owns:
//! - the frame list (fixed for the session)
//! - the selection (ranges + pending anchor)
//! - the grid planner and the last valid grid layout
//! - pagination, backed by the route history
//!
//! Every handler runs synchronously: a width change or resize replans the grid
//! and applies the resulting page navigation before returning, so the next draw
//! never sees a stale layout.

use std::ops::Range;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::data::{FrameSet, Image};
use crate::export::ExportSink;
use crate::grid::{Container, GridLayout, GridPlanner};
use crate::pagination::{History, PaginationController};
use crate::selection::{RenderClass, SelectionEngine};

pub struct GalleryController {
    frames: FrameSet,
    selection: SelectionEngine,
    pagination: PaginationController<History>,
    planner: GridPlanner,
    layout: GridLayout,
    container: Option<Container>,
    min_image_width: u32,
    max_image_width: u32,
    width_step: u32,
    message: Option<String>,
    pub should_quit: bool,
    debug: bool,
}

impl GalleryController {
    pub fn new(frames: FrameSet, config: &Config, history: History) -> Self {
        let selection = SelectionEngine::new(&frames.frames);
        let pagination = PaginationController::new(history, frames.len());
        tracing::info!(
            frames = frames.len(),
            selected = selection.selected_count(),
            page = pagination.current_page(),
            "gallery ready"
        );
        Self {
            frames,
            selection,
            pagination,
            planner: GridPlanner {
                image_width: config.image_width,
                image_ratio: config.image_ratio,
                gap: config.grid_gap,
            },
            layout: GridLayout::default(),
            container: None,
            min_image_width: config.min_image_width,
            max_image_width: config.max_image_width,
            width_step: config.width_step,
            message: None,
            should_quit: false,
            debug: config.debug,
        }
    }

    pub fn frames(&self) -> &[Image] {
        &self.frames.frames
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    pub fn pagination(&self) -> &PaginationController<History> {
        &self.pagination
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn image_width(&self) -> u32 {
        self.planner.image_width
    }

    /// Container (re)measured: mount or resize. Last measurement wins.
    pub fn measure(&mut self, container: Container) {
        if self.container == Some(container) {
            return;
        }
        self.container = Some(container);
        self.relayout();
    }

    fn relayout(&mut self) {
        let Some(container) = self.container else {
            return;
        };
        let Some(layout) = self.planner.plan(container) else {
            tracing::debug!(?container, width = self.planner.image_width, "container too small, keeping layout");
            return;
        };
        self.layout = layout;
        if let Some(page) = self.pagination.relayout(layout.images_per_page()) {
            tracing::debug!(?layout, page, "relayout navigated");
        }
    }

    /// Set the display width, then replan with the last measured container.
    pub fn set_image_width(&mut self, width: u32) {
        let width = width.clamp(self.min_image_width, self.max_image_width);
        if width == self.planner.image_width {
            return;
        }
        self.planner.image_width = width;
        self.relayout();
    }

    pub fn adjust_width(&mut self, steps: i32) {
        let delta = i64::from(self.width_step) * i64::from(steps);
        let width = (i64::from(self.planner.image_width) + delta).clamp(0, i64::from(u32::MAX));
        self.set_image_width(width as u32);
    }

    /// Visible frames as `(global index, frame)`.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &Image)> {
        let range = self.visible_range();
        self.frames.frames[range.clone()]
            .iter()
            .enumerate()
            .map(move |(i, image)| (range.start + i, image))
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.pagination.visible_range()
    }

    pub fn to_global(&self, page_relative: usize) -> Option<usize> {
        self.pagination.global_index(page_relative)
    }

    pub fn primary_click(&mut self, page_relative: usize) {
        let Some(global) = self.to_global(page_relative) else {
            return;
        };
        self.selection.begin_or_complete_range(global);
    }

    pub fn secondary_click(&mut self, page_relative: usize) {
        let Some(global) = self.to_global(page_relative) else {
            return;
        };
        self.selection.remove_at(global);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.frames.len());
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    pub fn render_class(&self, global: usize) -> RenderClass {
        self.selection.render_class(global)
    }

    pub fn next_page(&mut self) -> bool {
        self.pagination.next_page()
    }

    pub fn prev_page(&mut self) -> bool {
        self.pagination.prev_page()
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.pagination.go_to(page);
    }

    pub fn history_back(&mut self) -> bool {
        self.pagination.navigator_mut().back()
    }

    /// Saving is offered on the last page, where "next" would be.
    pub fn can_save(&self) -> bool {
        !self.pagination.has_next_page()
    }

    /// Hand the selected frames, wrapped in the original document, to `sink`.
    pub fn save(&mut self, sink: &mut dyn ExportSink) -> Result<usize> {
        let selected: Vec<&Image> = self.selection.export_selected(self.frames()).collect();
        let count = selected.len();
        let result = self
            .frames
            .envelope_with(selected)
            .context("serializing selection")
            .and_then(|envelope| sink.export(&envelope));
        match result {
            Ok(()) => {
                tracing::info!(count, sink = sink.name(), "exported selection");
                self.message = Some(format!("saved {count} frames to {}", sink.name()));
                Ok(count)
            }
            Err(err) => {
                tracing::error!("export failed: {err:#}");
                self.message = Some(format!("save failed: {err}"));
                Err(err)
            }
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn status_text(&self) -> String {
        let page = self.pagination.current_page() as usize;
        let pages = self.pagination.page_count();
        let mut status = format!(
            "{} done / {} left | width {} | {}/{} selected",
            page,
            pages.saturating_sub(page),
            self.planner.image_width,
            self.selection.selected_count(),
            self.frames.len(),
        );
        if let Some(anchor) = self.selection.anchor() {
            status.push_str(&format!(" | from #{}", anchor + 1));
        }
        if self.debug {
            status.push_str(&format!(
                " | grid {}x{}={} runs {} route {} ({} entries)",
                self.layout.columns,
                self.layout.rows,
                self.pagination.images_per_page(),
                self.selection.ranges().as_slice().len(),
                self.pagination.navigator().route(),
                self.pagination.navigator().len(),
            ));
        }
        if let Some(message) = &self.message {
            status.push_str(" | ");
            status.push_str(message);
        }
        status
    }
}
