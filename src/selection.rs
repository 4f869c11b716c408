// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Two-click range selection over global frame indices.
//!
//! A first click on an unselected frame sets the anchor; a second click at or
//! after the anchor commits `[anchor, clicked]`. Ranges only ever run low to
//! high: clicking before the anchor moves the anchor instead.

use crate::data::Image;
use crate::interval::{Interval, IntervalSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderClass {
    Anchor,
    Selected,
    Plain,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionEngine {
    ranges: IntervalSet,
    anchor: Option<usize>,
}

impl SelectionEngine {
    /// Initial selection from the frames' `marked` flags.
    pub fn new(images: &[Image]) -> Self {
        Self {
            ranges: IntervalSet::from_flags(images.iter().map(|i| i.marked)),
            anchor: None,
        }
    }

    pub fn ranges(&self) -> &IntervalSet {
        &self.ranges
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.ranges.contains(index)
    }

    pub fn begin_or_complete_range(&mut self, clicked: usize) {
        if self.is_selected(clicked) {
            return;
        }
        match self.anchor {
            Some(anchor) if anchor <= clicked => {
                self.ranges.insert_merging(Interval::new(anchor, clicked));
                self.anchor = None;
                tracing::debug!(anchor, clicked, "range committed");
            }
            _ => self.anchor = Some(clicked),
        }
    }

    pub fn remove_at(&mut self, index: usize) {
        self.ranges.remove_containing(index);
    }

    pub fn select_all(&mut self, len: usize) {
        self.ranges = match len {
            0 => IntervalSet::new(),
            n => IntervalSet::single(Interval::new(0, n - 1)),
        };
    }

    pub fn deselect_all(&mut self) {
        self.ranges.clear();
    }

    pub fn render_class(&self, index: usize) -> RenderClass {
        if self.anchor == Some(index) {
            RenderClass::Anchor
        } else if self.is_selected(index) {
            RenderClass::Selected
        } else {
            RenderClass::Plain
        }
    }

    pub fn export_selected<'a>(&'a self, images: &'a [Image]) -> impl Iterator<Item = &'a Image> {
        images
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_selected(*i))
            .map(|(_, image)| image)
    }

    pub fn selected_count(&self) -> usize {
        self.ranges.covered()
    }
}
