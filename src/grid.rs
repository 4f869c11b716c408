// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Grid planning: how many thumbnails of a given width fit in the container.

/// Container size in layout pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Container {
    pub width: u32,
    pub height: u32,
}

impl Container {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
}

impl GridLayout {
    pub fn images_per_page(&self) -> usize {
        self.columns * self.rows
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPlanner {
    /// Display width of one image in pixels.
    pub image_width: u32,
    /// Width / height.
    pub image_ratio: f64,
    /// Gutter around each row, counted twice per row. Zero disables it.
    pub gap: u32,
}

impl GridPlanner {
    pub fn image_height(&self) -> f64 {
        f64::from(self.image_width) / self.image_ratio
    }

    /// `None` when not a single image fits: keep the previous layout.
    pub fn plan(&self, container: Container) -> Option<GridLayout> {
        if self.image_width == 0 || !(self.image_ratio > 0.0) {
            return None;
        }
        let columns = (container.width / self.image_width) as usize;
        let row_height = self.image_height() + 2.0 * f64::from(self.gap);
        let rows = (f64::from(container.height) / row_height).floor() as usize;
        let layout = GridLayout { columns, rows };
        (layout.images_per_page() > 0).then_some(layout)
    }
}
