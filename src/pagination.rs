// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Page state over a fixed-length frame list.
//!
//! The current page lives in a `Navigator` (route history); this module decides
//! where to navigate when the number of images per page changes:
//! - first valid layout: adopt it, no correction
//! - overflow guard: page would start past the end of the list
//! - stabilisation: keep the first visible frame on the page that shows it
//!
//! Guard and stabilisation both read the page from before the relayout. When
//! both fire the stabilised target is applied last and wins, even if it is out
//! of range again.

use std::collections::VecDeque;
use std::ops::Range;

/// External owner of the current page number (1-based).
pub trait Navigator {
    fn current_page(&self) -> u32;
    fn navigate_to(&mut self, page: u32);
}

/// Page number from a route such as `/3`. Missing, non-numeric or zero gives 1.
pub fn parse_route(route: &str) -> u32 {
    let segment = route.trim().trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => 1,
        Ok(page) => page,
    }
}

pub fn route_for(page: u32) -> String {
    format!("/{page}")
}

/// Routes kept for going back; the oldest are dropped first.
pub const HISTORY_LIMIT: usize = 256;

/// In-memory route history.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<String>,
}

impl History {
    pub fn new(initial_route: &str) -> Self {
        Self {
            entries: VecDeque::from([initial_route.to_string()]),
        }
    }

    pub fn route(&self) -> &str {
        self.entries.back().map(String::as_str).unwrap_or("/")
    }

    /// Pop to the previous route. Returns false at the oldest kept entry.
    pub fn back(&mut self) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        self.entries.pop_back();
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn current_page(&self) -> u32 {
        parse_route(self.route())
    }

    fn navigate_to(&mut self, page: u32) {
        let route = route_for(page);
        if self.route() != route {
            tracing::debug!(%route, "navigate");
            self.entries.push_back(route);
            if self.entries.len() > HISTORY_LIMIT {
                self.entries.pop_front();
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct PaginationController<N = History> {
    nav: N,
    total: usize,
    /// Zero until the first valid layout.
    images_per_page: usize,
}

impl<N: Navigator> PaginationController<N> {
    pub fn new(nav: N, total: usize) -> Self {
        Self {
            nav,
            total,
            images_per_page: 0,
        }
    }

    pub fn navigator(&self) -> &N {
        &self.nav
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.nav
    }

    pub fn images_per_page(&self) -> usize {
        self.images_per_page
    }

    pub fn current_page(&self) -> u32 {
        self.nav.current_page().max(1)
    }

    pub fn current_page_index(&self) -> usize {
        (self.current_page() - 1) as usize
    }

    /// `ceil(total / images_per_page)`, zero while the layout is unset.
    pub fn page_count(&self) -> usize {
        if self.images_per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.images_per_page)
    }

    pub fn has_next_page(&self) -> bool {
        (self.current_page() as usize) < self.page_count()
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page() > 1
    }

    /// Global index range shown on the current page. Empty past the end.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self
            .current_page_index()
            .saturating_mul(self.images_per_page)
            .min(self.total);
        let end = start.saturating_add(self.images_per_page).min(self.total);
        start..end
    }

    /// Global index of a page-relative position, if a frame is shown there.
    pub fn global_index(&self, page_relative: usize) -> Option<usize> {
        if page_relative >= self.images_per_page {
            return None;
        }
        let global = self.current_page_index() * self.images_per_page + page_relative;
        (global < self.total).then_some(global)
    }

    /// Apply a new images-per-page value. Returns the page navigated to last, if any.
    pub fn relayout(&mut self, new_images_per_page: usize) -> Option<u32> {
        if new_images_per_page == 0 {
            return None;
        }
        let page = self.current_page();
        let old = self.images_per_page;
        self.images_per_page = new_images_per_page;

        let mut applied = None;
        if self.total < new_images_per_page.saturating_mul(page as usize) {
            let target = (self.total / new_images_per_page) as u32 + 1;
            tracing::debug!(page, target, "page starts past the end of the list");
            self.nav.navigate_to(target);
            applied = Some(target);
        }
        if old != 0 {
            let first = old * (page as usize - 1);
            let target = (first / new_images_per_page) as u32 + 1;
            self.nav.navigate_to(target);
            applied = Some(target);
        }
        applied
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        let page = self.current_page() + 1;
        self.nav.navigate_to(page);
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev_page() {
            return false;
        }
        let page = self.current_page() - 1;
        self.nav.navigate_to(page);
        true
    }

    /// Jump to a 1-based page, clamped to the known page count.
    pub fn go_to(&mut self, page: u32) {
        let last = self.page_count().max(1) as u32;
        self.nav.navigate_to(page.clamp(1, last));
    }
}
