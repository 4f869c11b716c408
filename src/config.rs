// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Configuration management.
//!
//! Config values are loaded with the following priority (highest to lowest):
//! 1. Command line flags (applied by `main`)
//! 2. Environment variables (FRAMEPICK_*)
//! 3. Config file (~/.config/framepick/config.toml)
//! 4. Default values

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Thumbnail display width in pixels.
    pub image_width: u32,
    pub min_image_width: u32,
    pub max_image_width: u32,
    /// Pixels added or removed per `+`/`-`.
    pub width_step: u32,
    pub grid_gap: u32,
    /// Width / height of a frame.
    pub image_ratio: f64,
    pub thumbnails: bool,
    pub thumbnail_threads: usize,
    pub thumbnail_cache_size: usize,
    /// `stdout`, `clipboard` or `file:<path>`.
    pub export: String,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_width: 300,
            min_image_width: 50,
            max_image_width: 400,
            width_step: 10,
            grid_gap: 5,
            image_ratio: 300.0 / 168.75,
            thumbnails: true,
            thumbnail_threads: 2,
            thumbnail_cache_size: 200,
            export: "stdout".to_string(),
            log_file: None,
            debug: false,
        }
    }
}

impl Config {
    /// Load config with priority: env vars > config file > defaults.
    ///
    /// An unreadable or invalid config file falls back to defaults; the error is
    /// returned alongside so it can be reported once logging is up.
    pub fn load() -> (Self, Option<anyhow::Error>) {
        let (mut config, err) = match Self::config_path() {
            Some(path) => match Self::load_from_path(&path) {
                Ok(config) => (config.unwrap_or_default(), None),
                Err(err) => (Self::default(), Some(err)),
            },
            None => (Self::default(), None),
        };
        config.apply_env_overrides();
        config.clamp_values();
        (config, err)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("framepick").join("config.toml"))
    }

    /// `Ok(None)` when the file does not exist.
    fn load_from_path(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(Some(config))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = Self::parse_env::<u32>("FRAMEPICK_IMAGE_WIDTH") {
            self.image_width = v;
        }
        if let Some(v) = Self::parse_env::<u32>("FRAMEPICK_MIN_IMAGE_WIDTH") {
            self.min_image_width = v;
        }
        if let Some(v) = Self::parse_env::<u32>("FRAMEPICK_MAX_IMAGE_WIDTH") {
            self.max_image_width = v;
        }
        if let Some(v) = Self::parse_env::<u32>("FRAMEPICK_WIDTH_STEP") {
            self.width_step = v;
        }
        if let Some(v) = Self::parse_env::<u32>("FRAMEPICK_GRID_GAP") {
            self.grid_gap = v;
        }
        if let Some(v) = Self::parse_env::<f64>("FRAMEPICK_IMAGE_RATIO") {
            self.image_ratio = v;
        }
        if std::env::var_os("FRAMEPICK_NO_THUMBNAILS").is_some() {
            self.thumbnails = false;
        }
        if let Some(v) = Self::parse_env::<usize>("FRAMEPICK_THUMBNAIL_THREADS") {
            self.thumbnail_threads = v;
        }
        if let Some(v) = Self::parse_env::<usize>("FRAMEPICK_THUMBNAIL_CACHE_SIZE") {
            self.thumbnail_cache_size = v;
        }
        if let Ok(v) = std::env::var("FRAMEPICK_EXPORT") {
            self.export = v;
        }
        if let Some(v) = std::env::var_os("FRAMEPICK_LOG_FILE") {
            self.log_file = Some(PathBuf::from(v));
        }
        if std::env::var_os("FRAMEPICK_DEBUG").is_some() {
            self.debug = true;
        }
    }

    pub fn clamp_values(&mut self) {
        const MAX_WIDTH: u32 = 4_000;
        const MAX_CACHE_SIZE: usize = 1_000;

        self.max_image_width = self.max_image_width.clamp(1, MAX_WIDTH);
        self.min_image_width = self.min_image_width.clamp(1, self.max_image_width);
        self.image_width = self
            .image_width
            .clamp(self.min_image_width, self.max_image_width);
        self.width_step = self.width_step.clamp(1, self.max_image_width);
        if !self.image_ratio.is_finite() {
            self.image_ratio = Self::default().image_ratio;
        }
        self.image_ratio = self.image_ratio.clamp(0.1, 10.0);
        self.thumbnail_threads = self.thumbnail_threads.clamp(1, 8);
        self.thumbnail_cache_size = self.thumbnail_cache_size.clamp(1, MAX_CACHE_SIZE);
    }

    fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok()?.parse().ok()
    }

    /// Log file path: configured, else `<cache dir>/framepick/framepick.log`.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| {
            dirs::cache_dir().map(|p| p.join("framepick").join("framepick.log"))
        })
    }
}
