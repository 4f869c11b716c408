// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Thumbnail loading for the visible page.
//!
//! Decoding runs on a dedicated coordinator thread that fans a page's files out
//! over a rayon pool. Each page request bumps an epoch; work from an older
//! epoch is dropped before decode and before send, so flipping pages quickly
//! never floods the UI with stale thumbnails.
//!
//! Results only feed the view. Selection and pagination never wait on them.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use image::DynamicImage;
use rayon::prelude::*;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

struct Epoch(AtomicU64);

impl Epoch {
    fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

struct Batch {
    paths: Vec<PathBuf>,
    max_side: u32,
    epoch: u64,
}

enum Command {
    Batch(Batch),
    Shutdown,
}

pub struct Decoded {
    pub path: PathBuf,
    /// `None` when the file could not be opened or decoded.
    pub image: Option<DynamicImage>,
}

pub fn decode_thumbnail(path: &Path, max_side: u32) -> Option<DynamicImage> {
    let img = match image::ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => reader.decode(),
        Err(err) => {
            tracing::warn!(?path, "cannot open image: {err}");
            return None;
        }
    };
    match img {
        Ok(img) => Some(img.thumbnail(max_side.max(1), max_side.max(1))),
        Err(err) => {
            tracing::warn!(?path, "cannot decode image: {err}");
            None
        }
    }
}

pub struct ThumbnailWorker {
    command_tx: Sender<Command>,
    result_rx: Receiver<(u64, Decoded)>,
    epoch: Arc<Epoch>,
    _handle: JoinHandle<()>,
}

impl ThumbnailWorker {
    pub fn new(thread_count: usize) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (result_tx, result_rx) = mpsc::channel::<(u64, Decoded)>();
        let epoch = Arc::new(Epoch(AtomicU64::new(0)));
        let epoch_clone = Arc::clone(&epoch);

        let handle = thread::spawn(move || {
            Self::coordinator_loop(command_rx, result_tx, epoch_clone, thread_count);
        });

        Self {
            command_tx,
            result_rx,
            epoch,
            _handle: handle,
        }
    }

    /// Replace any pending work with `paths`.
    pub fn request(&self, paths: Vec<PathBuf>, max_side: u32) {
        let epoch = self.epoch.increment();
        if paths.is_empty() {
            return;
        }
        let _ = self.command_tx.send(Command::Batch(Batch {
            paths,
            max_side,
            epoch,
        }));
    }

    /// Next finished thumbnail from the current epoch.
    pub fn try_recv(&self) -> Option<Decoded> {
        let current = self.epoch.current();
        while let Ok((epoch, decoded)) = self.result_rx.try_recv() {
            if epoch >= current {
                return Some(decoded);
            }
        }
        None
    }

    fn coordinator_loop(
        command_rx: Receiver<Command>,
        result_tx: Sender<(u64, Decoded)>,
        epoch: Arc<Epoch>,
        thread_count: usize,
    ) {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                tracing::error!("thumbnail pool unavailable: {err}");
                return;
            }
        };

        while let Ok(cmd) = command_rx.recv() {
            match cmd {
                Command::Batch(batch) => {
                    if batch.epoch < epoch.current() {
                        continue;
                    }
                    let started = std::time::Instant::now();
                    pool.install(|| {
                        batch.paths.par_iter().for_each(|path| {
                            if epoch.current() > batch.epoch {
                                return;
                            }
                            let image = decode_thumbnail(path, batch.max_side);
                            if epoch.current() <= batch.epoch {
                                let _ = result_tx.send((
                                    batch.epoch,
                                    Decoded {
                                        path: path.clone(),
                                        image,
                                    },
                                ));
                            }
                        });
                    });
                    tracing::debug!(
                        count = batch.paths.len(),
                        elapsed = ?started.elapsed(),
                        "thumbnail batch done"
                    );
                }
                Command::Shutdown => break,
            }
        }
    }
}

impl Drop for ThumbnailWorker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(Command::Shutdown);
    }
}

/// LRU keyed by file path.
struct LruCache<V> {
    entries: HashMap<PathBuf, V>,
    order: VecDeque<PathBuf>,
    capacity: usize,
}

impl<V> LruCache<V> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    fn touch(&mut self, key: &Path) {
        if !matches!(self.order.back(), Some(k) if k == key) {
            self.order.retain(|k| k != key);
            self.order.push_back(key.to_path_buf());
        }
    }

    fn contains(&self, key: &Path) -> bool {
        self.entries.contains_key(key)
    }

    fn get_mut(&mut self, key: &Path) -> Option<&mut V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get_mut(key)
    }

    fn insert(&mut self, key: PathBuf, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.touch(&key);
        self.entries.insert(key, value);
    }

    /// Never shrinks.
    fn ensure_capacity(&mut self, capacity: usize) {
        self.capacity = self.capacity.max(capacity);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// View-side thumbnail state: terminal graphics picker, worker and cache.
pub struct Thumbnails {
    picker: Picker,
    worker: Option<ThumbnailWorker>,
    cache: LruCache<StatefulProtocol>,
    loading: HashSet<PathBuf>,
    failed: HashSet<PathBuf>,
    max_side: u32,
}

impl Thumbnails {
    /// `threads == 0` disables loading; tiles then show text only.
    pub fn new(picker: Picker, threads: usize, cache_size: usize) -> Self {
        Self {
            picker,
            worker: (threads > 0).then(|| ThumbnailWorker::new(threads)),
            cache: LruCache::new(cache_size),
            loading: HashSet::new(),
            failed: HashSet::new(),
            max_side: 0,
        }
    }

    /// Terminal cell size in pixels (width, height).
    pub fn cell_size(&self) -> (u16, u16) {
        let (w, h) = self.picker.font_size();
        (w.max(1), h.max(1))
    }

    /// Queue the visible page's missing thumbnails.
    ///
    /// Cheap to call every frame: a new batch is only sent when the size changed
    /// or some path is neither cached, in flight, nor known to be undecodable.
    /// The cache grows to hold at least one full page.
    pub fn request_page(&mut self, paths: &[PathBuf], max_side: u32) {
        let Some(worker) = self.worker.as_ref() else {
            return;
        };
        let resized = max_side != self.max_side;
        if resized {
            self.cache.clear();
            self.loading.clear();
            self.max_side = max_side;
        }
        self.cache.ensure_capacity(paths.len());
        let pending: Vec<PathBuf> = paths
            .iter()
            .filter(|p| !self.cache.contains(p) && !self.failed.contains(*p))
            .cloned()
            .collect();
        if !resized && pending.iter().all(|p| self.loading.contains(p)) {
            return;
        }
        self.loading = pending.iter().cloned().collect();
        worker.request(pending, max_side);
    }

    /// Move finished decodes into the cache. Returns true if anything arrived.
    pub fn poll(&mut self) -> bool {
        let Some(worker) = self.worker.as_ref() else {
            return false;
        };
        let mut arrived = false;
        while let Some(decoded) = worker.try_recv() {
            self.loading.remove(&decoded.path);
            match decoded.image {
                Some(image) => {
                    let protocol = self.picker.new_resize_protocol(image);
                    self.cache.insert(decoded.path, protocol);
                }
                None => {
                    self.failed.insert(decoded.path);
                }
            }
            arrived = true;
        }
        arrived
    }

    #[cfg(test)]
    pub fn insert_decoded(&mut self, path: PathBuf, image: DynamicImage) {
        let protocol = self.picker.new_resize_protocol(image);
        self.cache.insert(path, protocol);
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut StatefulProtocol> {
        self.cache.get_mut(path)
    }

    pub fn is_loading(&self, path: &Path) -> bool {
        self.loading.contains(path)
    }
}
