// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Frame list loading.
//!
//! Input is either a JSON document whose `frames` array lists `{id, url, marked}`
//! entries, or image files / directories from which a frame list is synthesised.
//! The rest of the JSON document is kept so that an export can re-emit it with
//! only the frame list replaced.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const FRAMES_KEY: &str = "frames";

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid frame list {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0:?} has no \"frames\" array")]
    MissingFrames(PathBuf),
    #[error("not a supported image file: {0:?}")]
    NotAnImage(PathBuf),
    #[error("no image files found in {0:?}")]
    NoImages(PathBuf),
    #[error("path does not exist: {0:?}")]
    NotFound(PathBuf),
}

/// Opaque frame identifier: any JSON value, re-emitted unchanged on export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(Value);

impl From<u64> for ImageId {
    fn from(n: u64) -> Self {
        Self(Value::from(n))
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(Value::from(s))
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self(Value::String(s))
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub url: String,
    /// Initial selection hint only.
    #[serde(default)]
    pub marked: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Image {
    /// Local file behind `url`, if it points at one.
    pub fn local_path(&self) -> Option<PathBuf> {
        let raw = self.url.strip_prefix("file://").unwrap_or(&self.url);
        if raw.contains("://") {
            return None;
        }
        let path = PathBuf::from(raw);
        path.is_file().then_some(path)
    }

    pub fn display_name(&self) -> &str {
        self.url
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty())
            .unwrap_or(&self.url)
    }
}

/// The loaded document: all metadata plus the parsed frame list.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSet {
    envelope: Map<String, Value>,
    pub frames: Vec<Image>,
}

impl FrameSet {
    pub fn new(frames: Vec<Image>) -> Self {
        Self {
            envelope: Map::new(),
            frames,
        }
    }

    pub fn from_json_str(s: &str, path: &Path) -> Result<Self, DataError> {
        let mut envelope: Map<String, Value> =
            serde_json::from_str(s).map_err(|source| DataError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let raw = envelope
            .remove(FRAMES_KEY)
            .filter(Value::is_array)
            .ok_or_else(|| DataError::MissingFrames(path.to_path_buf()))?;
        let frames: Vec<Image> = serde_json::from_value(raw).map_err(|source| DataError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { envelope, frames })
    }

    /// Original document with `frames` replaced by `frames`.
    pub fn envelope_with<'a, I>(&self, frames: I) -> Result<Value, serde_json::Error>
    where
        I: IntoIterator<Item = &'a Image>,
    {
        let mut out = self.envelope.clone();
        let frames = frames
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;
        out.insert(FRAMES_KEY.to_string(), Value::Array(frames));
        Ok(Value::Object(out))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn collect_images_from_path(path: &Path) -> Result<Vec<PathBuf>, DataError> {
    if path.is_file() {
        if is_image_file(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        return Err(DataError::NotAnImage(path.to_path_buf()));
    }

    if path.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut images: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && is_image_file(p))
            .collect();
        images.sort();
        if images.is_empty() {
            return Err(DataError::NoImages(path.to_path_buf()));
        }
        return Ok(images);
    }

    Err(DataError::NotFound(path.to_path_buf()))
}

fn frame_for_path(path: PathBuf) -> Image {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Image {
        id: ImageId::from(name),
        url: path.to_string_lossy().into_owned(),
        marked: false,
        extra: Map::new(),
    }
}

/// Load a frame list from a single JSON document, or from image files/directories.
pub fn load(paths: &[PathBuf]) -> Result<FrameSet, DataError> {
    if let [single] = paths
        && single.is_file()
        && is_json_file(single)
    {
        let content = std::fs::read_to_string(single).map_err(|source| DataError::Io {
            path: single.clone(),
            source,
        })?;
        let set = FrameSet::from_json_str(&content, single)?;
        tracing::info!(path = ?single, frames = set.len(), "loaded frame list");
        return Ok(set);
    }

    let mut out: Vec<PathBuf> = Vec::new();
    for p in paths {
        out.extend(collect_images_from_path(p)?);
    }
    // De-dupe while preserving order (e.g. overlapping directories).
    let mut seen = std::collections::HashSet::<PathBuf>::new();
    out.retain(|p| seen.insert(p.clone()));
    tracing::info!(files = out.len(), "built frame list from image files");
    Ok(FrameSet::new(out.into_iter().map(frame_for_path).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    const DOC: &str = r#"{
        "video": "clip.mp4",
        "fps": 25,
        "frames": [
            {"id": 1, "url": "http://x/1.jpg", "marked": true},
            {"id": "b", "url": "http://x/2.jpg", "score": 0.5},
            {"id": 3, "url": "http://x/3.jpg", "marked": false}
        ]
    }"#;

    #[test]
    fn test_parse_frames_and_defaults() {
        let set = FrameSet::from_json_str(DOC, Path::new("doc.json")).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.frames[0].id, ImageId::from(1u64));
        assert!(set.frames[0].marked);
        assert_eq!(set.frames[1].id, ImageId::from("b"));
        assert!(!set.frames[1].marked);
        assert_eq!(set.frames[1].extra.get("score"), Some(&serde_json::json!(0.5)));
    }

    #[test]
    fn test_missing_frames_is_error() {
        let result = FrameSet::from_json_str(r#"{"frames": 3}"#, Path::new("x.json"));
        assert!(matches!(result, Err(DataError::MissingFrames(_))));
        let result = FrameSet::from_json_str(r#"{"other": []}"#, Path::new("x.json"));
        assert!(matches!(result, Err(DataError::MissingFrames(_))));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let result = FrameSet::from_json_str("not json", Path::new("x.json"));
        assert!(matches!(result, Err(DataError::Json { .. })));
    }

    #[test]
    fn test_envelope_keeps_metadata_and_replaces_frames() {
        let set = FrameSet::from_json_str(DOC, Path::new("doc.json")).unwrap();
        let out = set.envelope_with([&set.frames[1]]).unwrap();
        assert_eq!(out["video"], "clip.mp4");
        assert_eq!(out["fps"], 25);
        let frames = out["frames"].as_array().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["id"], "b");
        assert_eq!(frames[0]["score"], 0.5);
    }

    #[test]
    fn test_opaque_ids_round_trip() {
        let doc = r#"{"frames": [
            {"id": -4, "url": "a.jpg"},
            {"id": 2.5, "url": "b.jpg"},
            {"id": {"shot": 1}, "url": "c.jpg"}
        ]}"#;
        let set = FrameSet::from_json_str(doc, Path::new("doc.json")).unwrap();
        assert_eq!(set.frames[0].id.to_string(), "-4");
        assert_eq!(set.frames[1].id.to_string(), "2.5");
        let out = set.envelope_with(&set.frames).unwrap();
        assert_eq!(out["frames"][0]["id"], -4);
        assert_eq!(out["frames"][1]["id"], 2.5);
        assert_eq!(out["frames"][2]["id"]["shot"], 1);
    }

    #[test]
    fn test_display_name_uses_last_segment() {
        let set = FrameSet::from_json_str(DOC, Path::new("doc.json")).unwrap();
        assert_eq!(set.frames[0].display_name(), "1.jpg");
    }

    #[test]
    fn test_remote_url_has_no_local_path() {
        let set = FrameSet::from_json_str(DOC, Path::new("doc.json")).unwrap();
        assert!(set.frames[0].local_path().is_none());
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("test.png")));
        assert!(is_image_file(Path::new("test.JPEG")));
        assert!(is_image_file(Path::new("test.webp")));
        assert!(!is_image_file(Path::new("test.txt")));
        assert!(!is_image_file(Path::new("noextension")));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("b.jpg")).unwrap();
        File::create(dir.path().join("a.png")).unwrap();
        File::create(dir.path().join("c.txt")).unwrap();

        let set = load(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.frames[0].id, ImageId::from("a.png"));
        assert!(set.frames[0].local_path().is_some());
        assert!(set.frames.iter().all(|f| !f.marked));
    }

    #[test]
    fn test_load_dedupes_paths() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.png")).unwrap();
        let file = dir.path().join("a.png");

        let set = load(&[file, dir.path().to_path_buf()]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_load_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.json");
        fs::write(&path, DOC).unwrap();

        let set = load(&[path]).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("note.txt");
        File::create(&txt).unwrap();
        assert!(matches!(load(&[txt]), Err(DataError::NotAnImage(_))));

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&[empty.path().to_path_buf()]),
            Err(DataError::NoImages(_))
        ));

        let missing = dir.path().join("missing");
        assert!(matches!(load(&[missing]), Err(DataError::NotFound(_))));
    }
}
