// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Export sinks for the saved frame list.
//!
//! The terminal is owned by the UI while it runs, so the stdout sink only
//! buffers; `finish` prints the last export once the terminal is restored.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde_json::Value;

pub trait ExportSink {
    fn name(&self) -> &str;

    fn export(&mut self, envelope: &Value) -> Result<()>;

    /// Called once after the terminal has been restored.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportTarget {
    Stdout,
    Clipboard,
    File(PathBuf),
}

impl FromStr for ExportTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "-" || s.eq_ignore_ascii_case("stdout") {
            return Ok(ExportTarget::Stdout);
        }
        if s.eq_ignore_ascii_case("clipboard") {
            return Ok(ExportTarget::Clipboard);
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                anyhow::bail!("export target \"file:\" needs a path");
            }
            return Ok(ExportTarget::File(PathBuf::from(path)));
        }
        anyhow::bail!("unknown export target {s:?} (expected stdout, clipboard or file:<path>)")
    }
}

pub fn open(target: &ExportTarget) -> Box<dyn ExportSink> {
    match target {
        ExportTarget::Stdout => Box::new(DeferredSink::new(std::io::stdout())),
        ExportTarget::Clipboard => Box::new(ClipboardSink::default()),
        ExportTarget::File(path) => Box::new(FileSink { path: path.clone() }),
    }
}

/// Keeps the latest export and writes it on `finish`.
pub struct DeferredSink<W: Write> {
    out: W,
    pending: Option<String>,
}

impl<W: Write> DeferredSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, pending: None }
    }
}

impl<W: Write> ExportSink for DeferredSink<W> {
    fn name(&self) -> &str {
        "stdout"
    }

    fn export(&mut self, envelope: &Value) -> Result<()> {
        self.pending = Some(serde_json::to_string_pretty(envelope)?);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(text) = self.pending.take() {
            writeln!(self.out, "{text}")?;
            self.out.flush()?;
        }
        Ok(())
    }
}

/// Rewrites the file on every save.
pub struct FileSink {
    path: PathBuf,
}

impl ExportSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn export(&mut self, envelope: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = std::fs::File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, envelope)?;
        writer.flush()?;
        Ok(())
    }
}

/// System clipboard. The handle is kept open so the content outlives the save
/// on platforms where the owning process must stay alive.
#[derive(Default)]
pub struct ClipboardSink {
    clipboard: Option<arboard::Clipboard>,
}

impl ExportSink for ClipboardSink {
    fn name(&self) -> &str {
        "clipboard"
    }

    fn export(&mut self, envelope: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(envelope)?;
        if self.clipboard.is_none() {
            self.clipboard = Some(arboard::Clipboard::new().context("opening clipboard")?);
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard.set_text(text).context("writing clipboard")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    pub exports: Vec<Value>,
}

#[cfg(test)]
impl ExportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn export(&mut self, envelope: &Value) -> Result<()> {
        self.exports.push(envelope.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_targets() {
        assert_eq!("stdout".parse::<ExportTarget>().unwrap(), ExportTarget::Stdout);
        assert_eq!("-".parse::<ExportTarget>().unwrap(), ExportTarget::Stdout);
        assert_eq!("Clipboard".parse::<ExportTarget>().unwrap(), ExportTarget::Clipboard);
        assert_eq!(
            "file:/tmp/out.json".parse::<ExportTarget>().unwrap(),
            ExportTarget::File(PathBuf::from("/tmp/out.json"))
        );
        assert!("file:".parse::<ExportTarget>().is_err());
        assert!("s3://bucket".parse::<ExportTarget>().is_err());
    }

    #[test]
    fn test_deferred_sink_writes_latest_on_finish() {
        let mut sink = DeferredSink::new(Vec::new());
        sink.export(&json!({"frames": [1]})).unwrap();
        sink.export(&json!({"frames": [2]})).unwrap();
        assert!(sink.out.is_empty());
        sink.finish().unwrap();
        let written: Value = serde_json::from_slice(&sink.out).unwrap();
        assert_eq!(written, json!({"frames": [2]}));

        sink.out.clear();
        sink.finish().unwrap();
        assert!(sink.out.is_empty());
    }

    #[test]
    fn test_file_sink_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("keep.json");
        let mut sink = FileSink { path: path.clone() };
        sink.export(&json!({"fps": 25, "frames": []})).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let written: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(written["fps"], 25);
    }
}
