use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tiny_skia::Pixmap;

use crate::error::SinkError;
use crate::logging::HOST_NAMESPACE;
use log::trace;

/// Host-side identifier of one widget surface.
pub type WidgetId = u32;

/// Where rendered frames go. Nothing the sink returns feeds back into the
/// clock; errors only decide whether the frame was skipped.
pub trait DisplaySink: Send {
    fn present(&mut self, widget_id: WidgetId, frame: &Pixmap) -> Result<(), SinkError>;
}

/// Writes `widget-<id>.png` into a directory, replacing the previous frame.
#[derive(Debug, Clone)]
pub struct PngDirectorySink {
    dir: PathBuf,
}

impl PngDirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn frame_path(&self, widget_id: WidgetId) -> PathBuf {
        self.dir.join(format!("widget-{}.png", widget_id))
    }
}

impl DisplaySink for PngDirectorySink {
    fn present(&mut self, widget_id: WidgetId, frame: &Pixmap) -> Result<(), SinkError> {
        if !self.dir.is_dir() {
            return Err(SinkError::NoSurface(widget_id));
        }
        let png = frame.encode_png().map_err(|e| SinkError::Encode(e.to_string()))?;

        // Write then rename so readers never see half a frame
        let path = self.frame_path(widget_id);
        let partial = path.with_extension("png.part");
        fs::write(&partial, png)?;
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        trace!(target: HOST_NAMESPACE, "Wrote {}", path.display());
        Ok(())
    }
}

/// Keeps the latest frame per surface in memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemorySurfaces>>,
}

#[derive(Debug, Default)]
struct MemorySurfaces {
    attached: BTreeSet<WidgetId>,
    frames: BTreeMap<WidgetId, Pixmap>,
    presented: usize,
}

impl MemorySink {
    pub fn with_surfaces(ids: &[WidgetId]) -> Self {
        let sink = Self::default();
        for &id in ids {
            sink.attach(id);
        }
        sink
    }

    fn surfaces(&self) -> std::sync::MutexGuard<'_, MemorySurfaces> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn attach(&self, widget_id: WidgetId) {
        self.surfaces().attached.insert(widget_id);
    }

    pub fn detach(&self, widget_id: WidgetId) {
        let mut surfaces = self.surfaces();
        surfaces.attached.remove(&widget_id);
        surfaces.frames.remove(&widget_id);
    }

    pub fn frame(&self, widget_id: WidgetId) -> Option<Pixmap> {
        self.surfaces().frames.get(&widget_id).cloned()
    }

    /// Total frames accepted across all surfaces.
    pub fn presented(&self) -> usize {
        self.surfaces().presented
    }
}

impl DisplaySink for MemorySink {
    fn present(&mut self, widget_id: WidgetId, frame: &Pixmap) -> Result<(), SinkError> {
        let mut surfaces = self.surfaces();
        if !surfaces.attached.contains(&widget_id) {
            return Err(SinkError::NoSurface(widget_id));
        }
        surfaces.frames.insert(widget_id, frame.clone());
        surfaces.presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Pixmap {
        Pixmap::new(4, 4).unwrap()
    }

    #[test]
    fn memory_sink_requires_attached_surface() {
        let mut sink = MemorySink::with_surfaces(&[7]);
        assert!(sink.present(7, &frame()).is_ok());
        assert!(matches!(sink.present(8, &frame()), Err(SinkError::NoSurface(8))));
        assert_eq!(sink.presented(), 1);

        sink.detach(7);
        assert!(sink.frame(7).is_none());
        assert!(sink.present(7, &frame()).is_err());
    }

    #[test]
    fn png_sink_without_directory_has_no_surface() {
        let mut sink = PngDirectorySink::new("/nonexistent/bitclock16-frames");
        assert!(matches!(sink.present(1, &frame()), Err(SinkError::NoSurface(1))));
    }

    #[test]
    fn png_sink_writes_frame() {
        let dir = std::env::temp_dir().join(format!("bitclock16-sink-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut sink = PngDirectorySink::new(&dir);
        sink.present(3, &frame()).unwrap();

        let written = fs::read(sink.frame_path(3)).unwrap();
        assert_eq!(&written[1..4], b"PNG");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn png_sink_cleans_up_after_failed_rename() {
        let dir = std::env::temp_dir().join(format!("bitclock16-rename-{}", std::process::id()));
        let mut sink = PngDirectorySink::new(&dir);
        // a non-empty directory where the frame should go blocks the rename
        let blocker = sink.frame_path(5);
        fs::create_dir_all(blocker.join("occupied")).unwrap();

        assert!(matches!(sink.present(5, &frame()), Err(SinkError::Io(_))));
        assert!(!blocker.with_extension("png.part").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
