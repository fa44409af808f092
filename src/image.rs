//! Filesystem-backed image cache
//!
//! Reference [`ImageCache`] implementation for hosts without a texture
//! pipeline of their own. [`FsImageCache::load`] registers a pending entry
//! and returns its handle immediately; [`FsImageCache::drain_ready`] probes
//! pending files for their PNG dimensions and reports which handles became
//! ready, which the host turns into
//! [`HostEvent::ImageReady`](crate::host::HostEvent) deliveries on its event
//! loop.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

use crate::host::{ImageCache, LoadSpec};
use crate::types::{Dimensions, ImageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Pending,
    Ready(Dimensions),
    /// Probe failed; the entry stays size-less until the caller requests a
    /// fresh load for the path (the file-changed retry path).
    Failed,
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    state: LoadState,
}

#[derive(Debug)]
pub struct FsImageCache {
    entries: RefCell<HashMap<ImageId, Entry>>,
    next_id: Cell<ImageId>,
}

impl Default for FsImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FsImageCache {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Probe pending entries and return the handles that became ready.
    ///
    /// The host calls this from its event loop whenever it is idle and emits
    /// one `ImageReady` event per returned handle.
    pub fn drain_ready(&self) -> Vec<ImageId> {
        let mut ready = Vec::new();
        let mut entries = self.entries.borrow_mut();
        for (&id, entry) in entries.iter_mut() {
            if entry.state != LoadState::Pending {
                continue;
            }
            match probe_png_size(&entry.path) {
                Ok(size) => {
                    debug!(
                        image = id,
                        path = %entry.path.display(),
                        width = size.width,
                        height = size.height,
                        "image decoded"
                    );
                    entry.state = LoadState::Ready(size);
                    ready.push(id);
                }
                Err(err) => {
                    warn!(
                        image = id,
                        path = %entry.path.display(),
                        error = ?err,
                        "image probe failed, staying size-less"
                    );
                    entry.state = LoadState::Failed;
                }
            }
        }
        ready
    }
}

fn probe_png_size(path: &Path) -> Result<Dimensions> {
    let file = File::open(path)
        .with_context(|| format!("failed to open image file {}", path.display()))?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let reader = decoder
        .read_info()
        .with_context(|| format!("failed to read PNG header of {}", path.display()))?;
    let info = reader.info();
    Ok(Dimensions::new(info.width, info.height))
}

impl ImageCache for FsImageCache {
    fn load(&self, path: &Path, _spec: LoadSpec) -> Result<ImageId> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().insert(
            id,
            Entry {
                path: path.to_path_buf(),
                state: LoadState::Pending,
            },
        );
        Ok(id)
    }

    fn natural_size(&self, image: ImageId) -> Result<Option<Dimensions>> {
        let entries = self.entries.borrow();
        let entry = entries
            .get(&image)
            .ok_or_else(|| anyhow!("unknown image handle {image}"))?;
        Ok(match entry.state {
            LoadState::Ready(size) => Some(size),
            LoadState::Pending | LoadState::Failed => None,
        })
    }

    fn release(&self, image: ImageId) -> Result<()> {
        self.entries.borrow_mut().remove(&image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> LoadSpec {
        LoadSpec {
            max_width: -1,
            max_height: -1,
            scale_factor: 1.0,
            resource_scale: 1.0,
        }
    }

    fn test_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("logo-overlay-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let file = File::create(path).unwrap();
        let mut encoder = png::Encoder::new(file, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let data = vec![0u8; (width * height * 4) as usize];
        writer.write_image_data(&data).unwrap();
    }

    #[test]
    fn load_is_pending_until_drained() {
        let path = test_file("pending.png");
        write_png(&path, 64, 32);

        let cache = FsImageCache::new();
        let id = cache.load(&path, spec()).unwrap();
        assert_eq!(cache.natural_size(id).unwrap(), None);

        assert_eq!(cache.drain_ready(), vec![id]);
        assert_eq!(
            cache.natural_size(id).unwrap(),
            Some(Dimensions::new(64, 32))
        );

        // Nothing left to report once the entry is ready.
        assert!(cache.drain_ready().is_empty());
    }

    #[test]
    fn missing_file_stays_size_less() {
        let cache = FsImageCache::new();
        let id = cache
            .load(Path::new("/nonexistent/logo.png"), spec())
            .unwrap();

        assert!(cache.drain_ready().is_empty());
        assert_eq!(cache.natural_size(id).unwrap(), None);

        // A failed probe is not retried on the next drain.
        assert!(cache.drain_ready().is_empty());
    }

    #[test]
    fn non_png_file_stays_size_less() {
        let path = test_file("not-a-png.png");
        std::fs::write(&path, b"plain text").unwrap();

        let cache = FsImageCache::new();
        let id = cache.load(&path, spec()).unwrap();
        assert!(cache.drain_ready().is_empty());
        assert_eq!(cache.natural_size(id).unwrap(), None);
    }

    #[test]
    fn released_handles_are_forgotten() {
        let path = test_file("released.png");
        write_png(&path, 16, 16);

        let cache = FsImageCache::new();
        let id = cache.load(&path, spec()).unwrap();
        cache.release(id).unwrap();

        assert!(cache.drain_ready().is_empty());
        assert!(cache.natural_size(id).is_err());
    }

    #[test]
    fn reload_after_failure_probes_again() {
        let path = test_file("late-arrival.png");
        let _ = std::fs::remove_file(&path);

        let cache = FsImageCache::new();
        let first = cache.load(&path, spec()).unwrap();
        assert!(cache.drain_ready().is_empty());

        // The file shows up later; the retry is a fresh load, as triggered
        // by a file-changed notification.
        write_png(&path, 128, 64);
        let second = cache.load(&path, spec()).unwrap();
        assert_eq!(cache.drain_ready(), vec![second]);
        assert_eq!(cache.natural_size(first).unwrap(), None);
        assert_eq!(
            cache.natural_size(second).unwrap(),
            Some(Dimensions::new(128, 64))
        );
    }
}
