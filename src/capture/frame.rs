//! Where camera frames come from.
//!
//! An external camera tool keeps producing snapshots; the scanner either re-reads a
//! single snapshot file or drains an inbox directory.

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Context, Result};
use log::debug;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "bmp", "gif"];
const SCANNED_DIR: &str = "scanned";
const FAILED_DIR: &str = "failed";

/// How the cycle that grabbed a frame ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFate {
    /// A card was recognized and stored.
    Recognized,
    /// No card, or the cycle failed.
    Rejected,
}

/// Source of the current camera frame. `Ok(None)` means no frame is available yet.
pub trait FrameSource: Send + Sync + 'static {
    fn grab(&self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Called once after each successful grab, when the cycle is over.
    fn settle(&self, _fate: FrameFate) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

/// Reads the same file on every grab, as written in place by a camera tool.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for SnapshotFile {
    async fn grab(&self) -> Result<Option<Vec<u8>>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_if_present(&path))
            .await
            .context("snapshot reader join failed")?
    }
}

/// Takes the first image by file name. Once its cycle settles the image moves to
/// `scanned/` when a card came out of it and to `failed/` otherwise.
///
/// A frame that was grabbed but never settled stays in the inbox and is grabbed again.
#[derive(Debug, Clone)]
pub struct InboxDirectory {
    dir: PathBuf,
    pending: Arc<Mutex<Option<PathBuf>>>,
}

impl InboxDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FrameSource for InboxDirectory {
    async fn grab(&self) -> Result<Option<Vec<u8>>> {
        let dir = self.dir.clone();
        let next = tokio::task::spawn_blocking(move || read_next_image(&dir))
            .await
            .context("inbox reader join failed")??;

        Ok(next.map(|(path, bytes)| {
            *self.pending() = Some(path);
            bytes
        }))
    }

    async fn settle(&self, fate: FrameFate) -> Result<()> {
        let pending = self.pending().take();
        let Some(path) = pending else {
            return Ok(());
        };
        let target = self.dir.join(match fate {
            FrameFate::Recognized => SCANNED_DIR,
            FrameFate::Rejected => FAILED_DIR,
        });

        tokio::task::spawn_blocking(move || archive(&path, &target))
            .await
            .context("inbox archiver join failed")?
    }
}

fn read_if_present(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(None),
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read snapshot {}", path.display()))
        }
    }
}

fn read_next_image(dir: &Path) -> Result<Option<(PathBuf, Vec<u8>)>> {
    let Some(next) = next_image_in(dir)? else {
        return Ok(None);
    };

    let bytes = std::fs::read(&next)
        .with_context(|| format!("failed to read frame {}", next.display()))?;
    debug!("Took frame {} ({} bytes)", next.display(), bytes.len());

    Ok(Some((next, bytes)))
}

fn archive(frame: &Path, target: &Path) -> Result<()> {
    let Some(name) = frame.file_name() else {
        return Ok(());
    };
    std::fs::create_dir_all(target)
        .with_context(|| format!("failed to create {}", target.display()))?;
    std::fs::rename(frame, target.join(name))
        .with_context(|| format!("failed to archive frame {}", frame.display()))?;
    debug!("Archived frame {} to {}", frame.display(), target.display());
    Ok(())
}

fn next_image_in(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list inbox {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images.into_iter().next())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_file_missing_means_no_frame() {
        let dir = tempfile::tempdir().unwrap();
        let source = SnapshotFile::new(dir.path().join("frame.jpg"));
        assert!(source.grab().await.unwrap().is_none());

        std::fs::write(dir.path().join("frame.jpg"), b"abc").unwrap();
        assert_eq!(source.grab().await.unwrap(), Some(b"abc".to_vec()));
        // The file stays in place for the next grab.
        assert_eq!(source.grab().await.unwrap(), Some(b"abc".to_vec()));
    }

    #[tokio::test]
    async fn inbox_drains_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("002.jpg"), b"second").unwrap();
        std::fs::write(dir.path().join("001.JPG"), b"first").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let inbox = InboxDirectory::new(dir.path());
        assert_eq!(inbox.grab().await.unwrap(), Some(b"first".to_vec()));
        inbox.settle(FrameFate::Recognized).await.unwrap();
        assert_eq!(inbox.grab().await.unwrap(), Some(b"second".to_vec()));
        inbox.settle(FrameFate::Rejected).await.unwrap();
        assert!(inbox.grab().await.unwrap().is_none());

        assert!(dir.path().join(SCANNED_DIR).join("001.JPG").exists());
        assert!(dir.path().join(FAILED_DIR).join("002.jpg").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn unsettled_frame_is_grabbed_again() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001.jpg"), b"first").unwrap();

        let inbox = InboxDirectory::new(dir.path());
        assert_eq!(inbox.grab().await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(inbox.grab().await.unwrap(), Some(b"first".to_vec()));

        inbox.settle(FrameFate::Rejected).await.unwrap();
        // Nothing pending any more.
        inbox.settle(FrameFate::Recognized).await.unwrap();
        assert!(inbox.grab().await.unwrap().is_none());
        assert!(dir.path().join(FAILED_DIR).join("001.jpg").exists());
        assert!(!dir.path().join(SCANNED_DIR).exists());
    }
}
