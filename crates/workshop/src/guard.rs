//! Exclusive locks on the files being uploaded.
//!
//! While an upload is in flight the preview image and one payload file of the
//! content folder are opened read-only with an exclusive advisory lock, so a
//! build or the game itself cannot rewrite them underneath the SDK.

use std::fs::{File, OpenOptions, TryLockError};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::WorkshopError;

#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;

/// Acquires [`LockToken`]s for a submission.
#[derive(Debug, Clone)]
pub struct ResourceGuard {
    payload_extensions: Vec<String>,
}

impl Default for ResourceGuard {
    fn default() -> Self {
        Self::new(moduploader_protocol::constants::DEFAULT_PAYLOAD_EXTENSIONS.iter().copied())
    }
}

impl ResourceGuard {
    pub fn new<S: Into<String>>(payload_extensions: impl IntoIterator<Item = S>) -> Self {
        Self {
            payload_extensions: payload_extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn payload_extensions(&self) -> &[String] {
        &self.payload_extensions
    }

    /// Returns the first file (by name) in `dir` with a payload extension.
    pub fn find_payload(&self, dir: &Path) -> Result<PathBuf, WorkshopError> {
        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if self.is_payload(&path) {
                candidates.push(path);
            }
        }
        candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| WorkshopError::NoPayloadFound {
                dir: dir.to_path_buf(),
                extensions: self.payload_extensions.clone(),
            })
    }

    fn is_payload(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.payload_extensions
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(ext))
            })
    }

    /// Locks the preview image (if any) and the payload of `content_dir`
    /// (if any).
    ///
    /// Nothing stays locked when this fails.
    pub fn acquire(
        &self,
        preview: Option<&Path>,
        content_dir: Option<&Path>,
    ) -> Result<LockToken, WorkshopError> {
        let mut token = LockToken { held: Vec::new() };

        if let Some(preview) = preview {
            token.held.push(lock_file(preview)?);
        }
        if let Some(dir) = content_dir {
            let payload = self.find_payload(dir)?;
            token.held.push(lock_file(&payload)?);
        }

        debug!(files = token.held.len(), "upload files locked");
        Ok(token)
    }
}

struct HeldFile {
    path: PathBuf,
    file: File,
}

fn lock_file(path: &Path) -> Result<HeldFile, WorkshopError> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(FILE_SHARE_READ);
    }

    let lock_error = |source: io::Error| WorkshopError::Lock {
        path: path.to_path_buf(),
        source,
    };

    let file = options.open(path).map_err(lock_error)?;
    match file.try_lock() {
        Ok(()) => {}
        Err(TryLockError::WouldBlock) => {
            return Err(lock_error(io::Error::new(
                io::ErrorKind::WouldBlock,
                "file is in use by another process",
            )));
        }
        Err(TryLockError::Error(e)) => return Err(lock_error(e)),
    }

    Ok(HeldFile {
        path: path.to_path_buf(),
        file,
    })
}

/// Files held locked for the duration of an upload.
///
/// Released explicitly with [`release`](Self::release) or on drop.
pub struct LockToken {
    held: Vec<HeldFile>,
}

impl LockToken {
    /// Paths currently held.
    pub fn paths(&self) -> Vec<&Path> {
        self.held.iter().map(|h| h.path.as_path()).collect()
    }

    /// Unlocks and closes every held file. Calling it again is a no-op.
    pub fn release(&mut self) {
        for held in self.held.drain(..) {
            if let Err(e) = held.file.unlock() {
                warn!(path = %held.path.display(), error = %e, "failed to unlock file");
            }
        }
    }
}

impl Drop for LockToken {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockToken")
            .field("paths", &self.paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mod_folder(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"payload").unwrap();
        }
        dir
    }

    fn try_exclusive(path: &Path) -> bool {
        let file = File::open(path).unwrap();
        let locked = file.try_lock().is_ok();
        if locked {
            file.unlock().unwrap();
        }
        locked
    }

    #[test]
    fn first_payload_by_name() {
        let dir = mod_folder(&["Zeta.dll", "readme.txt", "Alpha.DLL", "Beta.dll"]);
        let guard = ResourceGuard::default();
        let payload = guard.find_payload(dir.path()).unwrap();
        assert_eq!(payload.file_name().unwrap(), "Alpha.DLL");
    }

    #[test]
    fn subdirectories_are_ignored() {
        let dir = mod_folder(&["notes.txt"]);
        std::fs::create_dir(dir.path().join("nested.dll")).unwrap();
        let err = ResourceGuard::default().find_payload(dir.path()).unwrap_err();
        assert!(matches!(err, WorkshopError::NoPayloadFound { ref extensions, .. } if extensions == &["dll"]));
    }

    #[test]
    fn custom_extensions_are_normalized() {
        let guard = ResourceGuard::new([".CRP", "dll", ""]);
        assert_eq!(guard.payload_extensions(), &["crp".to_string(), "dll".to_string()]);
        let dir = mod_folder(&["Asset.crp"]);
        assert!(guard.find_payload(dir.path()).is_ok());
    }

    #[test]
    fn acquire_blocks_second_lock_until_release() {
        let dir = mod_folder(&["Foo.dll"]);
        let preview = dir.path().join("preview.png");
        std::fs::write(&preview, b"png").unwrap();
        let payload = dir.path().join("Foo.dll");

        let guard = ResourceGuard::default();
        let mut token = guard.acquire(Some(&preview), Some(dir.path())).unwrap();
        assert_eq!(token.paths().len(), 2);
        assert!(!try_exclusive(&payload));
        assert!(!try_exclusive(&preview));

        token.release();
        assert!(token.paths().is_empty());
        assert!(try_exclusive(&payload));
        assert!(try_exclusive(&preview));

        token.release();
    }

    #[test]
    fn drop_releases_locks() {
        let dir = mod_folder(&["Foo.dll"]);
        let payload = dir.path().join("Foo.dll");
        {
            let _token = ResourceGuard::default().acquire(None, Some(dir.path())).unwrap();
            assert!(!try_exclusive(&payload));
        }
        assert!(try_exclusive(&payload));
    }

    #[test]
    fn contended_file_is_a_lock_error() {
        let dir = mod_folder(&["Foo.dll"]);
        let guard = ResourceGuard::default();
        let _first = guard.acquire(None, Some(dir.path())).unwrap();
        let err = guard.acquire(None, Some(dir.path())).unwrap_err();
        assert!(matches!(err, WorkshopError::Lock { ref path, .. } if path.ends_with("Foo.dll")));
    }

    #[test]
    fn missing_preview_is_a_lock_error_and_holds_nothing() {
        let dir = mod_folder(&["Foo.dll"]);
        let missing = dir.path().join("missing.png");
        let guard = ResourceGuard::default();
        assert!(matches!(
            guard.acquire(Some(&missing), Some(dir.path())),
            Err(WorkshopError::Lock { .. })
        ));
        assert!(try_exclusive(&dir.path().join("Foo.dll")));
    }

    #[test]
    fn preview_only_locks_just_the_preview() {
        let dir = mod_folder(&["preview.png"]);
        let token = ResourceGuard::default()
            .acquire(Some(&dir.path().join("preview.png")), None)
            .unwrap();
        assert_eq!(token.paths(), vec![dir.path().join("preview.png").as_path()]);
    }
}
