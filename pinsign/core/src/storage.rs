use core::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sysinfo::Disks;

use crate::config::StorageConfig;
use crate::error::{SignerError, SignerResult};
use crate::types::{RemovableVolume, UsbStatus};

/**
    Something that can list the removable volumes attached right now.
*/
pub trait VolumeSource: fmt::Debug {
    fn volumes(&self) -> SignerResult<Vec<RemovableVolume>>;
}

/**
    Mounted partitions the OS flags as removable.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct MountedDisks;

impl VolumeSource for MountedDisks {
    fn volumes(&self) -> SignerResult<Vec<RemovableVolume>> {
        let disks = Disks::new_with_refreshed_list();
        Ok(disks
            .list()
            .iter()
            .filter(|disk| disk.is_removable())
            .map(|disk| RemovableVolume::new(disk.mount_point()))
            .collect())
    }
}

/**
    Every subdirectory of a per-user media root such as `/run/media/<user>`.
    A missing or unreadable root yields no volumes rather than an error.
*/
#[derive(Debug, Clone)]
pub struct MediaRoot {
    root: PathBuf,
}

impl MediaRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl VolumeSource for MediaRoot {
    fn volumes(&self) -> SignerResult<Vec<RemovableVolume>> {
        // An unreadable root means no media from this source; other
        // sources are still consulted.
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!(root = %self.root.display(), error = %e, "media root unreadable");
                return Ok(Vec::new());
            }
        };

        let mut volumes = Vec::new();
        for entry in entries {
            // A mount vanishing mid-listing is just one fewer volume
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if path.is_dir() {
                volumes.push(RemovableVolume::new(path));
            }
        }
        Ok(volumes)
    }
}

/**
    Discovery of removable volumes and placement or retrieval of the
    sealed key on them. Nothing is cached: each call enumerates afresh.
*/
#[derive(Debug)]
pub struct RemovableStorage {
    sources: Vec<Box<dyn VolumeSource>>,
    key_filename: String,
}

impl RemovableStorage {
    pub fn new(sources: Vec<Box<dyn VolumeSource>>, key_filename: impl Into<String>) -> Self {
        Self {
            sources,
            key_filename: key_filename.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        let mut sources: Vec<Box<dyn VolumeSource>> = Vec::new();
        if config.mounted_disks {
            sources.push(Box::new(MountedDisks));
        }
        if let Some(root) = &config.media_root {
            sources.push(Box::new(MediaRoot::new(root)));
        }
        Self::new(sources, config.key_filename.clone())
    }

    pub fn key_filename(&self) -> &str {
        &self.key_filename
    }

    /**
        Removable volumes attached right now, de-duplicated and sorted by
        path. No media attached is an empty list, not an error.
    */
    pub fn enumerate(&self) -> SignerResult<Vec<RemovableVolume>> {
        let mut volumes = Vec::new();
        for source in &self.sources {
            volumes.extend(source.volumes()?);
        }
        volumes.sort();
        volumes.dedup_by(|a, b| a.mount_path == b.mount_path);
        tracing::debug!(count = volumes.len(), "enumerated removable volumes");
        Ok(volumes)
    }

    /**
        Every key file present on `volumes`, in volume order.
    */
    pub fn find_encrypted_keys(&self, volumes: &[RemovableVolume]) -> Vec<PathBuf> {
        volumes
            .iter()
            .map(|volume| volume.path().join(&self.key_filename))
            .filter(|path| path.is_file())
            .collect()
    }

    /**
        Enumerate, scan, and resolve exactly one key file.
        See [`select_key`] for how `selection` disambiguates.
    */
    pub fn locate_key(&self, selection: Option<&Path>) -> SignerResult<PathBuf> {
        let volumes = self.enumerate()?;
        let candidates = self.find_encrypted_keys(&volumes);
        select_key(candidates, selection)
    }

    /**
        Write a sealed key to the root of `volume`, replacing any existing
        file. `filename` defaults to the configured key filename.
    */
    pub fn place(
        &self,
        blob: &[u8],
        volume: &RemovableVolume,
        filename: Option<&str>,
    ) -> SignerResult<PathBuf> {
        if !volume.is_present() {
            return Err(SignerError::VolumeUnavailable(volume.mount_path.clone()));
        }

        let path = volume
            .path()
            .join(filename.unwrap_or(&self.key_filename));
        write_file(&path, blob)?;
        tracing::info!(path = %path.display(), "placed encrypted key");
        Ok(path)
    }

    /**
        Read a sealed key back. A file that vanished since discovery is
        reported as missing, not as an I/O fault.
    */
    pub fn read_key(&self, path: &Path) -> SignerResult<Vec<u8>> {
        fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SignerError::KeyNotFound,
            _ => SignerError::io(path, e),
        })
    }

    /**
        Presence snapshot for a status display: the first volume, if any.
    */
    pub fn status(&self) -> SignerResult<UsbStatus> {
        Ok(match self.enumerate()?.into_iter().next() {
            Some(volume) => UsbStatus::Detected(volume.mount_path),
            None => UsbStatus::NotDetected,
        })
    }
}

/**
    Pick one key file out of the discovered candidates.

    - none: [`SignerError::KeyNotFound`]
    - one, no selection: that one
    - several, no selection: [`SignerError::MultipleKeys`] so the caller can ask
    - with a selection (key file or its volume root): the matching
      candidate, or [`SignerError::KeyNotFound`] if it holds no key
*/
pub fn select_key(candidates: Vec<PathBuf>, selection: Option<&Path>) -> SignerResult<PathBuf> {
    if let Some(selected) = selection {
        return candidates
            .into_iter()
            .find(|c| c == selected || c.parent() == Some(selected))
            .ok_or(SignerError::KeyNotFound);
    }

    match candidates.len() {
        0 => Err(SignerError::KeyNotFound),
        1 => candidates.into_iter().next().ok_or(SignerError::KeyNotFound),
        _ => Err(SignerError::MultipleKeys(candidates)),
    }
}

/**
    Create or truncate `path` and write `data` through a handle that is
    closed on every exit path. No atomic rename.
*/
pub(crate) fn write_file(path: &Path, data: &[u8]) -> SignerResult<()> {
    let mut file = File::create(path).map_err(|e| SignerError::io(path, e))?;
    file.write_all(data).map_err(|e| SignerError::io(path, e))?;
    file.sync_all().map_err(|e| SignerError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_over(root: &Path) -> RemovableStorage {
        let source: Box<dyn VolumeSource> = Box::new(MediaRoot::new(root));
        RemovableStorage::new(vec![source], "private_encrypted.pem")
    }

    #[test]
    fn missing_media_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage_over(&dir.path().join("nobody"));
        assert!(storage.enumerate().unwrap().is_empty());
        assert_eq!(storage.status().unwrap(), UsbStatus::NotDetected);
    }

    #[test]
    fn unreadable_media_root_does_not_hide_other_sources() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = dir.path().join("media");
        fs::write(&not_a_dir, b"x").unwrap();
        let other = dir.path().join("other");
        fs::create_dir_all(other.join("USB")).unwrap();

        let storage = RemovableStorage::new(
            vec![
                Box::new(MediaRoot::new(&not_a_dir)) as Box<dyn VolumeSource>,
                Box::new(MediaRoot::new(&other)),
            ],
            "private_encrypted.pem",
        );
        let volumes = storage.enumerate().unwrap();
        assert_eq!(volumes, vec![RemovableVolume::new(other.join("USB"))]);
        assert!(storage_over(&not_a_dir).enumerate().unwrap().is_empty());
    }

    #[test]
    fn empty_media_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage_over(dir.path());
        assert!(storage.enumerate().unwrap().is_empty());
    }

    #[test]
    fn lists_only_directories_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("USB_B")).unwrap();
        fs::create_dir(dir.path().join("USB_A")).unwrap();
        fs::write(dir.path().join("stray.txt"), b"x").unwrap();

        let volumes = storage_over(dir.path()).enumerate().unwrap();
        let names: Vec<_> = volumes
            .iter()
            .map(|v| v.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["USB_A", "USB_B"]);
        assert!(volumes.iter().all(|v| v.removable));
    }

    #[test]
    fn duplicate_sources_are_merged() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("KEY")).unwrap();
        let storage = RemovableStorage::new(
            vec![
                Box::new(MediaRoot::new(dir.path())) as Box<dyn VolumeSource>,
                Box::new(MediaRoot::new(dir.path())),
            ],
            "private_encrypted.pem",
        );
        assert_eq!(storage.enumerate().unwrap().len(), 1);
    }

    #[test]
    fn place_then_locate_and_read() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("KEY")).unwrap();
        let storage = storage_over(dir.path());

        let volume = storage.enumerate().unwrap().remove(0);
        let placed = storage.place(b"sealed", &volume, None).unwrap();
        assert_eq!(placed, dir.path().join("KEY/private_encrypted.pem"));

        let located = storage.locate_key(None).unwrap();
        assert_eq!(located, placed);
        assert_eq!(storage.read_key(&located).unwrap(), b"sealed");
    }

    #[test]
    fn place_overwrites_and_honours_filename() {
        let dir = TempDir::new().unwrap();
        let volume = RemovableVolume::new(dir.path());
        let storage = storage_over(dir.path());

        storage.place(b"first", &volume, Some("other.pem")).unwrap();
        let path = storage.place(b"second", &volume, Some("other.pem")).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn place_on_vanished_volume() {
        let dir = TempDir::new().unwrap();
        let gone = RemovableVolume::new(dir.path().join("UNPLUGGED"));
        let err = storage_over(dir.path()).place(b"x", &gone, None).unwrap_err();
        assert!(matches!(err, SignerError::VolumeUnavailable(_)));
    }

    #[test]
    fn no_key_on_any_volume() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("EMPTY")).unwrap();
        let err = storage_over(dir.path()).locate_key(None).unwrap_err();
        assert!(matches!(err, SignerError::KeyNotFound));
    }

    #[test]
    fn several_keys_need_a_selection() {
        let dir = TempDir::new().unwrap();
        for name in ["A", "B"] {
            fs::create_dir(dir.path().join(name)).unwrap();
            fs::write(dir.path().join(name).join("private_encrypted.pem"), name).unwrap();
        }
        let storage = storage_over(dir.path());

        match storage.locate_key(None).unwrap_err() {
            SignerError::MultipleKeys(found) => assert_eq!(found.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }

        let chosen = storage.locate_key(Some(&dir.path().join("B"))).unwrap();
        assert_eq!(storage.read_key(&chosen).unwrap(), b"B");
    }

    #[test]
    fn selection_without_key_is_not_found() {
        let candidates = vec![PathBuf::from("/media/A/private_encrypted.pem")];
        let err = select_key(candidates, Some(Path::new("/media/C"))).unwrap_err();
        assert!(matches!(err, SignerError::KeyNotFound));
    }

    #[test]
    fn read_vanished_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = storage_over(dir.path())
            .read_key(&dir.path().join("private_encrypted.pem"))
            .unwrap_err();
        assert!(matches!(err, SignerError::KeyNotFound));
    }
}
