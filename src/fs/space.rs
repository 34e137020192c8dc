//! Free space on the destination volume

use crate::error::{MclubError, Result};
use std::path::{Path, PathBuf};

/// Source of "how many bytes can still be written under this path".
///
/// The engine only asks once per run, before copying starts.
pub trait SpaceProbe: Send {
    /// Bytes available to an unprivileged writer at `path`
    fn available_space(&self, path: &Path) -> Result<u64>;
}

/// Queries the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpaceProbe;

impl SpaceProbe for SystemSpaceProbe {
    fn available_space(&self, path: &Path) -> Result<u64> {
        available_space(path)
    }
}

/// Reports a fixed number of bytes, whatever the path
#[derive(Debug, Clone, Copy)]
pub struct FixedSpace(pub u64);

impl SpaceProbe for FixedSpace {
    fn available_space(&self, _path: &Path) -> Result<u64> {
        Ok(self.0)
    }
}

/// Closest ancestor of `path` that exists (the path itself if it does).
///
/// The destination folder is often created by the run itself, so the
/// volume has to be found through whatever part of the path is already
/// there.
pub fn nearest_existing(path: &Path) -> Option<PathBuf> {
    let path = std::path::absolute(path).ok()?;
    path.ancestors().find(|p| p.exists()).map(Path::to_path_buf)
}

/// Get available space at a path
#[cfg(unix)]
pub fn available_space(path: &Path) -> Result<u64> {
    let probe = nearest_existing(path).ok_or_else(|| MclubError::NotFound(path.to_path_buf()))?;

    let stat = nix::sys::statvfs::statvfs(&probe)
        .map_err(|e| MclubError::io(&probe, std::io::Error::from(e)))?;

    #[allow(clippy::unnecessary_cast)]
    let bytes = stat.blocks_available() as u64 * stat.fragment_size() as u64;
    Ok(bytes)
}

/// Get available space at a path
#[cfg(not(unix))]
pub fn available_space(path: &Path) -> Result<u64> {
    use sysinfo::Disks;

    let probe = nearest_existing(path).ok_or_else(|| MclubError::NotFound(path.to_path_buf()))?;

    let disks = Disks::new_with_refreshed_list();
    let mounts = disks.iter().map(|disk| (disk.mount_point(), disk.available_space()));

    best_mount(&probe, mounts).ok_or_else(|| MclubError::NotFound(path.to_path_buf()))
}

/// `\\?\C:\dir` → `C:\dir`; every other path unchanged.
#[cfg(any(not(unix), test))]
fn strip_verbatim(path: &Path) -> PathBuf {
    use std::path::{Component, Prefix};

    let mut components = path.components();
    if let Some(Component::Prefix(prefix)) = components.next() {
        if let Prefix::VerbatimDisk(letter) = prefix.kind() {
            let mut plain = PathBuf::from(format!("{}:\\", letter as char));
            plain.extend(components.filter(|c| !matches!(c, Component::RootDir)));
            return plain;
        }
    }
    path.to_path_buf()
}

/// Free bytes of the mount with the longest mount point containing `probe`.
#[cfg(any(not(unix), test))]
fn best_mount<'a>(probe: &Path, mounts: impl IntoIterator<Item = (&'a Path, u64)>) -> Option<u64> {
    let probe = strip_verbatim(probe);

    let mut best_match = None;
    let mut best_len = 0;

    for (mount, available) in mounts {
        let mount = strip_verbatim(mount);
        let len = mount.components().count();
        if probe.starts_with(&mount) && (best_match.is_none() || len > best_len) {
            best_match = Some(available);
            best_len = len;
        }
    }

    best_match
}

/// Check if there's enough space for a copy operation
pub fn check_space(probe: &dyn SpaceProbe, dest: &Path, required: u64) -> Result<u64> {
    let available = probe.available_space(dest)?;

    if required > available {
        return Err(MclubError::InsufficientSpace {
            path: dest.to_path_buf(),
            required,
            available,
        });
    }

    Ok(available)
}
