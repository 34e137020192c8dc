//! Destination planning
//!
//! Turns the enumerated source files into an ordered list of copy tasks:
//! where each file lands, how big it is, and whether it will be written.

use crate::config::{CollisionPolicy, CopyPolicy};
use crate::core::policy::{decide, OverwriteDecision};
use crate::error::{MclubError, Result};
use crate::fs::{absolutize, SourceListing};
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

/// One file to copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyTask {
    /// Absolute source path
    pub source: PathBuf,
    /// Absolute destination path
    pub destination: PathBuf,
    /// Source size at planning time
    pub size_bytes: u64,
    /// Decided against the destination as it was at planning time
    pub overwrite_decision: OverwriteDecision,
}

/// Ordered tasks for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CopyPlan {
    /// Destination root every task lives under
    pub destination_root: PathBuf,
    /// Tasks in source path order
    pub tasks: Vec<CopyTask>,
    /// Tasks that received a numbered name to avoid a collision
    pub renamed: usize,
}

impl CopyPlan {
    /// Bytes that will be written (skipped tasks excluded)
    pub fn required_bytes(&self) -> u64 {
        self.tasks
            .iter()
            .filter(|t| t.overwrite_decision.writes())
            .map(|t| t.size_bytes)
            .sum()
    }

    /// Number of tasks that will be written
    pub fn write_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.overwrite_decision.writes())
            .count()
    }

    /// Number of tasks kept as-is
    pub fn skip_count(&self) -> usize {
        self.tasks.len() - self.write_count()
    }

    /// No tasks at all
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// The normal segments of `path`, with drive prefix and root removed.
///
/// `..` is applied lexically so a segment list can never climb out of the
/// destination root.
pub fn path_segments(path: &Path) -> Vec<&OsStr> {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => segments.push(s),
            Component::ParentDir => {
                segments.pop();
            }
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    segments
}

/// Destination of `source` under `dest_root` with `flatten` leading segments dropped.
///
/// The file name always survives: when `flatten` reaches or passes the
/// number of segments only the file name is kept.
pub fn destination_for(source: &Path, dest_root: &Path, flatten: usize) -> PathBuf {
    let segments = path_segments(source);

    let kept: &[&OsStr] = if flatten < segments.len() {
        &segments[flatten..]
    } else {
        match segments.last() {
            Some(_) => &segments[segments.len() - 1..],
            None => &[],
        }
    };

    let mut dest = dest_root.to_path_buf();
    dest.extend(kept);
    dest
}

/// `photo.jpg` → `photo (n).jpg`
fn numbered_name(path: &Path, n: usize) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();

    let mut name = OsString::from(stem);
    name.push(format!(" ({n})"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }

    path.with_file_name(name)
}

/// Key under which a destination is reserved.
///
/// On a case-insensitive volume `A.txt` and `a.txt` are the same file, so
/// names are folded before they are compared.
fn collision_key(path: &Path, fold_case: bool) -> PathBuf {
    match path.to_str() {
        Some(text) if fold_case => PathBuf::from(text.to_lowercase()),
        _ => path.to_path_buf(),
    }
}

/// Does the volume holding `dest_root` ignore letter case in names?
///
/// Looks up the nearest existing ancestor with a cased name under its
/// swapped-case spelling. When no such ancestor exists the platform
/// default is assumed.
pub fn volume_ignores_case(dest_root: &Path) -> bool {
    for ancestor in dest_root.ancestors() {
        let Some(name) = ancestor.file_name().and_then(OsStr::to_str) else {
            continue;
        };
        if !ancestor.exists() {
            continue;
        }
        let swapped: String = name
            .chars()
            .map(|c| {
                if c.is_lowercase() {
                    c.to_uppercase().next().unwrap_or(c)
                } else {
                    c.to_lowercase().next().unwrap_or(c)
                }
            })
            .collect();
        if swapped != name {
            return ancestor.with_file_name(swapped).exists();
        }
    }
    cfg!(any(windows, target_os = "macos"))
}

/// Build the copy plan for an enumerated selection.
pub fn plan_copy(listing: &SourceListing, dest_root: &Path, policy: &CopyPolicy) -> Result<CopyPlan> {
    let dest_root = absolutize(dest_root)?;
    let fold_case = volume_ignores_case(&dest_root);
    plan_with_case(listing, dest_root, policy, fold_case)
}

fn plan_with_case(listing: &SourceListing, dest_root: PathBuf, policy: &CopyPolicy, fold_case: bool) -> Result<CopyPlan> {
    let natural: Vec<PathBuf> = listing
        .files
        .iter()
        .map(|entry| destination_for(&entry.path, &dest_root, policy.flatten_depth))
        .collect();

    // Every selected source is off limits as a write target; the ones that
    // already sit at their own destination keep it.
    let sources: HashMap<PathBuf, &Path> = listing
        .files
        .iter()
        .map(|entry| (collision_key(&entry.path, fold_case), entry.path.as_path()))
        .collect();
    let mut taken: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(listing.files.len());
    for (entry, destination) in listing.files.iter().zip(&natural) {
        if *destination == entry.path {
            taken.insert(collision_key(destination, fold_case), entry.path.clone());
        }
    }

    let occupant = |taken: &HashMap<PathBuf, PathBuf>, key: &PathBuf| -> Option<PathBuf> {
        taken
            .get(key)
            .cloned()
            .or_else(|| sources.get(key).map(|p| p.to_path_buf()))
    };

    let mut tasks = Vec::with_capacity(listing.files.len());
    let mut renamed = 0;

    for (entry, mut destination) in listing.files.iter().zip(natural) {
        // A source already sitting at its destination is never rewritten.
        if destination == entry.path {
            tracing::debug!("{} is already in place", entry.path.display());
            tasks.push(CopyTask {
                source: entry.path.clone(),
                destination,
                size_bytes: entry.size,
                overwrite_decision: OverwriteDecision::Skip,
            });
            continue;
        }

        if let Some(first) = occupant(&taken, &collision_key(&destination, fold_case)) {
            match policy.collision {
                CollisionPolicy::Abort => {
                    return Err(MclubError::DestinationCollision {
                        destination,
                        first,
                        second: entry.path.clone(),
                    });
                }
                CollisionPolicy::Rename => {
                    let mut n = 1;
                    let mut candidate = numbered_name(&destination, n);
                    while occupant(&taken, &collision_key(&candidate, fold_case)).is_some() {
                        n += 1;
                        candidate = numbered_name(&destination, n);
                    }
                    tracing::info!(
                        "{} collides with {}, renamed to {}",
                        entry.path.display(),
                        first.display(),
                        candidate.display()
                    );
                    destination = candidate;
                    renamed += 1;
                }
            }
        }

        let overwrite_decision = decide(entry, &destination, policy.overwrite_mode);
        tracing::debug!(
            "{} -> {} ({:?})",
            entry.path.display(),
            destination.display(),
            overwrite_decision
        );

        taken.insert(collision_key(&destination, fold_case), entry.path.clone());
        tasks.push(CopyTask {
            source: entry.path.clone(),
            destination,
            size_bytes: entry.size,
            overwrite_decision,
        });
    }

    Ok(CopyPlan {
        destination_root: dest_root,
        tasks,
        renamed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverwriteMode;
    use crate::fs::{enumerate_sources, FileEntry};
    use proptest::prelude::*;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn entry(path: &Path, size: u64) -> FileEntry {
        FileEntry {
            path: path.to_path_buf(),
            size,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    fn listing(entries: Vec<FileEntry>) -> SourceListing {
        let total_size = entries.iter().map(|e| e.size).sum();
        SourceListing {
            files: entries,
            total_size,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_flatten_zero_keeps_full_path() {
        let dest = destination_for(Path::new("/music/rock/a.mp3"), Path::new("/out"), 0);
        assert_eq!(dest, PathBuf::from("/out/music/rock/a.mp3"));
    }

    #[test]
    fn test_flatten_drops_leading_segments() {
        let dest = destination_for(Path::new("/music/rock/a.mp3"), Path::new("/out"), 2);
        assert_eq!(dest, PathBuf::from("/out/a.mp3"));
    }

    #[test]
    fn test_flatten_past_depth_keeps_file_name() {
        let dest = destination_for(Path::new("/music/rock/a.mp3"), Path::new("/out"), 9);
        assert_eq!(dest, PathBuf::from("/out/a.mp3"));
    }

    #[test]
    fn test_parent_dir_is_applied_lexically() {
        let dest = destination_for(Path::new("/a/b/../c/f.txt"), Path::new("/out"), 0);
        assert_eq!(dest, PathBuf::from("/out/a/c/f.txt"));
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name(Path::new("/o/p.jpg"), 1), PathBuf::from("/o/p (1).jpg"));
        assert_eq!(numbered_name(Path::new("/o/README"), 2), PathBuf::from("/o/README (2)"));
        assert_eq!(
            numbered_name(Path::new("/o/a.tar.gz"), 1),
            PathBuf::from("/o/a.tar (1).gz")
        );
    }

    #[test]
    fn test_collision_renamed_in_source_order() {
        let out = TempDir::new().unwrap();
        let files = listing(vec![
            entry(Path::new("/src/one/pic.jpg"), 1),
            entry(Path::new("/src/three/pic.jpg"), 3),
            entry(Path::new("/src/two/pic.jpg"), 2),
        ]);
        let policy = CopyPolicy {
            flatten_depth: 2,
            ..Default::default()
        };

        let plan = plan_copy(&files, out.path(), &policy).unwrap();
        let names: Vec<_> = plan
            .tasks
            .iter()
            .map(|t| t.destination.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["pic.jpg", "pic (1).jpg", "pic (2).jpg"]);
        assert_eq!(plan.renamed, 2);
        assert_eq!(plan.required_bytes(), 6);
    }

    #[test]
    fn test_rename_skips_names_already_planned() {
        let out = TempDir::new().unwrap();
        let files = listing(vec![
            entry(Path::new("/a/x (1).txt"), 1),
            entry(Path::new("/b/x.txt"), 1),
            entry(Path::new("/c/x.txt"), 1),
        ]);
        let policy = CopyPolicy {
            flatten_depth: 1,
            ..Default::default()
        };

        let plan = plan_copy(&files, out.path(), &policy).unwrap();
        let last = plan.tasks[2].destination.file_name().unwrap();
        assert_eq!(last, "x (2).txt");
    }

    #[test]
    fn test_collision_abort() {
        let out = TempDir::new().unwrap();
        let files = listing(vec![
            entry(Path::new("/x/f.txt"), 1),
            entry(Path::new("/y/f.txt"), 1),
        ]);
        let policy = CopyPolicy {
            flatten_depth: 5,
            collision: CollisionPolicy::Abort,
            ..Default::default()
        };

        match plan_copy(&files, out.path(), &policy) {
            Err(MclubError::DestinationCollision { first, second, .. }) => {
                assert_eq!(first, PathBuf::from("/x/f.txt"));
                assert_eq!(second, PathBuf::from("/y/f.txt"));
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_existing_destination_is_skipped_and_not_counted() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(src.path().join("keep.txt"), b"0123456789").unwrap();
        std::fs::write(src.path().join("new.txt"), b"01234").unwrap();
        std::fs::write(out.path().join("keep.txt"), b"old").unwrap();

        let files = enumerate_sources(&[src.path().to_path_buf()]).unwrap();
        let policy = CopyPolicy {
            flatten_depth: usize::MAX,
            overwrite_mode: OverwriteMode::Never,
            ..Default::default()
        };
        let plan = plan_copy(&files, out.path(), &policy).unwrap();

        assert_eq!(plan.skip_count(), 1);
        assert_eq!(plan.write_count(), 1);
        assert_eq!(plan.required_bytes(), 5);
    }

    #[test]
    fn test_copy_onto_itself_is_skipped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("same.txt");
        std::fs::write(&file, b"x").unwrap();

        let files = enumerate_sources(&[file.clone()]).unwrap();
        let policy = CopyPolicy {
            flatten_depth: usize::MAX,
            overwrite_mode: OverwriteMode::Either,
            ..Default::default()
        };

        let plan = plan_copy(&files, dir.path(), &policy).unwrap();
        assert_eq!(plan.tasks[0].destination, file);
        assert_eq!(plan.tasks[0].overwrite_decision, OverwriteDecision::Skip);
    }

    #[test]
    fn test_destination_inside_a_source_keeps_its_files() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a");
        let b = root.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("x.txt"), b"AAAAAAAAAA").unwrap();
        std::fs::write(b.join("x.txt"), b"BB").unwrap();

        let files = enumerate_sources(&[a.clone(), b.clone()]).unwrap();
        for mode in [OverwriteMode::Never, OverwriteMode::Larger, OverwriteMode::Either] {
            let policy = CopyPolicy {
                flatten_depth: usize::MAX,
                overwrite_mode: mode,
                ..Default::default()
            };
            let plan = plan_copy(&files, &b, &policy).unwrap();

            let from_a = plan.tasks.iter().find(|t| t.source == a.join("x.txt")).unwrap();
            assert_eq!(from_a.destination, b.join("x (1).txt"));
            assert_eq!(from_a.overwrite_decision, OverwriteDecision::Create);

            let from_b = plan.tasks.iter().find(|t| t.source == b.join("x.txt")).unwrap();
            assert_eq!(from_b.destination, b.join("x.txt"));
            assert_eq!(from_b.overwrite_decision, OverwriteDecision::Skip);
        }
    }

    #[test]
    fn test_other_source_path_is_never_a_write_target() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");
        let outside = root.path().join("x.txt");
        std::fs::write(&outside, b"outside").unwrap();

        // With flatten 0 `outside` maps onto `resident`, which is itself a
        // selected source headed somewhere deeper.
        let resident = destination_for(&outside, &out, 0);
        std::fs::create_dir_all(resident.parent().unwrap()).unwrap();
        std::fs::write(&resident, b"resident").unwrap();

        let files = listing(vec![
            FileEntry::from_path(&outside).unwrap(),
            FileEntry::from_path(&resident).unwrap(),
        ]);

        let abort = CopyPolicy {
            collision: CollisionPolicy::Abort,
            overwrite_mode: OverwriteMode::Either,
            ..Default::default()
        };
        match plan_copy(&files, &out, &abort) {
            Err(MclubError::DestinationCollision { first, second, .. }) => {
                assert_eq!(first, resident);
                assert_eq!(second, outside);
            }
            other => panic!("expected collision, got {other:?}"),
        }

        let rename = CopyPolicy {
            overwrite_mode: OverwriteMode::Either,
            ..Default::default()
        };
        let plan = plan_copy(&files, &out, &rename).unwrap();
        assert!(plan.tasks.iter().all(|t| t.destination != resident));
        assert_eq!(plan.tasks[0].overwrite_decision, OverwriteDecision::Create);
    }

    #[test]
    fn test_case_only_difference_collides_on_case_insensitive_volume() {
        let out = TempDir::new().unwrap();
        let files = listing(vec![
            entry(Path::new("/one/Photo.JPG"), 1),
            entry(Path::new("/two/photo.jpg"), 1),
        ]);
        let policy = CopyPolicy {
            flatten_depth: 1,
            ..Default::default()
        };

        let folded = plan_with_case(&files, out.path().to_path_buf(), &policy, true).unwrap();
        assert_eq!(folded.renamed, 1);
        assert_eq!(folded.tasks[1].destination.file_name().unwrap(), "photo (1).jpg");

        let exact = plan_with_case(&files, out.path().to_path_buf(), &policy, false).unwrap();
        assert_eq!(exact.renamed, 0);
    }

    #[test]
    fn test_volume_case_detection_on_temp_dir() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("CaseProbe");
        std::fs::create_dir(&sub).unwrap();

        let ignores = volume_ignores_case(&sub.join("not/yet"));
        assert_eq!(ignores, dir.path().join("caseprobe").exists());
    }

    proptest! {
        #[test]
        fn prop_flatten_strips_leading_segments(
            segments in prop::collection::vec("[a-z]{1,8}", 1..8),
            flatten in 0usize..12,
        ) {
            let source: PathBuf = std::iter::once("/".to_string()).chain(segments.iter().cloned()).collect();
            let dest = destination_for(&source, Path::new("/dest"), flatten);

            let mut expected = PathBuf::from("/dest");
            if flatten < segments.len() {
                expected.extend(&segments[flatten..]);
            } else {
                expected.push(segments.last().unwrap());
            }
            prop_assert_eq!(dest, expected);
        }
    }
}
