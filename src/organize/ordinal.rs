use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{normalize_stem, rename_without_overwrite, AssociationMap, FileEntry, FileKind};

/// Filesystem seam for the renamer
#[cfg_attr(test, mockall::automock)]
pub trait RenameOps {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Renames on the local filesystem without ever replacing an existing file
pub struct FsRename;

impl RenameOps for FsRename {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        rename_without_overwrite(from, to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedFile {
    pub original: PathBuf,
    pub renamed: PathBuf,
    pub kind: FileKind,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRename {
    pub path: PathBuf,
    pub target: PathBuf,
    pub reason: String,
}

/// Result of numbering one folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdinalAssignment {
    pub assigned: Vec<AssignedFile>,
    pub failed: Vec<FailedRename>,
}

impl OrdinalAssignment {
    pub fn ordinal_of(&self, original: &Path) -> Option<u32> {
        self.assigned
            .iter()
            .find(|file| file.original == original)
            .map(|file| file.ordinal)
    }

    /// Highest ordinal handed out, 0 when nothing was renamed
    pub fn last_ordinal(&self) -> u32 {
        self.assigned.iter().map(|file| file.ordinal).max().unwrap_or(0)
    }
}

/// `「NN」` followed by the cleaned stem and the original extension
pub fn numbered_file_name(entry: &FileEntry, ordinal: u32) -> String {
    format!("「{:02}」{}{}", ordinal, normalize_stem(&entry.stem), entry.extension())
}

pub fn numbered_path(entry: &FileEntry, ordinal: u32) -> PathBuf {
    entry.path.with_file_name(numbered_file_name(entry, ordinal))
}

/// Assigns 「NN」 ordinals to one folder's audio groups and leftover subtitles
pub struct OrdinalRenamer<'a, R: RenameOps> {
    ops: &'a R,
}

impl<'a, R: RenameOps> OrdinalRenamer<'a, R> {
    pub fn new(ops: &'a R) -> Self {
        Self { ops }
    }

    /// Number every audio file and its subtitles, then the leftover subtitles.
    ///
    /// Audio is visited in case-insensitive filename order. A failed audio
    /// rename does not consume a number and leaves its subtitles for the
    /// leftover pass, which keeps the listing order of `subtitles`.
    pub fn assign(
        &self,
        audio: &[FileEntry],
        subtitles: &[FileEntry],
        associations: &AssociationMap,
    ) -> OrdinalAssignment {
        let mut sorted_audio: Vec<&FileEntry> = audio.iter().collect();
        sorted_audio.sort_by_key(|entry| entry.file_name().to_lowercase());

        let mut assignment = OrdinalAssignment::default();
        let mut consumed: HashSet<&Path> = HashSet::new();
        let mut counter: u32 = 1;

        for entry in sorted_audio {
            if !self.rename_numbered(entry, counter, &mut assignment) {
                continue;
            }

            for subtitle in associations.subtitles_for(&entry.path) {
                self.rename_numbered(subtitle, counter, &mut assignment);
                consumed.insert(subtitle.path.as_path());
            }

            counter += 1;
        }

        for subtitle in subtitles.iter().filter(|s| !consumed.contains(s.path.as_path())) {
            if self.rename_numbered(subtitle, counter, &mut assignment) {
                counter += 1;
            }
        }

        assignment
    }

    fn rename_numbered(&self, entry: &FileEntry, ordinal: u32, assignment: &mut OrdinalAssignment) -> bool {
        let target = numbered_path(entry, ordinal);

        match self.ops.rename(&entry.path, &target) {
            Ok(()) => {
                info!(
                    "Numbered ({}): {} -> {}",
                    entry.kind,
                    entry.file_name(),
                    target.file_name().unwrap_or_default().to_string_lossy()
                );
                assignment.assigned.push(AssignedFile {
                    original: entry.path.clone(),
                    renamed: target,
                    kind: entry.kind,
                    ordinal,
                });
                true
            }
            Err(e) => {
                warn!("Numbering failed ({}): {} - {}", entry.kind, entry.file_name(), e);
                assignment.failed.push(FailedRename {
                    path: entry.path.clone(),
                    target,
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}
