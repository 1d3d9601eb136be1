// Folder organization engine
//
// Per folder the engine classifies entries, prepares subtitles, transcodes audio,
// associates audio with same-stem subtitles and numbers every group:
// - classify: audio / subtitle / image partition of a folder listing
// - normalize: noise token removal for filename stems
// - associate: audio to subtitle pairing by exact stem
// - ordinal: 「NN」 numbering of associated groups and leftover subtitles
// - folder: the per-folder pipeline and the depth-first tree walk

pub mod associate;
pub mod classify;
pub mod folder;
pub mod normalize;
pub mod ordinal;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub use associate::*;
pub use classify::*;
pub use folder::*;
pub use normalize::*;
pub use ordinal::*;

use crate::config::LibraryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Audio,
    Subtitle,
    Image,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Image => "image",
        };
        f.write_str(label)
    }
}

/// A classified file inside the folder being processed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    pub path: PathBuf,
    pub kind: FileKind,
    /// Filename without its extension. Subtitles also lose a compound audio
    /// extension, so `talk.mp3.vtt` has the stem `talk`.
    pub stem: String,
}

impl FileEntry {
    pub fn new(path: PathBuf, kind: FileKind, library: &LibraryConfig) -> Self {
        let stem = derive_stem(&path, kind, library);
        Self { path, kind, stem }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Final extension including the leading dot, or an empty string
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}

fn derive_stem(path: &Path, kind: FileKind, library: &LibraryConfig) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if kind != FileKind::Subtitle {
        return stem;
    }

    library
        .audio_extensions
        .iter()
        .find_map(|ext| strip_suffix_ignore_ascii_case(&stem, ext))
        .map(str::to_string)
        .unwrap_or(stem)
}

/// Strip an ASCII suffix regardless of case, leaving the rest of the name untouched
pub fn strip_suffix_ignore_ascii_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Rename that refuses to replace an existing file.
///
/// `std::fs::rename` silently overwrites on Unix; a collision is reported as
/// `AlreadyExists` instead so the caller can skip the file.
pub fn rename_without_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    if from == to {
        return Ok(());
    }
    if to.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("target already exists: {}", to.display()),
        ));
    }
    std::fs::rename(from, to)
}
