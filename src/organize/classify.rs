use std::path::{Path, PathBuf};

use crate::config::LibraryConfig;
use crate::error::Result;
use super::{FileEntry, FileKind};

/// A folder's files split by kind, each list in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub audio: Vec<FileEntry>,
    pub subtitles: Vec<FileEntry>,
    pub images: Vec<FileEntry>,
}

/// Regular files directly inside `folder`, in directory listing order
pub fn list_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Kind of a single file, or `None` when it is not interesting.
///
/// Audio wins over subtitle and subtitle over image, so `a.mp3` is audio
/// while `a.mp3.vtt` is a subtitle.
pub fn classify_path(path: &Path, library: &LibraryConfig) -> Option<FileKind> {
    let lower_name = path.file_name()?.to_string_lossy().to_lowercase();

    if library.is_audio_name(&lower_name) {
        Some(FileKind::Audio)
    } else if library.is_subtitle_name(&lower_name) {
        Some(FileKind::Subtitle)
    } else if library.is_image_name(&lower_name) {
        Some(FileKind::Image)
    } else {
        None
    }
}

pub fn classify<I>(files: I, library: &LibraryConfig) -> Classification
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut classification = Classification::default();

    for path in files {
        let Some(kind) = classify_path(&path, library) else {
            continue;
        };
        let entry = FileEntry::new(path, kind, library);
        match kind {
            FileKind::Audio => classification.audio.push(entry),
            FileKind::Subtitle => classification.subtitles.push(entry),
            FileKind::Image => classification.images.push(entry),
        }
    }

    classification
}

/// List and classify a folder in one step
pub fn classify_folder(folder: &Path, library: &LibraryConfig) -> Result<Classification> {
    Ok(classify(list_folder(folder)?, library))
}
