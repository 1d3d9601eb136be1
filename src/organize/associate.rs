use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::FileEntry;

/// Audio path to the subtitles sharing its stem.
///
/// Audio files without a subtitle are absent rather than mapped to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationMap {
    groups: HashMap<PathBuf, Vec<FileEntry>>,
}

impl AssociationMap {
    /// Group subtitles under the audio entry with an identical stem.
    ///
    /// Stems compare byte for byte; no normalization happens here. When two
    /// audio files share a stem the later one in `audio` receives the subtitles.
    pub fn build(audio: &[FileEntry], subtitles: &[FileEntry]) -> Self {
        let by_stem: HashMap<&str, &Path> = audio
            .iter()
            .map(|entry| (entry.stem.as_str(), entry.path.as_path()))
            .collect();

        let mut groups: HashMap<PathBuf, Vec<FileEntry>> = HashMap::new();
        for subtitle in subtitles {
            if let Some(audio_path) = by_stem.get(subtitle.stem.as_str()) {
                groups
                    .entry(audio_path.to_path_buf())
                    .or_default()
                    .push(subtitle.clone());
            }
        }

        Self { groups }
    }

    pub fn subtitles_for(&self, audio: &Path) -> &[FileEntry] {
        self.groups.get(audio).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_audio(&self, audio: &Path) -> bool {
        self.groups.contains_key(audio)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
