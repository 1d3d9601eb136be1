use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::error::{Result, OrganizerError};
use crate::organize::{classify_folder, rename_without_overwrite, AssociationMap, FileEntry};
use super::Translator;

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:「(\d{2})」|【(\d{2})】)(.*)").expect("leading number pattern"));

static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("illegal character pattern"));

/// Replace characters that are not allowed in file names with `。`
pub fn sanitize_name(name: &str) -> String {
    ILLEGAL_CHARS.replace_all(name, "。").into_owned()
}

/// Split a stem into its two-digit `「NN」`/`【NN】` prefix and the trimmed remainder
pub fn split_leading_number(stem: &str) -> (Option<&str>, &str) {
    match LEADING_NUMBER.captures(stem) {
        Some(caps) => {
            let number = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            let rest = caps.get(3).map_or("", |m| m.as_str()).trim();
            (number, rest)
        }
        None => (None, stem),
    }
}

/// `「NN」<translated>[<original>]<ext>`, or without the number when there was none
pub fn translated_file_name(number: Option<&str>, translated: &str, original: &str, extension: &str) -> String {
    let translated = sanitize_name(translated);
    match number {
        Some(number) => format!("「{}」{}[{}]{}", number, translated, original, extension),
        None => format!("{}[{}]{}", translated, original, extension),
    }
}

pub fn translated_dir_name(translated: &str, original: &str) -> String {
    format!("{}[{}]", sanitize_name(translated), original)
}

/// Every directory under `root` (root included), deepest first.
/// Directories of equal depth keep walk order.
pub fn directories_deepest_first(root: &Path) -> Vec<(usize, PathBuf)> {
    let mut dirs: Vec<(usize, PathBuf)> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| (entry.depth(), entry.into_path()))
        .collect();

    dirs.sort_by(|a, b| b.0.cmp(&a.0));
    dirs
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationSummary {
    pub files_renamed: usize,
    pub dirs_renamed: usize,
    pub skipped: usize,
}

/// Translates file names first and folder names second across one tree
pub struct TranslationPass<'a> {
    translator: &'a dyn Translator,
    library: &'a LibraryConfig,
}

impl<'a> TranslationPass<'a> {
    pub fn new(translator: &'a dyn Translator, library: &'a LibraryConfig) -> Self {
        Self { translator, library }
    }

    pub async fn run(&self, root: &Path) -> Result<TranslationSummary> {
        if !root.is_dir() {
            return Err(OrganizerError::FileNotFound(format!("translation directory {}", root.display())));
        }

        let mut summary = TranslationSummary::default();

        for (_, dir) in directories_deepest_first(root) {
            info!("Translating file names: {}", dir.display());
            if let Err(e) = self.translate_files(&dir, &mut summary).await {
                error!("Could not process {}: {}", dir.display(), e);
            }
        }

        // Re-list after the file pass, then rename folders bottom-up
        for (depth, dir) in directories_deepest_first(root) {
            if depth == 0 {
                continue;
            }
            info!("Translating folder name: {}", dir.display());
            self.translate_dir(&dir, &mut summary).await;
        }

        Ok(summary)
    }

    async fn translate_files(&self, dir: &Path, summary: &mut TranslationSummary) -> Result<()> {
        let classification = classify_folder(dir, self.library)?;
        let lrc_subtitles: Vec<FileEntry> = classification
            .subtitles
            .into_iter()
            .filter(|entry| entry.extension().eq_ignore_ascii_case(".lrc"))
            .collect();
        let associations = AssociationMap::build(&classification.audio, &lrc_subtitles);

        for audio in &classification.audio {
            if !self.translate_file(&audio.path, summary).await {
                continue;
            }
            for subtitle in associations.subtitles_for(&audio.path) {
                if subtitle.path.exists() {
                    self.translate_file(&subtitle.path, summary).await;
                }
            }
        }

        Ok(())
    }

    async fn translate_file(&self, path: &Path, summary: &mut TranslationSummary) -> bool {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let (number, original) = split_leading_number(&stem);

        let Some(translated) = self.translate_text(original).await else {
            summary.skipped += 1;
            return false;
        };

        let new_name = translated_file_name(number, &translated, original, &extension);
        if self.rename(path, &path.with_file_name(&new_name)) {
            summary.files_renamed += 1;
            true
        } else {
            summary.skipped += 1;
            false
        }
    }

    async fn translate_dir(&self, dir: &Path, summary: &mut TranslationSummary) {
        let original = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        let Some(translated) = self.translate_text(&original).await else {
            summary.skipped += 1;
            return;
        };

        let new_name = translated_dir_name(&translated, &original);
        if self.rename(dir, &dir.with_file_name(&new_name)) {
            summary.dirs_renamed += 1;
        } else {
            summary.skipped += 1;
        }
    }

    async fn translate_text(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            warn!("Nothing to translate in an empty name");
            return None;
        }

        match self.translator.translate(text).await {
            Ok(translated) if !translated.trim().is_empty() => Some(translated),
            Ok(_) => {
                warn!("Translation came back empty: {}", text);
                None
            }
            Err(e) => {
                warn!("Translation failed: {} - {}", text, e);
                None
            }
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> bool {
        let from_name = from.file_name().unwrap_or_default().to_string_lossy();
        let to_name = to.file_name().unwrap_or_default().to_string_lossy();

        match rename_without_overwrite(from, to) {
            Ok(()) => {
                info!("Translated: {} -> {}", from_name, to_name);
                true
            }
            Err(e) => {
                error!("Rename failed: {} -> {}: {}", from_name, to_name, e);
                false
            }
        }
    }
}
