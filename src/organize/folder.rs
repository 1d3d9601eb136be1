use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::error::Result;
use crate::media::Transcoder;
use crate::subtitle::{convert_vtt_to_lrc, normalize_subtitle_filename};
use super::{classify_folder, AssociationMap, FsRename, OrdinalAssignment, OrdinalRenamer, RenameOps};

/// What happened to one folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderReport {
    pub folder: PathBuf,
    pub subtitles_prepared: usize,
    pub transcoded: usize,
    pub assignment: OrdinalAssignment,
    /// Per-file problems that were logged and skipped
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub folders: usize,
    pub folders_failed: usize,
    pub numbered: usize,
    pub transcoded: usize,
    pub problems: usize,
}

/// Runs the preprocessing pipeline on one folder at a time
pub struct FolderProcessor<'a, R: RenameOps = FsRename> {
    library: &'a LibraryConfig,
    transcoder: Option<&'a dyn Transcoder>,
    rename_ops: R,
}

impl<'a> FolderProcessor<'a, FsRename> {
    pub fn new(library: &'a LibraryConfig, transcoder: Option<&'a dyn Transcoder>) -> Self {
        Self::with_rename_ops(library, transcoder, FsRename)
    }
}

impl<'a, R: RenameOps> FolderProcessor<'a, R> {
    pub fn with_rename_ops(library: &'a LibraryConfig, transcoder: Option<&'a dyn Transcoder>, rename_ops: R) -> Self {
        Self {
            library,
            transcoder,
            rename_ops,
        }
    }

    /// Prepare subtitles, transcode, associate and number one folder.
    ///
    /// Every step works on a fresh listing of the folder, so renames done by
    /// an earlier step are always visible to the next one.
    pub async fn process_folder(&self, folder: &Path) -> Result<FolderReport> {
        let mut report = FolderReport {
            folder: folder.to_path_buf(),
            ..Default::default()
        };

        let listing = classify_folder(folder, self.library)?;
        for subtitle in &listing.subtitles {
            self.prepare_subtitle(&subtitle.path, &mut report);
        }

        if let Some(transcoder) = self.transcoder {
            let listing = classify_folder(folder, self.library)?;
            for audio in listing.audio.iter().filter(|a| transcoder.handles(&a.path)) {
                match transcoder.transcode(&audio.path).await {
                    Ok(_) => report.transcoded += 1,
                    Err(e) => {
                        warn!("Transcoding failed: {} - {}", audio.file_name(), e);
                        report.problems.push(format!("{}: {}", audio.file_name(), e));
                    }
                }
            }
        }

        let listing = classify_folder(folder, self.library)?;
        let associations = AssociationMap::build(&listing.audio, &listing.subtitles);
        report.assignment = OrdinalRenamer::new(&self.rename_ops).assign(&listing.audio, &listing.subtitles, &associations);
        report
            .problems
            .extend(report.assignment.failed.iter().map(|f| format!("{}: {}", f.path.display(), f.reason)));

        Ok(report)
    }

    fn prepare_subtitle(&self, path: &Path, report: &mut FolderReport) {
        let name = path.file_name().unwrap_or_default().to_string_lossy().into_owned();

        let vtt = match normalize_subtitle_filename(path, self.library) {
            Ok(Some(vtt)) => vtt,
            Ok(None) => return,
            Err(e) => {
                warn!("Subtitle rename skipped: {} - {}", name, e);
                report.problems.push(format!("{}: {}", name, e));
                return;
            }
        };

        if vtt != path {
            report.subtitles_prepared += 1;
        }

        if !self.library.convert_vtt_to_lrc {
            return;
        }

        match convert_vtt_to_lrc(&vtt) {
            Ok(_) => report.subtitles_prepared += 1,
            Err(e) => {
                warn!("VTT conversion failed: {} - {}", vtt.display(), e);
                report.problems.push(format!("{}: {}", vtt.display(), e));
            }
        }
    }

    /// Process `root` and every folder below it, parents before children.
    ///
    /// A folder that cannot be read is logged and skipped.
    pub async fn process_tree(&self, root: &Path) -> Result<TreeSummary> {
        let folders: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        let progress = ProgressBar::new(folders.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            progress.set_style(style.progress_chars("#>-"));
        }

        let mut summary = TreeSummary::default();
        for folder in &folders {
            let relative = pathdiff::diff_paths(folder, root).unwrap_or_else(|| folder.clone());
            progress.set_message(relative.display().to_string());
            info!("Processing folder: {}", folder.display());

            match self.process_folder(folder).await {
                Ok(report) => {
                    summary.folders += 1;
                    summary.numbered += report.assignment.assigned.len();
                    summary.transcoded += report.transcoded;
                    summary.problems += report.problems.len();
                }
                Err(e) => {
                    error!("Folder skipped: {} - {}", folder.display(), e);
                    summary.folders_failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            "Preprocessing finished: {} folders, {} files numbered, {} transcoded, {} problems",
            summary.folders, summary.numbered, summary.transcoded, summary.problems
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrganizerError;
    use async_trait::async_trait;

    /// Stands in for ffmpeg by renaming `.wav` to `.flac`
    struct RenamingTranscoder;

    #[async_trait]
    impl Transcoder for RenamingTranscoder {
        fn handles(&self, path: &Path) -> bool {
            path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        }

        async fn transcode(&self, input_path: &Path) -> Result<PathBuf> {
            if input_path.to_string_lossy().contains("broken") {
                return Err(OrganizerError::Media("corrupt input".to_string()));
            }
            let output = input_path.with_extension("flac");
            std::fs::rename(input_path, &output)?;
            Ok(output)
        }

        async fn check_availability(&self) -> Result<String> {
            Ok("fake 1.0".to_string())
        }
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    const CUES: &str = "WEBVTT\n\n1\n00:00:01.000 --> 00:00:02.000\nこんにちは\n";

    #[tokio::test]
    async fn test_transcodes_then_numbers() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "02 track.wav");
        touch(dir.path(), "01 track.wav");

        let library = LibraryConfig::default();
        let transcoder = RenamingTranscoder;
        let report = FolderProcessor::new(&library, Some(&transcoder))
            .process_folder(dir.path())
            .await
            .unwrap();

        assert_eq!(report.transcoded, 2);
        assert_eq!(listing(dir.path()), ["「01」track.flac", "「02」track.flac"]);
        assert_eq!(std::fs::read_to_string(dir.path().join("「01」track.flac")).unwrap(), "01 track.wav");
    }

    #[tokio::test]
    async fn test_compound_subtitle_shares_ordinal_without_conversion() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "interview.mp3");
        std::fs::write(dir.path().join("interview.mp3.vtt"), CUES).unwrap();

        let mut library = LibraryConfig::default();
        library.convert_vtt_to_lrc = false;
        let report = FolderProcessor::new(&library, None)
            .process_folder(dir.path())
            .await
            .unwrap();

        assert_eq!(report.subtitles_prepared, 1);
        assert_eq!(listing(dir.path()), ["「01」interview.mp3", "「01」interview.vtt"]);
    }

    #[tokio::test]
    async fn test_vtt_converted_to_lrc_before_numbering() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "talk.flac");
        std::fs::write(dir.path().join("talk.flac.vtt"), CUES).unwrap();

        let library = LibraryConfig::default();
        FolderProcessor::new(&library, None)
            .process_folder(dir.path())
            .await
            .unwrap();

        assert_eq!(listing(dir.path()), ["「01」talk.flac", "「01」talk.lrc"]);
        let lrc = std::fs::read_to_string(dir.path().join("「01」talk.lrc")).unwrap();
        assert!(lrc.contains("[00:01.00]"));
        assert!(lrc.contains("こんにちは"));
    }

    #[tokio::test]
    async fn test_existing_lrc_survives_vtt_conversion() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "talk.mp3");
        touch(dir.path(), "talk.lrc");
        std::fs::write(dir.path().join("talk.vtt"), CUES).unwrap();

        let library = LibraryConfig::default();
        let report = FolderProcessor::new(&library, None)
            .process_folder(dir.path())
            .await
            .unwrap();

        assert_eq!(report.problems.len(), 1);
        assert_eq!(listing(dir.path()), ["「01」talk.lrc", "「01」talk.mp3", "「01」talk.vtt"]);
        assert_eq!(std::fs::read_to_string(dir.path().join("「01」talk.lrc")).unwrap(), "talk.lrc");
    }

    #[tokio::test]
    async fn test_leftover_subtitle_numbered_after_audio() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.mp3");
        touch(dir.path(), "a.mp3");
        touch(dir.path(), "bonus.lrc");
        touch(dir.path(), "cover.jpg");

        let library = LibraryConfig::default();
        let report = FolderProcessor::new(&library, None)
            .process_folder(dir.path())
            .await
            .unwrap();

        assert_eq!(report.assignment.last_ordinal(), 3);
        assert_eq!(listing(dir.path()), ["cover.jpg", "「01」a.mp3", "「02」b.mp3", "「03」bonus.lrc"]);
    }

    #[tokio::test]
    async fn test_failed_transcode_keeps_source_and_still_numbers_it() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "broken.wav");
        touch(dir.path(), "fine.wav");

        let library = LibraryConfig::default();
        let transcoder = RenamingTranscoder;
        let report = FolderProcessor::new(&library, Some(&transcoder))
            .process_folder(dir.path())
            .await
            .unwrap();

        assert_eq!(report.transcoded, 1);
        assert_eq!(report.problems.len(), 1);
        assert_eq!(listing(dir.path()), ["「01」broken.wav", "「02」fine.flac"]);
    }

    #[tokio::test]
    async fn test_rename_failures_are_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp3");
        touch(dir.path(), "a.lrc");

        let mut ops = crate::organize::MockRenameOps::new();
        ops.expect_rename()
            .times(2)
            .returning(|_, _| Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")));

        let library = LibraryConfig::default();
        let report = FolderProcessor::with_rename_ops(&library, None, ops)
            .process_folder(dir.path())
            .await
            .unwrap();

        // the audio rename fails, then its subtitle fails in the leftover pass
        assert!(report.assignment.assigned.is_empty());
        assert_eq!(report.problems.len(), 2);
        assert_eq!(listing(dir.path()), ["a.lrc", "a.mp3"]);
    }

    #[tokio::test]
    async fn test_tree_walk_handles_every_folder() {
        let dir = tempfile::tempdir().unwrap();
        let disc = dir.path().join("disc1");
        std::fs::create_dir_all(&disc).unwrap();
        touch(dir.path(), "root.mp3");
        touch(&disc, "03 end.mp3");
        touch(&disc, "01 start.mp3");

        let library = LibraryConfig::default();
        let summary = FolderProcessor::new(&library, None)
            .process_tree(dir.path())
            .await
            .unwrap();

        assert_eq!(summary.folders, 2);
        assert_eq!(summary.numbered, 3);
        assert_eq!(listing(dir.path()), ["disc1", "「01」root.mp3"]);
        assert_eq!(listing(&disc), ["「01」start.mp3", "「02」end.mp3"]);
    }
}
