use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, OrganizerError};
use crate::media::{Transcoder, TranscoderFactory};
use crate::organize::{FolderProcessor, TreeSummary};
use crate::tagging::{tag_folder, LoftyTagWriter, TagSummary, TagWriter};
use crate::translate::{TranslationPass, TranslationSummary, Translator, TranslatorFactory};

pub struct Workflow {
    config: Config,
    transcoder: Box<dyn Transcoder>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let transcoder = TranscoderFactory::create_transcoder(config.media.clone());
        Self { config, transcoder }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn transcoding_enabled(&self) -> bool {
        !self.config.media.transcode_extensions.is_empty()
    }

    fn translation_requested(&self) -> bool {
        self.config.translate.enabled && self.config.library.translation_dir.is_some()
    }

    /// The transcoder when transcoding is enabled, after checking ffmpeg can run
    async fn usable_transcoder(&self) -> Result<Option<&dyn Transcoder>> {
        if !self.transcoding_enabled() {
            return Ok(None);
        }
        self.transcoder.check_availability().await?;
        Ok(Some(self.transcoder.as_ref()))
    }

    /// Normalize subtitles, transcode and number every folder under the root
    pub async fn preprocess(&self) -> Result<TreeSummary> {
        let root = self.config.root_dir()?;
        let transcoder = self.usable_transcoder().await?;
        self.preprocess_with(root, transcoder).await
    }

    async fn preprocess_with(&self, root: &Path, transcoder: Option<&dyn Transcoder>) -> Result<TreeSummary> {
        info!("Preprocessing: {}", root.display());
        FolderProcessor::new(&self.config.library, transcoder)
            .process_tree(root)
            .await
    }

    /// Translate file names, then folder names, below the translation directory
    pub async fn translate(&self) -> Result<TranslationSummary> {
        let dir = self.config.translation_dir()?;
        let translator = TranslatorFactory::create_translator(self.config.translate.clone())?;
        self.translate_with(dir, translator.as_ref()).await
    }

    async fn translate_with(&self, dir: &Path, translator: &dyn Translator) -> Result<TranslationSummary> {
        info!("Translating names: {}", dir.display());
        let summary = TranslationPass::new(translator, &self.config.library)
            .run(dir)
            .await?;

        info!(
            "Translation finished: {} files, {} folders renamed, {} skipped",
            summary.files_renamed, summary.dirs_renamed, summary.skipped
        );
        Ok(summary)
    }

    /// Write title, album and cover tags into every audio file under the root
    pub fn tag(&self) -> Result<TagSummary> {
        let root = self.config.root_dir()?;
        info!("Tagging: {}", root.display());
        tag_tree(root, &self.config, &LoftyTagWriter)
    }

    /// Preprocess, translate when configured, then tag.
    ///
    /// Every fatal condition is checked before the first file is renamed.
    pub async fn run(&self) -> Result<()> {
        let root = self.config.root_dir()?;
        let translation = if self.translation_requested() {
            let dir = self.config.translation_dir()?;
            let translator = TranslatorFactory::create_translator(self.config.translate.clone())?;
            Some((dir, translator))
        } else {
            info!("Translation pass skipped");
            None
        };
        let transcoder = self.usable_transcoder().await?;

        self.preprocess_with(root, transcoder).await?;

        if let Some((dir, translator)) = &translation {
            self.translate_with(dir, translator.as_ref()).await?;
        }

        if self.config.tagging.enabled {
            self.tag()?;
        } else {
            info!("Tag pass skipped");
        }

        info!("All passes completed");
        Ok(())
    }
}

fn tag_tree<W: TagWriter + ?Sized>(root: &Path, config: &Config, writer: &W) -> Result<TagSummary> {
    if !root.is_dir() {
        return Err(OrganizerError::FileNotFound(root.display().to_string()));
    }

    let folders: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();

    let progress = ProgressBar::new(folders.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
        progress.set_style(style.progress_chars("#>-"));
    }

    let mut total = TagSummary::default();
    for folder in &folders {
        progress.set_message(folder.file_name().unwrap_or_default().to_string_lossy().into_owned());
        match tag_folder(folder, &config.library, writer) {
            Ok(summary) => {
                total.tagged += summary.tagged;
                total.failed += summary.failed;
            }
            Err(e) => warn!("Folder skipped: {} - {}", folder.display(), e),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!("Tagging finished: {} tagged, {} failed", total.tagged, total.failed);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_root(root: &Path) -> Config {
        let mut config = Config::default();
        config.library.root_dir = Some(root.to_path_buf());
        config.media.transcode_extensions.clear();
        config
    }

    #[tokio::test]
    async fn test_preprocess_requires_root() {
        let workflow = Workflow::new(Config::default());
        assert!(matches!(workflow.preprocess().await, Err(OrganizerError::Config(_))));
    }

    #[tokio::test]
    async fn test_preprocess_fails_when_ffmpeg_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.library.root_dir = Some(dir.path().to_path_buf());
        config.media.binary_path = "/nonexistent/ffmpeg-binary".to_string();

        let workflow = Workflow::new(config);
        assert!(workflow.preprocess().await.is_err());
    }

    #[tokio::test]
    async fn test_preprocess_without_transcoding_numbers_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("02 b.mp3"), b"b").unwrap();
        std::fs::write(dir.path().join("01 a.mp3"), b"a").unwrap();

        let workflow = Workflow::new(config_with_root(dir.path()));
        let summary = workflow.preprocess().await.unwrap();

        assert_eq!(summary.numbered, 2);
        assert!(dir.path().join("「01」a.mp3").exists());
        assert!(dir.path().join("「02」b.mp3").exists());
    }

    #[tokio::test]
    async fn test_translate_requires_translation_dir() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::new(config_with_root(dir.path()));
        assert!(matches!(workflow.translate().await, Err(OrganizerError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_skips_translation_when_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("01 a.mp3"), b"not really audio").unwrap();

        let workflow = Workflow::new(config_with_root(dir.path()));
        // tagging the fake mp3 fails per file, which never aborts the run
        workflow.run().await.unwrap();

        assert!(dir.path().join("「01」a.mp3").exists());
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_run_checks_translation_dir_before_renaming() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("02 b.mp3"), b"b").unwrap();

        let mut config = config_with_root(dir.path());
        config.library.translation_dir = Some(dir.path().join("missing-jp"));
        let result = Workflow::new(config).run().await;

        assert!(matches!(result, Err(OrganizerError::FileNotFound(_))));
        assert_eq!(listing(dir.path()), ["02 b.mp3"]);
    }

    #[tokio::test]
    async fn test_run_checks_credentials_before_renaming() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("jp")).unwrap();
        std::fs::write(dir.path().join("02 b.mp3"), b"b").unwrap();

        let mut config = config_with_root(dir.path());
        config.library.translation_dir = Some(dir.path().join("jp"));
        config.translate.credentials = None;
        let result = Workflow::new(config).run().await;

        assert!(matches!(result, Err(OrganizerError::Config(_))));
        assert_eq!(listing(dir.path()), ["02 b.mp3", "jp"]);
    }

    #[tokio::test]
    async fn test_run_checks_ffmpeg_before_renaming() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("02 b.mp3"), b"b").unwrap();

        let mut config = Config::default();
        config.library.root_dir = Some(dir.path().to_path_buf());
        config.media.binary_path = "/nonexistent/ffmpeg-binary".to_string();
        let result = Workflow::new(config).run().await;

        assert!(matches!(result, Err(OrganizerError::Media(_))));
        assert_eq!(listing(dir.path()), ["02 b.mp3"]);
    }

    #[test]
    fn test_tag_tree_visits_nested_folders() {
        struct CountingWriter(std::cell::Cell<usize>);
        impl TagWriter for CountingWriter {
            fn write_tags(&self, _: &Path, _: &str, _: &str, _: Option<&crate::tagging::CoverArt>) -> Result<()> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("disc2")).unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("disc2").join("b.flac"), b"").unwrap();
        std::fs::write(dir.path().join("disc2").join("b.lrc"), b"").unwrap();

        let config = config_with_root(dir.path());
        let writer = CountingWriter(std::cell::Cell::new(0));
        let summary = tag_tree(dir.path(), &config, &writer).unwrap();

        assert_eq!(summary, TagSummary { tagged: 2, failed: 0 });
        assert_eq!(writer.0.get(), 2);
    }
}
