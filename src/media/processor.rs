use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, OrganizerError};
use super::{MediaCommandBuilder, Transcoder};

/// Concrete transcoder (FFmpeg-based)
pub struct FfmpegTranscoder {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegTranscoder {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn handles(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| {
            let ext = ext.to_string_lossy();
            self.config.transcode_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
        })
    }

    /// Transcode next to the input, then delete the input
    async fn transcode(&self, input_path: &Path) -> Result<PathBuf> {
        let output_path = input_path.with_extension(&self.config.output_extension);
        let name = input_path.file_name().unwrap_or_default().to_string_lossy();

        let command = self.command_builder.transcode(
            input_path,
            output_path.as_path(),
            self.config.compression_level,
        );
        command.execute().await?;

        if !output_path.exists() {
            return Err(OrganizerError::Media(format!("{}: no output file was produced", name)));
        }

        if let Err(e) = tokio::fs::remove_file(input_path).await {
            warn!("Transcoded {} but could not delete the original: {}", name, e);
            return Err(OrganizerError::Io(e));
        }

        info!(
            "Transcoded and removed original: {} -> {}",
            name,
            output_path.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(output_path)
    }

    async fn check_availability(&self) -> Result<String> {
        let stdout = self
            .command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| OrganizerError::Media(format!("{} not usable: {}", self.config.binary_path, e)))?;

        let version = stdout.lines().next().unwrap_or("Unknown version").to_string();
        info!("Media processor is available: {}", version);
        Ok(version)
    }
}
