// Media processing through an external ffmpeg process
//
// - Commands: ffmpeg command builders
// - Processor: the ffmpeg-backed transcoder

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Converts audio files into the library's target format
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Whether `path` should be transcoded at all
    fn handles(&self, path: &Path) -> bool;

    /// Transcode `input_path` and return the path of the new file.
    /// The input is removed on success.
    async fn transcode(&self, input_path: &Path) -> Result<PathBuf>;

    /// Verify the external tool can be executed, returning its version line
    async fn check_availability(&self) -> Result<String>;
}

/// Factory for creating transcoder instances
pub struct TranscoderFactory;

impl TranscoderFactory {
    /// Create the default transcoder implementation (FFmpeg-based)
    pub fn create_transcoder(config: MediaConfig) -> Box<dyn Transcoder> {
        Box::new(processor::FfmpegTranscoder::new(config))
    }
}
