use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, OrganizerError};

// Default values for optional configuration keys
fn default_min_interval_ms() -> u64 {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    pub media: MediaConfig,
    pub translate: TranslateConfig,
    pub tagging: TaggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root of the collection to preprocess and tag
    pub root_dir: Option<PathBuf>,
    /// Subtree whose file and folder names get translated
    pub translation_dir: Option<PathBuf>,
    /// Audio extensions, lowercase with leading dot
    pub audio_extensions: Vec<String>,
    /// Substrings of a lowercased filename that mark a subtitle
    pub subtitle_markers: Vec<String>,
    /// Image extensions, lowercase with leading dot
    pub image_extensions: Vec<String>,
    /// Image stems treated as a folder-wide cover, in priority order
    pub cover_names: Vec<String>,
    /// Convert WebVTT subtitles to LRC during preprocessing
    #[serde(default = "default_true")]
    pub convert_vtt_to_lrc: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Audio extensions (lowercase, no dot) that get transcoded
    pub transcode_extensions: Vec<String>,
    /// Extension of the transcoded output, without dot
    pub output_extension: String,
    /// FLAC compression level passed to ffmpeg
    pub compression_level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Run the translation pass at all
    pub enabled: bool,
    /// API host, e.g. tmt.tencentcloudapi.com
    pub endpoint: String,
    /// API region
    pub region: String,
    pub source_language: String,
    pub target_language: String,
    pub project_id: i64,
    /// Minimum delay between two successive API calls
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// HTTP timeout per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Opaque credentials for the translation service
    pub credentials: Option<Credentials>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub secret_id: String,
    pub secret_key: String,
}

// Keep secrets out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    /// Run the tag pass at all
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: LibraryConfig::default(),
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                transcode_extensions: vec!["wav".to_string()],
                output_extension: "flac".to_string(),
                compression_level: 12,
            },
            translate: TranslateConfig {
                enabled: true,
                endpoint: "tmt.tencentcloudapi.com".to_string(),
                region: "ap-guangzhou".to_string(),
                source_language: "ja".to_string(),
                target_language: "zh".to_string(),
                project_id: 0,
                min_interval_ms: default_min_interval_ms(),
                timeout_secs: default_timeout_secs(),
                credentials: None,
            },
            tagging: TaggingConfig { enabled: true },
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            root_dir: None,
            translation_dir: None,
            audio_extensions: strings(&[".wav", ".mp3", ".flac", ".m4a"]),
            subtitle_markers: strings(&[".wav.vtt", ".mp3.vtt", ".flac.vtt", ".m4a.vtt", ".vtt", ".lrc"]),
            image_extensions: strings(&[".jpg", ".jpeg", ".png"]),
            cover_names: strings(&["cover", "folder", "front", "album"]),
            convert_vtt_to_lrc: true,
        }
    }
}

impl LibraryConfig {
    /// Whether a lowercased filename ends with one of the audio extensions
    pub fn is_audio_name(&self, lower_name: &str) -> bool {
        self.audio_extensions.iter().any(|ext| lower_name.ends_with(ext.as_str()))
    }

    /// Whether a lowercased filename contains one of the subtitle markers
    pub fn is_subtitle_name(&self, lower_name: &str) -> bool {
        self.subtitle_markers.iter().any(|marker| lower_name.contains(marker.as_str()))
    }

    pub fn is_image_name(&self, lower_name: &str) -> bool {
        self.image_extensions.iter().any(|ext| lower_name.ends_with(ext.as_str()))
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OrganizerError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| OrganizerError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| OrganizerError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| OrganizerError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Root directory, required by the preprocess and tag passes
    pub fn root_dir(&self) -> Result<&Path> {
        let root = self.library.root_dir.as_deref()
            .ok_or_else(|| OrganizerError::Config("library.root_dir is not set".to_string()))?;
        if !root.is_dir() {
            return Err(OrganizerError::FileNotFound(format!("root directory {}", root.display())));
        }
        Ok(root)
    }

    /// Translation directory, required by the translation pass
    pub fn translation_dir(&self) -> Result<&Path> {
        let dir = self.library.translation_dir.as_deref()
            .ok_or_else(|| OrganizerError::Config("library.translation_dir is not set".to_string()))?;
        if !dir.is_dir() {
            return Err(OrganizerError::FileNotFound(format!("translation directory {}", dir.display())));
        }
        Ok(dir)
    }
}
