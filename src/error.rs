use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Tag writing error: {0}")]
    Tag(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Subtitle error: {0}")]
    Subtitle(String),

    #[error("Rename failed: {0}")]
    Rename(String),
}

pub type Result<T> = std::result::Result<T, OrganizerError>;
