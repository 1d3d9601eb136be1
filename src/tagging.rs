use lofty::config::WriteOptions;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use std::path::Path;
use tracing::{info, warn};

use crate::config::LibraryConfig;
use crate::error::{Result, OrganizerError};
use crate::organize::{classify_folder, FileEntry};

/// Cover image bytes plus the extension they were read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub extension: String,
}

impl CoverArt {
    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self {
            data: std::fs::read(path)?,
            extension: path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
        })
    }

    fn mime_type(&self) -> MimeType {
        match self.extension.as_str() {
            "jpg" | "jpeg" => MimeType::Jpeg,
            "png" => MimeType::Png,
            other => MimeType::Unknown(format!("image/{}", other)),
        }
    }
}

/// Writes title, album and cover into an audio file
pub trait TagWriter {
    fn write_tags(&self, audio_path: &Path, title: &str, album: &str, cover: Option<&CoverArt>) -> Result<()>;
}

/// Tag writer backed by lofty
pub struct LoftyTagWriter;

impl TagWriter for LoftyTagWriter {
    fn write_tags(&self, audio_path: &Path, title: &str, album: &str, cover: Option<&CoverArt>) -> Result<()> {
        let tag_error = |e: lofty::error::LoftyError| {
            OrganizerError::Tag(format!("{}: {}", audio_path.display(), e))
        };

        let mut tagged_file = Probe::open(audio_path)
            .map_err(tag_error)?
            .read()
            .map_err(tag_error)?;
        let keep_existing_cover = tagged_file.file_type() == FileType::Mp4;

        if tagged_file.primary_tag_mut().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .primary_tag_mut()
            .ok_or_else(|| OrganizerError::Tag(format!("{}: no writable tag", audio_path.display())))?;

        tag.set_title(title.to_string());
        tag.set_album(album.to_string());

        if let Some(cover) = cover {
            let has_cover = tag.pictures().iter().any(|p| p.pic_type() == PictureType::CoverFront);
            // MP4 files keep a cover they already carry
            if !(keep_existing_cover && has_cover) {
                tag.remove_picture_type(PictureType::CoverFront);
                tag.push_picture(Picture::new_unchecked(
                    PictureType::CoverFront,
                    Some(cover.mime_type()),
                    Some("Cover".to_string()),
                    cover.data.clone(),
                ));
            }
        }

        tagged_file
            .save_to_path(audio_path, WriteOptions::default())
            .map_err(tag_error)?;
        Ok(())
    }
}

/// Pick the cover for an audio file.
///
/// Preference: an image with the same stem, then the first image named after
/// one of `cover_names` (in that order), then the first image of the folder.
pub fn find_cover_image<'a>(
    audio: &FileEntry,
    images: &'a [FileEntry],
    cover_names: &[String],
) -> Option<&'a FileEntry> {
    images
        .iter()
        .find(|img| img.stem == audio.stem)
        .or_else(|| {
            cover_names.iter().find_map(|name| {
                images.iter().find(|img| img.stem.to_lowercase() == name.to_lowercase())
            })
        })
        .or_else(|| images.first())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSummary {
    pub tagged: usize,
    pub failed: usize,
}

/// Tag every audio file of one folder.
///
/// Title is the file stem and album is the folder name. Failures are logged
/// per file and never stop the folder.
pub fn tag_folder<W: TagWriter + ?Sized>(folder: &Path, library: &LibraryConfig, writer: &W) -> Result<TagSummary> {
    info!("Updating tags: {}", folder.display());
    let classification = classify_folder(folder, library)?;
    let album = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut summary = TagSummary::default();
    for audio in &classification.audio {
        let cover = match find_cover_image(audio, &classification.images, &library.cover_names) {
            Some(image) => {
                info!("  Using cover: {}", image.file_name());
                match CoverArt::read(&image.path) {
                    Ok(cover) => Some(cover),
                    Err(e) => {
                        warn!("  Cover unreadable: {} - {}", image.file_name(), e);
                        None
                    }
                }
            }
            None => None,
        };

        match writer.write_tags(&audio.path, &audio.stem, &album, cover.as_ref()) {
            Ok(()) => {
                info!("  Tags updated: {}", audio.file_name());
                summary.tagged += 1;
            }
            Err(e) => {
                warn!("  Tag update failed: {} - {}", audio.file_name(), e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
