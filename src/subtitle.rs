use std::io::Write;
use std::path::{Path, PathBuf};
use encoding_rs::{Encoding, GBK, UTF_8, WINDOWS_1252};
use tracing::info;

use crate::config::LibraryConfig;
use crate::error::{Result, OrganizerError};
use crate::organize::{rename_without_overwrite, strip_suffix_ignore_ascii_case};

/// Encodings tried in order when reading a subtitle
const SUBTITLE_ENCODINGS: [&Encoding; 3] = [UTF_8, GBK, WINDOWS_1252];

/// Collapse a compound `name.<audio>.vtt` into `name.vtt`.
///
/// Returns the path of the WebVTT file after the rename, the unchanged path for
/// a plain `.vtt`, or `None` when the file is not WebVTT at all.
pub fn normalize_subtitle_filename(path: &Path, library: &LibraryConfig) -> Result<Option<PathBuf>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(without_vtt) = strip_suffix_ignore_ascii_case(&name, ".vtt") else {
        return Ok(None);
    };

    let Some(base) = library
        .audio_extensions
        .iter()
        .find_map(|ext| strip_suffix_ignore_ascii_case(without_vtt, ext))
    else {
        return Ok(Some(path.to_path_buf()));
    };

    let new_path = path.with_file_name(format!("{}.vtt", base));
    rename_without_overwrite(path, &new_path).map_err(|e| {
        OrganizerError::Rename(format!("{} -> {}: {}", name, new_path.display(), e))
    })?;

    info!(
        "Subtitle renamed: {} -> {}",
        name,
        new_path.file_name().unwrap_or_default().to_string_lossy()
    );
    Ok(Some(new_path))
}

/// Decode subtitle bytes, falling back through UTF-8, GBK and Windows-1252
pub fn decode_subtitle(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    SUBTITLE_ENCODINGS
        .iter()
        .find_map(|encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned())
        })
        .ok_or_else(|| OrganizerError::Subtitle("unable to decode subtitle text".to_string()))
}

/// Turn a WebVTT cue start time into an LRC time tag.
///
/// Hours fold into minutes and the fraction is cut to centiseconds:
/// `01:02:03.456` becomes `[62:03.45]`.
fn lrc_time_tag(timestamp: &str) -> Result<String> {
    let invalid = || OrganizerError::Subtitle(format!("invalid cue timestamp '{}'", timestamp));
    let number = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());

    let parts: Vec<&str> = timestamp.split(':').collect();
    let (minutes, seconds_part) = match parts.as_slice() {
        [h, m, s] => (number(*h)? * 60 + number(*m)?, *s),
        [m, s] => (number(*m)?, *s),
        _ => return Err(invalid()),
    };

    let (seconds, fraction) = seconds_part.split_once('.').unwrap_or((seconds_part, "000"));
    let seconds = number(seconds)?;
    if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let centis: String = fraction.chars().take(2).collect();

    Ok(format!("[{:02}:{:02}.{}]", minutes, seconds, centis))
}

/// Convert WebVTT text to LRC.
///
/// Headers, notes, blank lines and numeric cue ids are dropped. Every text line
/// of a cue is prefixed with the cue's start tag.
pub fn vtt_to_lrc(content: &str) -> Result<String> {
    let mut lines = Vec::new();
    let mut current_tag: Option<String> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty()
            || line.contains("WEBVTT")
            || line.contains("NOTE")
            || line.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }

        if let Some((start, _)) = line.split_once("-->") {
            current_tag = Some(lrc_time_tag(start.trim())?);
            continue;
        }

        match &current_tag {
            Some(tag) => lines.push(format!("{}{}", tag, line)),
            None => lines.push(line.to_string()),
        }
    }

    Ok(lines.join("\n"))
}

/// Replace a `.vtt` file with an `.lrc` file of the same stem.
///
/// The LRC is written completely before the WebVTT source is removed, so a
/// failure leaves the original in place. An existing `.lrc` is never replaced.
pub fn convert_vtt_to_lrc(vtt_path: &Path) -> Result<PathBuf> {
    let lrc_path = vtt_path.with_extension("lrc");
    let dir = vtt_path
        .parent()
        .ok_or_else(|| OrganizerError::Subtitle(format!("no parent folder for {}", vtt_path.display())))?;

    let bytes = std::fs::read(vtt_path)?;
    let text = decode_subtitle(&bytes)?;
    let lrc = vtt_to_lrc(&text)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(lrc.as_bytes())?;
    staged.persist_noclobber(&lrc_path).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            OrganizerError::Subtitle(format!("{} already exists", lrc_path.display()))
        } else {
            OrganizerError::Io(e.error)
        }
    })?;

    std::fs::remove_file(vtt_path)?;

    info!(
        "Subtitle converted: {} -> {}",
        vtt_path.file_name().unwrap_or_default().to_string_lossy(),
        lrc_path.file_name().unwrap_or_default().to_string_lossy()
    );
    Ok(lrc_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_VTT: &str = "WEBVTT\n\nNOTE made by hand\n\n1\n00:00:01.250 --> 00:00:03.000\nこんにちは\n\n2\n01:02:03.456 --> 01:02:05.000 align:start\nfirst line\nsecond line\n";

    #[test]
    fn test_lrc_time_tag() {
        assert_eq!(lrc_time_tag("00:00:01.250").unwrap(), "[00:01.25]");
        assert_eq!(lrc_time_tag("01:02:03.456").unwrap(), "[62:03.45]");
        assert_eq!(lrc_time_tag("02:05.5").unwrap(), "[02:05.5]");
        assert_eq!(lrc_time_tag("00:00:07").unwrap(), "[00:07.00]");
        assert!(lrc_time_tag("abc").is_err());
    }

    #[test]
    fn test_vtt_to_lrc() {
        let lrc = vtt_to_lrc(SAMPLE_VTT).unwrap();
        assert_eq!(
            lrc,
            "[00:01.25]こんにちは\n[62:03.45]first line\n[62:03.45]second line"
        );
    }

    #[test]
    fn test_vtt_to_lrc_rejects_broken_timing() {
        assert!(vtt_to_lrc("WEBVTT\n\nxx:yy --> 00:01.000\ntext").is_err());
    }

    #[test]
    fn test_decode_falls_back_to_gbk() {
        let (encoded, _, _) = GBK.encode("中文字幕");
        assert!(std::str::from_utf8(&encoded).is_err());
        assert_eq!(decode_subtitle(&encoded).unwrap(), "中文字幕");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        assert_eq!(decode_subtitle(b"\xEF\xBB\xBFWEBVTT").unwrap(), "WEBVTT");
    }

    #[test]
    fn test_normalize_compound_subtitle_name() {
        let dir = tempfile::tempdir().unwrap();
        let library = LibraryConfig::default();
        let source = dir.path().join("interview.MP3.vtt");
        std::fs::write(&source, SAMPLE_VTT).unwrap();

        let renamed = normalize_subtitle_filename(&source, &library).unwrap().unwrap();

        assert_eq!(renamed, dir.path().join("interview.vtt"));
        assert!(renamed.exists());
        assert!(!source.exists());
    }

    #[test]
    fn test_normalize_leaves_plain_files_alone() {
        let library = LibraryConfig::default();
        let plain = Path::new("/w/talk.vtt");
        assert_eq!(
            normalize_subtitle_filename(plain, &library).unwrap(),
            Some(plain.to_path_buf())
        );
        assert_eq!(normalize_subtitle_filename(Path::new("/w/talk.lrc"), &library).unwrap(), None);
    }

    #[test]
    fn test_convert_vtt_to_lrc_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let vtt = dir.path().join("talk.vtt");
        std::fs::write(&vtt, SAMPLE_VTT).unwrap();

        let lrc = convert_vtt_to_lrc(&vtt).unwrap();

        assert_eq!(lrc, dir.path().join("talk.lrc"));
        assert!(!vtt.exists());
        let content = std::fs::read_to_string(&lrc).unwrap();
        assert!(content.starts_with("[00:01.25]こんにちは"));
    }

    #[test]
    fn test_existing_lrc_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let vtt = dir.path().join("talk.vtt");
        let lrc = dir.path().join("talk.lrc");
        std::fs::write(&vtt, SAMPLE_VTT).unwrap();
        std::fs::write(&lrc, "[00:00.00]hand made").unwrap();

        assert!(matches!(convert_vtt_to_lrc(&vtt), Err(OrganizerError::Subtitle(_))));
        assert!(vtt.exists());
        assert_eq!(std::fs::read_to_string(&lrc).unwrap(), "[00:00.00]hand made");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_failed_conversion_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let vtt = dir.path().join("broken.vtt");
        std::fs::write(&vtt, "WEBVTT\n\nnope --> 00:01.000\ntext").unwrap();

        assert!(convert_vtt_to_lrc(&vtt).is_err());
        assert!(vtt.exists());
        assert!(!dir.path().join("broken.lrc").exists());
    }
}
