//! asmr-organizer - ASMR audio and subtitle library organizer
//!
//! Cleans track-number noise out of file names, pairs audio with same-stem
//! subtitles and gives each pair a shared 「NN」 ordinal. Around that core it
//! prepares WebVTT subtitles, transcodes WAV to FLAC with ffmpeg, translates
//! names through Tencent Cloud and writes audio tags.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod organize;
pub mod translate;
pub mod subtitle;
pub mod media;
pub mod tagging;
pub mod error;
