//! Configuration for the external tool adapters.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::Domain;

/// Locations of the external tools and their time limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to the LibreOffice binary.
    #[serde(default = "default_soffice_path")]
    pub soffice_path: PathBuf,

    /// Path to ImageMagick 7 `magick`.
    #[serde(default = "default_magick_path")]
    pub magick_path: PathBuf,

    #[serde(default = "default_pdftotext_path")]
    pub pdftotext_path: PathBuf,

    /// Path to Calibre's `ebook-convert`.
    #[serde(default = "default_ebook_convert_path")]
    pub ebook_convert_path: PathBuf,

    #[serde(default = "default_gifsicle_path")]
    pub gifsicle_path: PathBuf,

    /// Python 3 interpreter, used for CSV to JSON.
    #[serde(default = "default_python_path")]
    pub python_path: PathBuf,

    #[serde(default = "default_unzip_path")]
    pub unzip_path: PathBuf,

    #[serde(default = "default_unrar_path")]
    pub unrar_path: PathBuf,

    #[serde(default = "default_seven_zip_path")]
    pub seven_zip_path: PathBuf,

    #[serde(default = "default_zip_path")]
    pub zip_path: PathBuf,

    /// ffmpeg `-loglevel`. Must stay verbose enough for error classification.
    #[serde(default = "default_ffmpeg_log_level")]
    pub ffmpeg_log_level: String,

    /// Timeout for image, audio, document and table operations.
    #[serde(default = "default_standard_timeout")]
    pub standard_timeout_secs: u64,

    /// Timeout for video and archive operations.
    #[serde(default = "default_extended_timeout")]
    pub extended_timeout_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_soffice_path() -> PathBuf {
    PathBuf::from("soffice")
}

fn default_magick_path() -> PathBuf {
    PathBuf::from("magick")
}

fn default_pdftotext_path() -> PathBuf {
    PathBuf::from("pdftotext")
}

fn default_ebook_convert_path() -> PathBuf {
    PathBuf::from("ebook-convert")
}

fn default_gifsicle_path() -> PathBuf {
    PathBuf::from("gifsicle")
}

fn default_python_path() -> PathBuf {
    PathBuf::from("python3")
}

fn default_unzip_path() -> PathBuf {
    PathBuf::from("unzip")
}

fn default_unrar_path() -> PathBuf {
    PathBuf::from("unrar")
}

fn default_seven_zip_path() -> PathBuf {
    PathBuf::from("7z")
}

fn default_zip_path() -> PathBuf {
    PathBuf::from("zip")
}

fn default_ffmpeg_log_level() -> String {
    "error".to_string()
}

fn default_standard_timeout() -> u64 {
    300
}

fn default_extended_timeout() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            soffice_path: default_soffice_path(),
            magick_path: default_magick_path(),
            pdftotext_path: default_pdftotext_path(),
            ebook_convert_path: default_ebook_convert_path(),
            gifsicle_path: default_gifsicle_path(),
            python_path: default_python_path(),
            unzip_path: default_unzip_path(),
            unrar_path: default_unrar_path(),
            seven_zip_path: default_seven_zip_path(),
            zip_path: default_zip_path(),
            ffmpeg_log_level: default_ffmpeg_log_level(),
            standard_timeout_secs: default_standard_timeout(),
            extended_timeout_secs: default_extended_timeout(),
        }
    }
}

impl ToolsConfig {
    /// Wall-clock limit for one invocation in `domain`.
    pub fn timeout_for(&self, domain: Domain) -> Duration {
        if domain.uses_extended_timeout() {
            Duration::from_secs(self.extended_timeout_secs)
        } else {
            Duration::from_secs(self.standard_timeout_secs)
        }
    }

    /// Sets both timeouts.
    pub fn with_timeouts(mut self, standard_secs: u64, extended_secs: u64) -> Self {
        self.standard_timeout_secs = standard_secs;
        self.extended_timeout_secs = extended_secs;
        self
    }

    /// Sets the ffmpeg path.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Sets the ImageMagick path.
    pub fn with_magick_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.magick_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToolsConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.seven_zip_path, PathBuf::from("7z"));
        assert_eq!(config.standard_timeout_secs, 300);
        assert_eq!(config.extended_timeout_secs, 600);
    }

    #[test]
    fn test_timeout_policy() {
        let config = ToolsConfig::default();
        assert_eq!(config.timeout_for(Domain::Image), Duration::from_secs(300));
        assert_eq!(config.timeout_for(Domain::Table), Duration::from_secs(300));
        assert_eq!(config.timeout_for(Domain::Video), Duration::from_secs(600));
        assert_eq!(config.timeout_for(Domain::Archive), Duration::from_secs(600));
    }

    #[test]
    fn test_config_builder() {
        let config = ToolsConfig::default()
            .with_ffmpeg_path("/opt/ffmpeg")
            .with_timeouts(10, 20);
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg"));
        assert_eq!(config.timeout_for(Domain::Audio), Duration::from_secs(10));
        assert_eq!(config.timeout_for(Domain::Video), Duration::from_secs(20));
    }
}
