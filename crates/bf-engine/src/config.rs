//! Engine configuration
//!
//! A plaintext key/value file read once at startup, one `key value` pair per
//! line, `#` comments and blank lines skipped. Every key has a declared type
//! and default; unknown keys warn rather than error, so configs written for
//! newer builds stay usable.

use std::path::{Path, PathBuf};

use bf_core::Sample;

use crate::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Samples per processed block.
    pub block_size: usize,
    /// Directional BRIR length in samples.
    pub filter_size: usize,
    /// Path to the filter-list index.
    pub filter_list: PathBuf,
    /// Crossfade filter swaps over one block.
    pub enable_crossfading: bool,
    /// Run the stereo mix through a headphone compensation filter.
    pub use_headphone_filter: bool,
    /// Headphone compensation filter length in samples.
    pub headphone_filter_size: usize,
    /// Split filters into an early direction-dependent part and a shared
    /// late-reverb tail.
    pub use_splitted_filters: bool,
    /// Late-reverb tail length in samples (when splitting).
    pub late_reverb_size: usize,
    /// Source directivity filter length in samples; 0 disables directivity.
    pub directivity_size: usize,
    /// Output gain ("loudness factor").
    pub loudness_factor: Sample,
    /// Number of virtual source channels served.
    pub max_channels: usize,
    /// Sampling rate the filters were measured at.
    pub sampling_rate: u32,
    /// Accepted for config-file compatibility; no playback path here.
    pub loop_sound: bool,
    /// Accepted for config-file compatibility; no playback path here.
    pub soundfile: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_size: 256,
            filter_size: 16384,
            filter_list: PathBuf::from("brirs/filter_list.txt"),
            enable_crossfading: false,
            use_headphone_filter: false,
            headphone_filter_size: 16384,
            use_splitted_filters: false,
            late_reverb_size: 0,
            directivity_size: 0,
            loudness_factor: 1.0,
            max_channels: 8,
            sampling_rate: 44100,
            loop_sound: true,
            soundfile: String::new(),
        }
    }
}

impl EngineConfig {
    /// Read a configuration file, starting from the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;

        let mut config = Self::default();
        for (idx, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let key = tokens.next().unwrap_or_default();
            let value = tokens.next().ok_or_else(|| {
                EngineError::Config(format!("line {}: key `{key}` has no value", idx + 1))
            })?;

            config.apply(key, value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply one key/value pair according to the schema.
    fn apply(&mut self, key: &str, value: &str) -> EngineResult<()> {
        match key {
            "blockSize" => self.block_size = parse_int(key, value)?,
            "filterSize" => self.filter_size = parse_int(key, value)?,
            "filterList" => self.filter_list = PathBuf::from(value),
            "enableCrossfading" => self.enable_crossfading = parse_bool(key, value)?,
            "useHeadphoneFilter" => self.use_headphone_filter = parse_bool(key, value)?,
            "headphoneFilterSize" => self.headphone_filter_size = parse_int(key, value)?,
            "useSplittedFilters" => self.use_splitted_filters = parse_bool(key, value)?,
            "lateReverbSize" => self.late_reverb_size = parse_int(key, value)?,
            "directivitySize" => self.directivity_size = parse_int(key, value)?,
            "loudnessFactor" => {
                self.loudness_factor = value.parse().map_err(|_| {
                    EngineError::Config(format!("key `{key}`: invalid float `{value}`"))
                })?;
            }
            "maxChannels" => self.max_channels = parse_int(key, value)?,
            "samplingRate" => {
                self.sampling_rate = value.parse().map_err(|_| {
                    EngineError::Config(format!("key `{key}`: invalid integer `{value}`"))
                })?;
            }
            "loopSound" => self.loop_sound = parse_bool(key, value)?,
            "soundfile" => self.soundfile = value.to_string(),
            _ => log::warn!("Config entry `{key}` is unknown"),
        }
        Ok(())
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.block_size < 2 {
            return Err(EngineError::Config(format!(
                "blockSize must be at least 2, got {}",
                self.block_size
            )));
        }
        if self.filter_size < self.block_size {
            return Err(EngineError::Config(format!(
                "filterSize {} is smaller than blockSize {}",
                self.filter_size, self.block_size
            )));
        }
        if self.max_channels == 0 {
            return Err(EngineError::Config("maxChannels must be at least 1".into()));
        }
        if self.use_splitted_filters && self.late_reverb_size < self.block_size {
            return Err(EngineError::Config(format!(
                "useSplittedFilters requires lateReverbSize >= blockSize, got {}",
                self.late_reverb_size
            )));
        }
        if self.use_headphone_filter && self.headphone_filter_size < self.block_size {
            return Err(EngineError::Config(format!(
                "useHeadphoneFilter requires headphoneFilterSize >= blockSize, got {}",
                self.headphone_filter_size
            )));
        }
        Ok(())
    }

    /// Late-reverb samples appended to each directional convolver.
    #[inline]
    pub fn convolver_late_size(&self) -> usize {
        if self.use_splitted_filters {
            self.late_reverb_size
        } else {
            0
        }
    }
}

fn parse_int(key: &str, value: &str) -> EngineResult<usize> {
    value
        .parse()
        .map_err(|_| EngineError::Config(format!("key `{key}`: invalid integer `{value}`")))
}

/// The original config dialect writes Python-style `True`/`False`;
/// lowercase is accepted as well.
fn parse_bool(key: &str, value: &str) -> EngineResult<bool> {
    match value {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        _ => Err(EngineError::Config(format!(
            "key `{key}`: cannot convert `{value}` to bool"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let (_dir, path) = write_config("");
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.block_size, 256);
        assert_eq!(config.filter_size, 16384);
        assert_eq!(config.max_channels, 8);
        assert!(!config.enable_crossfading);
        assert_eq!(config.loudness_factor, 1.0);
    }

    #[test]
    fn test_typed_parsing() {
        let (_dir, path) = write_config(
            "blockSize 128\n\
             filterSize 4096\n\
             enableCrossfading True\n\
             loudnessFactor 0.5\n\
             filterList some/list.txt\n\
             maxChannels 4\n",
        );
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.block_size, 128);
        assert_eq!(config.filter_size, 4096);
        assert!(config.enable_crossfading);
        assert_eq!(config.loudness_factor, 0.5);
        assert_eq!(config.filter_list, PathBuf::from("some/list.txt"));
        assert_eq!(config.max_channels, 4);
    }

    #[test]
    fn test_unknown_key_is_tolerated() {
        let (_dir, path) = write_config("futureOption 42\nblockSize 64\n");
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.block_size, 64);
    }

    #[test]
    fn test_malformed_value_is_error() {
        let (_dir, path) = write_config("blockSize many\n");
        assert!(matches!(
            EngineConfig::from_file(&path),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_bad_bool_is_error() {
        let (_dir, path) = write_config("enableCrossfading yes\n");
        assert!(matches!(
            EngineConfig::from_file(&path),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_validation_rejects_tiny_block() {
        let (_dir, path) = write_config("blockSize 1\n");
        assert!(matches!(
            EngineConfig::from_file(&path),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_splitting_requires_tail_size() {
        let (_dir, path) = write_config("useSplittedFilters True\n");
        assert!(matches!(
            EngineConfig::from_file(&path),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let (_dir, path) = write_config("# a comment\n\nblockSize 32\n");
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.block_size, 32);
    }
}
