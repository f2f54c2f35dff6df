//! Impulse-response WAV decoding

use std::path::Path;

use bf_core::Sample;

use crate::{FileError, FileResult};

/// Decoded impulse response: interleaved f32 stereo frames.
#[derive(Debug, Clone)]
pub struct IrData {
    /// Interleaved samples, `[l0, r0, l1, r1, ...]`.
    pub samples: Vec<Sample>,
    pub sample_rate: u32,
}

impl IrData {
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Truncate or zero-extend to `target_frames`, warning on either
    /// adjustment.
    pub fn fit_length(&mut self, target_frames: usize, label: &str) {
        let frames = self.frames();
        if frames > target_frames {
            log::warn!("{label}: filter too long ({frames} > {target_frames} frames), truncating");
            self.samples.truncate(target_frames * 2);
        } else if frames < target_frames {
            log::warn!(
                "{label}: filter too short ({frames} < {target_frames} frames), zero-padding"
            );
            self.samples.resize(target_frames * 2, 0.0);
        }
    }
}

/// Read a WAV file as a stereo impulse response.
///
/// Integer formats are normalized to [-1, 1); mono files are expanded to
/// stereo by duplicating the channel; more than two channels is an error.
pub fn read_ir<P: AsRef<Path>>(path: P) -> FileResult<IrData> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FileError::NotFound(path.display().to_string()));
    }

    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.channels > 2 {
        return Err(FileError::ChannelCount {
            path: path.display().to_string(),
            channels: spec.channels,
        });
    }

    let decoded: Vec<Sample> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.unwrap_or(0.0))
            .collect(),
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as Sample;
            reader
                .into_samples::<i32>()
                .map(|s| s.unwrap_or(0) as Sample / max_value)
                .collect()
        }
    };

    let samples = if spec.channels == 1 {
        decoded.iter().flat_map(|&s| [s, s]).collect()
    } else {
        decoded
    };

    Ok(IrData {
        samples,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, samples: &[f32]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_stereo_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ir.wav");
        write_wav(&path, 2, &[1.0, 0.0, 0.5, -0.5]);

        let ir = read_ir(&path).unwrap();
        assert_eq!(ir.frames(), 2);
        assert_eq!(ir.samples, vec![1.0, 0.0, 0.5, -0.5]);
        assert_eq!(ir.sample_rate, 44100);
    }

    #[test]
    fn test_mono_expands_to_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0.25, -0.75]);

        let ir = read_ir(&path).unwrap();
        assert_eq!(ir.samples, vec![0.25, 0.25, -0.75, -0.75]);
    }

    #[test]
    fn test_int16_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("int.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [16384i16, -16384, 0, 32767] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let ir = read_ir(&path).unwrap();
        assert!((ir.samples[0] - 0.5).abs() < 1e-4);
        assert!((ir.samples[1] + 0.5).abs() < 1e-4);
        assert_eq!(ir.samples[2], 0.0);
        assert!((ir.samples[3] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(matches!(
            read_ir("/nonexistent/ir.wav"),
            Err(FileError::NotFound(_))
        ));
    }

    #[test]
    fn test_fit_length_truncates_and_extends() {
        let mut ir = IrData {
            samples: vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0],
            sample_rate: 44100,
        };
        ir.fit_length(2, "test");
        assert_eq!(ir.frames(), 2);
        assert_eq!(ir.samples, vec![1.0, 1.0, 2.0, 2.0]);

        ir.fit_length(4, "test");
        assert_eq!(ir.frames(), 4);
        assert_eq!(&ir.samples[4..], &[0.0, 0.0, 0.0, 0.0]);
    }
}
