use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio file not found: {0}")]
    NotFound(PathBuf),
    #[error("wav decode error: {0}")]
    Decode(#[from] hound::Error),
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Decoded call audio: mono samples at the file's native sample rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Read a WAV file into mono f32 samples, keeping the native sample rate.
///
/// Multi-channel sources are downmixed by averaging each frame's channels.
/// Integer formats normalize to [-1, 1] by bit depth.
pub fn read_wav(path: &Path) -> Result<DecodedAudio> {
    if !path.exists() {
        return Err(AudioError::NotFound(path.to_path_buf()));
    }

    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => downmix(reader.samples::<f32>(), channels, 1.0)?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::UnsupportedBitDepth(spec.bits_per_sample));
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            downmix(reader.samples::<i32>().map(|s| s.map(|v| v as f32)), channels, scale)?
        }
    };

    tracing::debug!(
        samples = samples.len(),
        sample_rate = spec.sample_rate,
        channels,
        "decoded wav"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Fold interleaved samples into mono in a single pass, averaging channels.
fn downmix<I>(samples: I, channels: usize, scale: f32) -> Result<Vec<f32>>
where
    I: Iterator<Item = std::result::Result<f32, hound::Error>>,
{
    let mut mono = Vec::new();
    let mut acc = 0.0f32;
    let mut in_frame = 0usize;

    for sample in samples {
        acc += sample? / scale;
        in_frame += 1;
        if in_frame == channels {
            mono.push(acc / channels as f32);
            acc = 0.0;
            in_frame = 0;
        }
    }

    Ok(mono)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_mono_i16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[0, i16::MAX, i16::MIN, 0]);

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples.len(), 4);
        assert!((audio.samples[1] - (i16::MAX as f32 / 32768.0)).abs() < 1e-6);
        assert!((audio.samples[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stereo_downmix_averages_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // Two frames: (1000, 3000) and (-2000, 2000)
        write_wav(&path, spec, &[1000, 3000, -2000, 2000]);

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.samples.len(), 2);
        assert!((audio.samples[0] - 2000.0 / 32768.0).abs() < 1e-6);
        assert!(audio.samples[1].abs() < 1e-6);
    }

    #[test]
    fn test_read_float_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.5, 1.0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.samples, vec![0.25, -0.5, 1.0]);
        assert!((audio.duration_secs() - 3.0 / 44100.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_wav(Path::new("/nonexistent/call.wav")).unwrap_err();
        assert!(matches!(err, AudioError::NotFound(_)));
    }
}
