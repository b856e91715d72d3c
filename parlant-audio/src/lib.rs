pub mod resample;
pub mod wav;

// Capture is only wired up behind OS-specific backends.
#[cfg(any(windows, target_os = "macos"))]
pub mod recorder;

#[cfg(any(windows, target_os = "macos"))]
pub use recorder::{AudioCaptureError, AudioRecorder};

/// Mono samples at a known rate, as handed back by a stopped recording.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl CapturedAudio {
    /// Upload rate; keeps request bodies small and is what speech backends expect.
    pub const UPLOAD_RATE_HZ: u32 = 16_000;

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate_hz as f32
    }

    /// Resamples to 16 kHz and encodes as 16-bit PCM WAV.
    pub fn to_upload_wav(&self) -> anyhow::Result<Vec<u8>> {
        let samples =
            resample::resample_mono_f32(&self.samples, self.sample_rate_hz, Self::UPLOAD_RATE_HZ)?;
        Ok(wav::encode_wav_mono_i16(&samples, Self::UPLOAD_RATE_HZ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_sample_count() {
        let a = CapturedAudio {
            sample_rate_hz: 16_000,
            samples: vec![0.0; 8_000],
        };
        approx::assert_relative_eq!(a.duration_secs(), 0.5);
    }

    #[test]
    fn upload_wav_at_native_rate_skips_resampling() {
        let a = CapturedAudio {
            sample_rate_hz: 16_000,
            samples: vec![0.0; 160],
        };
        let wav = a.to_upload_wav().unwrap();
        assert_eq!(wav.len(), 44 + 160 * 2);
    }
}
