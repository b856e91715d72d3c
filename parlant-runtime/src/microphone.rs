use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use parlant_core::types::AudioFormat;
use parlant_engine::traits::{CaptureStream, Microphone};

/// Upload chunk size for file-backed recordings.
const FILE_CHUNK_BYTES: usize = 64 * 1024;

/// The system microphone through cpal. Recording starts on acquire.
#[derive(Debug, Clone, Default)]
pub struct CpalMicrophone {
    device_name: Option<String>,
}

impl CpalMicrophone {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[cfg(any(windows, target_os = "macos"))]
mod cpal_capture {
    use super::*;
    use parlant_audio::AudioRecorder;

    #[async_trait::async_trait]
    impl Microphone for CpalMicrophone {
        async fn acquire(&self) -> anyhow::Result<Box<dyn CaptureStream>> {
            let name = self.device_name.clone();
            // Opening may block on the OS permission prompt.
            let recorder = tokio::task::spawn_blocking(move || {
                AudioRecorder::open_named(name.as_deref())
            })
            .await
            .context("audio worker panicked")?
            .map_err(|e| {
                log::error!("{}", user_facing_audio_error(&e));
                anyhow::Error::new(e).context("open microphone")
            })?;

            Ok(Box::new(CpalCapture {
                recorder: Some(recorder),
            }))
        }
    }

    struct CpalCapture {
        recorder: Option<AudioRecorder>,
    }

    #[async_trait::async_trait]
    impl CaptureStream for CpalCapture {
        fn format(&self) -> AudioFormat {
            AudioFormat::wav()
        }

        async fn finish(&mut self) -> anyhow::Result<Vec<Vec<u8>>> {
            let recorder = self
                .recorder
                .take()
                .ok_or_else(|| anyhow!("recording already released"))?;

            let (recorder, captured) = tokio::task::spawn_blocking(move || {
                let captured = recorder.stop();
                (recorder, captured)
            })
            .await
            .context("audio worker panicked")?;
            self.recorder = Some(recorder);

            let captured = captured?;
            log::info!(
                "captured {:.1}s of audio at {} Hz",
                captured.duration_secs(),
                captured.sample_rate_hz
            );
            let wav = tokio::task::spawn_blocking(move || captured.to_upload_wav())
                .await
                .context("encoder panicked")??;
            Ok(vec![wav])
        }

        fn release(&mut self) {
            if let Some(mut recorder) = self.recorder.take() {
                recorder.close();
            }
        }
    }

    fn user_facing_audio_error(e: &parlant_audio::AudioCaptureError) -> String {
        let raw = e.to_string().to_lowercase();

        // Keep messages actionable and short; details are in logs.
        if matches!(e, parlant_audio::AudioCaptureError::NoInputDevice) {
            return "No microphone detected. Check your mic and try again.".into();
        }

        if raw.contains("permission") || raw.contains("access") {
            #[cfg(windows)]
            {
                return "Microphone access appears blocked. Check Windows Settings > Privacy & security > Microphone.".into();
            }

            #[cfg(target_os = "macos")]
            {
                return "Microphone access appears blocked. Check System Settings > Privacy & Security > Microphone.".into();
            }
        }

        "Audio recording failed. Check logs for details.".into()
    }

    pub fn list_input_devices() -> Vec<String> {
        AudioRecorder::list_input_device_names().unwrap_or_else(|e| {
            log::warn!("failed to list input devices: {e}");
            vec![]
        })
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
mod cpal_capture {
    use super::*;

    #[async_trait::async_trait]
    impl Microphone for CpalMicrophone {
        async fn acquire(&self) -> anyhow::Result<Box<dyn CaptureStream>> {
            let _ = &self.device_name;
            Err(anyhow!(
                "no input device found: microphone capture is not supported on this platform"
            ))
        }
    }

    pub fn list_input_devices() -> Vec<String> {
        vec![]
    }
}

pub use cpal_capture::list_input_devices;

/// Replays an audio file as if it had just been recorded.
#[derive(Debug, Clone)]
pub struct FileMicrophone {
    path: PathBuf,
}

impl FileMicrophone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl Microphone for FileMicrophone {
    async fn acquire(&self) -> anyhow::Result<Box<dyn CaptureStream>> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .with_context(|| format!("open recording: {}", self.path.display()))?;
        if !meta.is_file() {
            return Err(anyhow!("not a file: {}", self.path.display()));
        }

        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        Ok(Box::new(FileCapture {
            path: self.path.clone(),
            format: AudioFormat::from_extension(ext),
            released: false,
        }))
    }
}

struct FileCapture {
    path: PathBuf,
    format: AudioFormat,
    released: bool,
}

#[async_trait::async_trait]
impl CaptureStream for FileCapture {
    fn format(&self) -> AudioFormat {
        self.format.clone()
    }

    async fn finish(&mut self) -> anyhow::Result<Vec<Vec<u8>>> {
        if self.released {
            return Err(anyhow!("recording already released"));
        }
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("read recording: {}", self.path.display()))?;
        Ok(bytes.chunks(FILE_CHUNK_BYTES).map(<[u8]>::to_vec).collect())
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            log::debug!("file capture released: {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_microphone_chunks_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.webm");
        let data: Vec<u8> = (0..(FILE_CHUNK_BYTES + 10)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let mut capture = FileMicrophone::new(&path).acquire().await.unwrap();
        assert_eq!(capture.format(), AudioFormat::new("webm", "audio/webm"));

        let chunks = capture.finish().await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), data);

        capture.release();
        capture.release();
        assert!(capture.finish().await.is_err());
    }

    #[tokio::test]
    async fn missing_file_fails_acquire() {
        let dir = tempfile::tempdir().unwrap();
        let mic = FileMicrophone::new(dir.path().join("nope.wav"));
        assert!(mic.acquire().await.is_err());
        assert!(FileMicrophone::new(dir.path()).acquire().await.is_err());
    }
}
