//
// CPAL microphone capture.
//
// Supported platforms:
// - Windows
// - macOS
//
// The stream lives on a dedicated worker thread; the recorder talks to it over
// channels so the handle itself stays `Send`.

use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Sample, SampleFormat, SizedSample, Stream};

use crate::CapturedAudio;

#[derive(Debug, thiserror::Error)]
pub enum AudioCaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("failed to list input devices: {0}")]
    ListDevices(#[from] cpal::DevicesError),

    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio worker failed: {0}")]
    Worker(String),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("recording already released")]
    Released,
}

enum Cmd {
    Stop(mpsc::Sender<Vec<f32>>),
    Shutdown,
}

enum WorkerMsg {
    Ready,
    Error(String),
}

/// A running recording. Capture starts as soon as the recorder is opened.
pub struct AudioRecorder {
    cmd_tx: mpsc::Sender<Cmd>,
    worker_handle: Option<std::thread::JoinHandle<()>>,
    sample_rate_hz: u32,
}

impl AudioRecorder {
    pub fn list_input_device_names() -> Result<Vec<String>, AudioCaptureError> {
        let host = cpal::default_host();
        let mut out = Vec::new();
        for dev in host.input_devices()? {
            if let Ok(name) = dev.name() {
                out.push(name);
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Opens the named device, falling back to the system default when it is missing.
    pub fn open_named(device_name: Option<&str>) -> Result<Self, AudioCaptureError> {
        let host = cpal::default_host();

        if let Some(needle) = device_name.map(str::trim).filter(|n| !n.is_empty()) {
            if let Ok(devices) = host.input_devices() {
                for dev in devices {
                    if dev.name().map(|name| name == needle).unwrap_or(false) {
                        log::info!("Using input device: {needle}");
                        return Self::open(dev);
                    }
                }
            }
            log::warn!("Preferred input device not found, falling back to default: {needle}");
        }

        let device = host
            .default_input_device()
            .ok_or(AudioCaptureError::NoInputDevice)?;
        Self::open(device)
    }

    fn open(device: Device) -> Result<Self, AudioCaptureError> {
        let default_cfg = device.default_input_config()?;
        let sample_rate_hz = default_cfg.sample_rate().0;

        let (sample_tx, sample_rx) = mpsc::channel::<Vec<f32>>();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();

        let worker_handle = std::thread::spawn(move || {
            let config: cpal::StreamConfig = default_cfg.clone().into();
            let channels = default_cfg.channels() as usize;

            let stream = match default_cfg.sample_format() {
                SampleFormat::I16 => build_input_stream::<i16>(&device, &config, channels, sample_tx),
                SampleFormat::U16 => build_input_stream::<u16>(&device, &config, channels, sample_tx),
                SampleFormat::I32 => build_input_stream::<i32>(&device, &config, channels, sample_tx),
                _ => build_input_stream::<f32>(&device, &config, channels, sample_tx),
            };

            let stream = match stream.map_err(AudioCaptureError::from).and_then(|s| {
                s.play()?;
                Ok(s)
            }) {
                Ok(s) => s,
                Err(e) => {
                    log::error!("Audio stream start failed: {e}");
                    let _ = worker_tx.send(WorkerMsg::Error(e.to_string()));
                    return;
                }
            };

            let _ = worker_tx.send(WorkerMsg::Ready);

            run_consumer(sample_rx, cmd_rx);
            // Dropping the stream stops the device.
            drop(stream);
        });

        // Block briefly until the worker has either started the stream or failed.
        match worker_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(WorkerMsg::Ready) => {}
            Ok(WorkerMsg::Error(e)) => return Err(AudioCaptureError::Worker(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(AudioCaptureError::WorkerTimeout),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(AudioCaptureError::Worker("worker exited".into()));
            }
        }

        Ok(Self {
            cmd_tx,
            worker_handle: Some(worker_handle),
            sample_rate_hz,
        })
    }

    /// Stops accepting samples and returns everything captured since open.
    pub fn stop(&self) -> Result<CapturedAudio, AudioCaptureError> {
        let (resp_tx, resp_rx) = mpsc::channel();
        self.cmd_tx
            .send(Cmd::Stop(resp_tx))
            .map_err(|_| AudioCaptureError::Released)?;

        let samples = resp_rx
            .recv_timeout(Duration::from_secs(3))
            .map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => AudioCaptureError::StopTimeout,
                mpsc::RecvTimeoutError::Disconnected => AudioCaptureError::Released,
            })?;

        Ok(CapturedAudio {
            sample_rate_hz: self.sample_rate_hz,
            samples,
        })
    }

    /// Releases the device. Safe to call more than once.
    pub fn close(&mut self) {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
        if let Some(h) = self.worker_handle.take() {
            let _ = h.join();
            log::debug!("microphone released");
        }
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sample_tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let cb = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let mono: Vec<f32> = if channels <= 1 {
            data.iter().map(|&s| s.to_sample::<f32>()).collect()
        } else {
            data.chunks_exact(channels)
                .map(|frame| {
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
                })
                .collect()
        };
        let _ = sample_tx.send(mono);
    };

    device.build_input_stream(
        config,
        cb,
        |err| {
            // Crucial for debugging "recording started but silent".
            log::error!("Audio stream error: {err}");
        },
        None,
    )
}

fn run_consumer(sample_rx: mpsc::Receiver<Vec<f32>>, cmd_rx: mpsc::Receiver<Cmd>) {
    let mut accepting = true;
    let mut captured: Vec<f32> = Vec::new();

    loop {
        // Always drain commands promptly, even if the stream is stalled.
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                Cmd::Stop(resp) => {
                    // Take whatever is already queued, then stop accepting.
                    while let Ok(samples) = sample_rx.try_recv() {
                        if accepting {
                            captured.extend_from_slice(&samples);
                        }
                    }
                    accepting = false;
                    let _ = resp.send(std::mem::take(&mut captured));
                }
                Cmd::Shutdown => return,
            }
        }

        match sample_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(samples) => {
                if accepting {
                    captured.extend_from_slice(&samples);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}
