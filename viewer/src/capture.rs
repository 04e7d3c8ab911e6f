use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use ansicam_core::config::CaptureConfig;
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};

/// One RGB24 frame as ffmpeg produced it.
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Live frame source: an ffmpeg child decoding to raw RGB24, drained by a
/// background thread.
pub struct Capture {
    child: FfmpegChild,
    frames: Receiver<VideoFrame>,
    reader: Option<JoinHandle<()>>,
}

impl Capture {
    pub fn open(config: &CaptureConfig) -> anyhow::Result<Self> {
        let mut command = FfmpegCommand::new();

        if let Some(format) = config.input_format() {
            command.format(format);
        }
        if config.is_device() {
            command
                .arg("-video_size")
                .arg(format!("{}x{}", config.width, config.height))
                .arg("-framerate")
                .arg(config.fps.to_string());
        } else {
            // pace files at their native rate instead of decoding flat out
            command.arg("-re");
        }
        command.input(&config.input).rawvideo();

        log::info!(
            "starting capture from {} (format {})",
            config.input,
            config.input_format().unwrap_or("auto")
        );
        let mut child = command
            .spawn()
            .context("failed to spawn ffmpeg (is it installed?)")?;
        let events = child.iter().context("failed to iterate ffmpeg events")?;

        let (tx, rx) = mpsc::sync_channel(1);
        let reader = thread::Builder::new()
            .name("capture".into())
            .spawn(move || forward_frames(events, tx))
            .context("failed to start capture thread")?;

        Ok(Self {
            child,
            frames: rx,
            reader: Some(reader),
        })
    }

    /// Wait up to `timeout` for the next frame. `Ok(None)` means none arrived yet.
    pub fn next_frame(&self, timeout: Duration) -> anyhow::Result<Option<VideoFrame>> {
        match self.frames.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                anyhow::bail!("capture stream ended: no frame available")
            }
        }
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            log::debug!("ffmpeg already gone: {e}");
        }
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

/// Hand frames to the render loop, dropping any that arrive while one is
/// still waiting to be drawn.
fn forward_frames(events: impl Iterator<Item = FfmpegEvent>, tx: SyncSender<VideoFrame>) {
    let mut dropped = 0u64;
    for event in events {
        match event {
            FfmpegEvent::OutputFrame(frame) => {
                let frame = VideoFrame {
                    data: frame.data,
                    width: frame.width,
                    height: frame.height,
                };
                match tx.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        log::debug!("render loop busy, dropped {dropped} frames so far");
                    }
                    Err(TrySendError::Disconnected(_)) => return,
                }
            }
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) => log::error!("ffmpeg: {msg}"),
            FfmpegEvent::Log(LogLevel::Warning, msg) => log::warn!("ffmpeg: {msg}"),
            FfmpegEvent::Error(msg) => log::error!("ffmpeg: {msg}"),
            _ => {}
        }
    }
    log::info!("ffmpeg output ended");
}
