//! Output stage (C9): dequeue buffers, write to a sink, starting at the
//! precomputed phase offset
//!
//! `AudioSink` is the trait boundary spec.md calls out as an external
//! collaborator; `StdoutSink` is always available, `RodioSink` is gated
//! behind the `audio` feature the way the teacher gates its `rodio`
//! dependency behind `streaming`.

use std::io::Write as _;
use std::sync::Arc;

use crate::error::{Result, WwvSimError};
use crate::queue::MinuteQueue;

/// A destination for finished PCM audio.
pub trait AudioSink: Send {
    /// Open the sink at `sample_rate`, called once before the first write.
    fn open(&mut self, sample_rate: u32) -> Result<()>;
    /// Write mono s16 samples.
    fn write(&mut self, samples: &[i16]) -> Result<()>;
    /// Release any resources. Called on normal shutdown.
    fn close(&mut self);
}

/// Writes raw little-endian s16 mono PCM to standard output. Pacing is
/// whatever downstream consumer (e.g. `aplay` on the other end of a pipe)
/// imposes; this sink itself never sleeps.
#[derive(Default)]
pub struct StdoutSink {
    stdout: Option<std::io::Stdout>,
}

impl AudioSink for StdoutSink {
    fn open(&mut self, _sample_rate: u32) -> Result<()> {
        self.stdout = Some(std::io::stdout());
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<()> {
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| WwvSimError::Device("StdoutSink written before open".into()))?;
        let mut lock = stdout.lock();
        for sample in samples {
            lock.write_all(&sample.to_le_bytes())?;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.stdout = None;
    }
}

/// Real-time playback through a host audio device via `rodio`. Behind the
/// `audio` feature, paralleling the teacher's `streaming` feature gating
/// its own `rodio` dependency. `rodio`'s own output stream paces playback
/// in real time, which is what actually enforces the tick-to-wall-clock
/// alignment `start_offset` computes.
#[cfg(feature = "audio")]
pub struct RodioSink {
    device: Option<i32>,
    _stream: Option<rodio::OutputStream>,
    sink: Option<rodio::Sink>,
}

#[cfg(feature = "audio")]
impl RodioSink {
    pub fn new(device: Option<i32>) -> Self {
        RodioSink {
            device,
            _stream: None,
            sink: None,
        }
    }
}

#[cfg(feature = "audio")]
impl AudioSink for RodioSink {
    fn open(&mut self, _sample_rate: u32) -> Result<()> {
        // Device selection by index is left to whatever `cpal` host the
        // default `rodio` device resolves to; a production embedding would
        // enumerate `cpal::Host::output_devices()` here using `self.device`.
        let _ = self.device;
        let (stream, handle) =
            rodio::OutputStream::try_default().map_err(|e| WwvSimError::Device(e.to_string()))?;
        let sink = rodio::Sink::try_new(&handle).map_err(|e| WwvSimError::Device(e.to_string()))?;
        self._stream = Some(stream);
        self.sink = Some(sink);
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<()> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| WwvSimError::Device("RodioSink written before open".into()))?;
        let source = rodio::buffer::SamplesBuffer::new(1, 48_000, samples.to_vec());
        sink.append(source);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.sleep_until_end();
        }
        self._stream = None;
    }
}

/// Dequeues finished minutes and writes them to a sink. The first entry's
/// `start_offset` is honored; every subsequent entry is written in full
/// from sample 0, since the FIFO preserves strict insertion order and
/// there is exactly one buffer per minute.
pub struct Consumer {
    queue: Arc<MinuteQueue>,
    sink: Box<dyn AudioSink>,
}

impl Consumer {
    pub fn new(queue: Arc<MinuteQueue>, sink: Box<dyn AudioSink>) -> Self {
        Consumer { queue, sink }
    }

    /// Run forever, dequeuing and writing. Returns only on a sink error,
    /// which is the one error kind spec §7 treats as fatal.
    pub fn run(&mut self, sample_rate: u32) -> Result<()> {
        self.sink.open(sample_rate)?;
        let result = loop {
            let entry = self.queue.pop_blocking();
            let samples = entry.buffer.as_slice();
            let start = entry.start_offset.min(samples.len());
            if let Err(e) = self.sink.write(&samples[start..]) {
                break Err(e);
            }
        };
        self.sink.close();
        result
    }
}
