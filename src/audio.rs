//! Tone mixer (C5): buffer-oriented primitives for composing one minute of audio
//!
//! All operations address the buffer in milliseconds; [`AudioBuffer`]
//! converts to sample offsets internally. Tone generation uses a complex
//! phasor advanced by `e^(i*2*pi*f/Fs)` per sample rather than calling
//! `sin`/`cos` per sample — the zero-crossing precondition on `start_ms`
//! guarantees every tone begins in-phase, so no phase needs to be carried
//! across calls.

use std::io::Read;

use crate::error::{Result, WwvSimError};
use crate::speech::TtsEngine;

/// A rotating unit-magnitude complex phasor, stepped once per sample.
#[derive(Debug, Clone, Copy)]
struct Phasor {
    re: f64,
    im: f64,
    step_re: f64,
    step_im: f64,
}

impl Phasor {
    fn new(freq_hz: f64, sample_rate: u32) -> Self {
        let angle = 2.0 * std::f64::consts::PI * freq_hz / sample_rate as f64;
        Phasor {
            re: 1.0,
            im: 0.0,
            step_re: angle.cos(),
            step_im: angle.sin(),
        }
    }

    /// The imaginary component (sine) of the current phase, then rotate.
    fn next_sin(&mut self) -> f64 {
        let sin = self.im;
        let (re, im) = (self.re, self.im);
        self.re = re * self.step_re - im * self.step_im;
        self.im = re * self.step_im + im * self.step_re;
        sin
    }
}

/// Full-scale amplitude of a signed 16-bit sample.
pub const S16_MAX: f64 = i16::MAX as f64;

/// A contiguous buffer of signed 16-bit mono samples for one broadcast minute.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Allocate a silent buffer holding `length_secs` seconds of audio at `sample_rate`.
    pub fn silent(length_secs: u32, sample_rate: u32) -> Self {
        AudioBuffer {
            samples: vec![0i16; (length_secs * sample_rate) as usize],
            sample_rate,
        }
    }

    /// Sample rate this buffer was built at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total sample count.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the raw sample slice.
    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    /// Samples per millisecond at this buffer's sample rate.
    /// Callers are expected to have validated `sample_rate % 1000 == 0`
    /// before constructing a buffer (see `Config::validate`).
    fn samples_per_ms(&self) -> u32 {
        self.sample_rate / 1000
    }

    fn ms_range_to_sample_range(&self, start_ms: u32, stop_ms: u32) -> Result<std::ops::Range<usize>> {
        if stop_ms <= start_ms {
            return Err(WwvSimError::Synthesis(format!(
                "empty or reversed range [{start_ms}, {stop_ms})"
            )));
        }
        let spms = self.samples_per_ms() as usize;
        let start = start_ms as usize * spms;
        let stop = stop_ms as usize * spms;
        if stop > self.samples.len() {
            return Err(WwvSimError::Synthesis(format!(
                "range [{start_ms}, {stop_ms}) ms exceeds buffer of {} samples",
                self.samples.len()
            )));
        }
        Ok(start..stop)
    }

    /// Overwrite samples in `[start_ms, stop_ms)` with a sine tone at
    /// `freq_hz`, full amplitude scaled by `amp`. Used for ticks, minute/hour
    /// beeps, and scheduled tones that must dominate anything already
    /// written (those are always written first, so in practice this mostly
    /// matters for the order seconds ticks pre-empt the subcarrier).
    ///
    /// `start_ms * freq_hz` must land on an integer number of cycles so the
    /// tone starts at a positive zero crossing; this is an invariant the
    /// minute assembler always satisfies by construction.
    pub fn overlay_tone(&mut self, start_ms: u32, stop_ms: u32, freq_hz: f64, amp: f64) -> Result<()> {
        debug_assert!(
            (start_ms as f64 * freq_hz) % 1000.0 == 0.0,
            "tone at {freq_hz} Hz starting at {start_ms} ms is not a zero crossing"
        );
        let range = self.ms_range_to_sample_range(start_ms, stop_ms)?;
        let mut phasor = Phasor::new(freq_hz, self.sample_rate);
        for sample in &mut self.samples[range] {
            *sample = (phasor.next_sin() * amp * S16_MAX) as i16;
        }
        Ok(())
    }

    /// Add a sine tone at `freq_hz` into `[start_ms, stop_ms)`, summing with
    /// whatever is already there and saturating to `[-32767, 32767]`. Used
    /// for the 100 Hz subcarrier and the 440/500/600 Hz schedule tones.
    pub fn add_tone(&mut self, start_ms: u32, stop_ms: u32, freq_hz: f64, amp: f64) -> Result<()> {
        debug_assert!(
            (start_ms as f64 * freq_hz) % 1000.0 == 0.0,
            "tone at {freq_hz} Hz starting at {start_ms} ms is not a zero crossing"
        );
        let range = self.ms_range_to_sample_range(start_ms, stop_ms)?;
        let mut phasor = Phasor::new(freq_hz, self.sample_rate);
        for sample in &mut self.samples[range] {
            let mixed = *sample as f64 + phasor.next_sin() * amp * S16_MAX;
            *sample = mixed.clamp(-S16_MAX, S16_MAX) as i16;
        }
        Ok(())
    }

    /// Zero the samples in `[start_ms, stop_ms)`. Used for the guard
    /// interval around each second tick and around the minute beep.
    pub fn overlay_silence(&mut self, start_ms: u32, stop_ms: u32) -> Result<()> {
        let range = self.ms_range_to_sample_range(start_ms, stop_ms)?;
        for sample in &mut self.samples[range] {
            *sample = 0;
        }
        Ok(())
    }

    /// Splice raw little-endian s16 mono PCM from `reader` into the buffer
    /// at `start_ms`, overwriting up to the end of the buffer or the end of
    /// the source, whichever comes first. Returns the number of samples
    /// written.
    pub fn insert_pcm(&mut self, start_ms: u32, mut reader: impl Read) -> Result<usize> {
        let spms = self.samples_per_ms() as usize;
        let start = start_ms as usize * spms;
        if start > self.samples.len() {
            return Ok(0);
        }
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let available = (self.samples.len() - start).min(raw.len() / 2);
        for (i, chunk) in raw[..available * 2].chunks_exact(2).enumerate() {
            self.samples[start + i] = i16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Ok(available)
    }

    /// Synthesize `text` (or load a pre-recorded file if `tts` resolves one)
    /// via `tts` and splice the resulting PCM at `start_ms`.
    pub fn insert_speech(&mut self, start_ms: u32, tts: &dyn TtsEngine, text: &str) -> Result<usize> {
        let pcm = tts.synthesize(text)?;
        self.insert_pcm(start_ms, pcm.as_slice())
    }
}
