//! Speech bridge (C10)
//!
//! The text-to-speech engine is an external collaborator (spec §1):
//! this module only defines the capability contract — `synthesize(text) ->
//! raw PCM at the configured sample rate` — plus a subprocess-based default
//! implementation, so different back ends (espeak, Piper, macOS `say`, ...)
//! can be swapped in without touching the minute assembler.

use std::io::Write as _;
use std::process::{Command, Stdio};

use crate::error::{Result, WwvSimError};

/// Raw little-endian signed 16-bit mono PCM, as produced by a [`TtsEngine`].
#[derive(Debug, Clone, Default)]
pub struct Pcm(pub Vec<u8>);

impl Pcm {
    /// Borrow the raw byte buffer (suitable for [`crate::audio::AudioBuffer::insert_pcm`]).
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Capability for turning announcement text into PCM audio.
///
/// Implementations are expected to produce audio at whatever sample rate
/// the caller configured; this crate does not resample.
pub trait TtsEngine: Send + Sync {
    /// Synthesize `text`, returning raw s16 mono PCM at the target sample rate.
    fn synthesize(&self, text: &str) -> Result<Pcm>;
}

/// Invokes an external command-line TTS engine as a subprocess.
///
/// The command template receives the text on stdin and is expected to write
/// raw s16 mono PCM at `sample_rate` to stdout. This mirrors the original
/// program's `announce_text`/`announce_text_file`, which shell out to
/// `espeak`/`say`/`piper` piped through `sox`, but generalizes the specific
/// command line into a caller-supplied template so any engine with a
/// "text in, PCM out" contract can be plugged in.
pub struct SubprocessTts {
    /// Program to execute (e.g. `"espeak"`, `/usr/local/bin/piper`, a
    /// wrapper script that pipes through `sox`).
    pub program: String,
    /// Extra arguments passed before the program reads text from stdin.
    pub args: Vec<String>,
    /// Whether to print the invoked command line to stderr (`--verbose`).
    pub verbose: bool,
}

impl SubprocessTts {
    /// Construct a bridge that runs `program` with `args`, feeding text on stdin.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        SubprocessTts {
            program: program.into(),
            args,
            verbose: false,
        }
    }
}

impl TtsEngine for SubprocessTts {
    fn synthesize(&self, text: &str) -> Result<Pcm> {
        if self.verbose {
            eprintln!("Executing \"{} {:?}\" to speak:\n{text}", self.program, self.args);
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| WwvSimError::Synthesis(format!("failed to start {}: {e}", self.program)))?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| WwvSimError::Synthesis("TTS subprocess stdin unavailable".into()))?;
            stdin.write_all(text.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(WwvSimError::Synthesis(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(Pcm(output.stdout))
    }
}

/// A `TtsEngine` that always produces silence, for tests and for degrading
/// gracefully when no real engine is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentTts {
    /// Sample rate at which to synthesize silence.
    pub sample_rate: u32,
}

impl TtsEngine for SilentTts {
    fn synthesize(&self, _text: &str) -> Result<Pcm> {
        // A nominal two seconds of silence is enough headroom for any
        // announcement splice offset used in this crate.
        let samples = self.sample_rate.max(1) as usize * 2;
        Ok(Pcm(vec![0u8; samples * 2]))
    }
}
