//! Minute assembler (C6): compose one full broadcast minute
//!
//! Builds the finished [`AudioBuffer`] for a single minute from the pieces
//! everything else in the crate provides — the schedule table, the 100 Hz
//! subcarrier timecode, the station's tick/beep frequencies, DUT1
//! double-ticks, and (if wired up) a speech bridge for the top-of-minute
//! announcement and any recorded announcement segment. Step order follows
//! the broadcast layout exactly: later steps are drawn on top of earlier
//! ones, so ticks always win over the subcarrier and the subcarrier always
//! wins over the scheduled tone.

use std::fs;
use std::path::PathBuf;

use crate::audio::AudioBuffer;
use crate::config::Config;
use crate::error::Result;
use crate::speech::TtsEngine;
use crate::station::Station;
use crate::timecode::Timecode;

/// −6 dB relative to full scale, i.e. `10^(-6/20)`.
const MINUS_6DB: f64 = 0.501_187_233_627_272_2;

/// Assemble one minute of audio.
///
/// `length_secs` is 59, 60, or 61 depending on the pending leap state;
/// `code` is `None` when the subcarrier is globally disabled by the caller
/// (separately from `cfg.no_code`, which this function also honors) — for
/// instance when the timecode itself could not be built. `hour`/`minute`
/// name the minute being assembled, not the one the announcement speaks.
pub fn assemble_minute(
    cfg: &Config,
    station: Station,
    length_secs: u8,
    code: Option<&Timecode>,
    dut1: crate::civil::Dut1Tenths,
    hour: u8,
    minute: u8,
    tts: Option<&dyn TtsEngine>,
) -> Result<AudioBuffer> {
    let mut buf = AudioBuffer::silent(length_secs as u32, cfg.sample_rate);

    splice_tone_or_announcement(&mut buf, cfg, station, hour, minute, tts)?;
    splice_minute_announcement(&mut buf, cfg, station, hour, minute, tts)?;
    apply_subcarrier(&mut buf, cfg, code, length_secs)?;
    apply_minute_beep(&mut buf, station, minute)?;
    apply_second_ticks(&mut buf, station, length_secs)?;
    apply_dut1_double_ticks(&mut buf, station, dut1)?;

    Ok(buf)
}

/// Resolve `<libdir>/<station>/<minute>.<ext>`. `PathBuf::join` already
/// gives an absolute `path` override the bypass spec §6 asks for: joining
/// an absolute path onto anything replaces the base instead of appending.
fn library_path(cfg: &Config, station: Station, minute: u8, ext: &str) -> PathBuf {
    PathBuf::from(&cfg.library_dir)
        .join(station.library_subdir())
        .join(format!("{minute}.{ext}"))
}

/// Step 2: scheduled tone or pre-recorded/synthesized announcement over
/// `[1000, 45000)` ms. Tries a raw PCM file, then a text file synthesized
/// through `tts`, then falls back to the per-station schedule tone. Any
/// failure at one stage falls through to the next rather than propagating
/// (spec §7: resource errors degrade to the scheduled tone, never abort
/// the minute).
fn splice_tone_or_announcement(
    buf: &mut AudioBuffer,
    cfg: &Config,
    station: Station,
    hour: u8,
    minute: u8,
    tts: Option<&dyn TtsEngine>,
) -> Result<()> {
    let raw_path = library_path(cfg, station, minute, "raw");
    if let Ok(file) = fs::File::open(&raw_path) {
        match buf.insert_pcm(1000, file) {
            Ok(_) => return Ok(()),
            Err(e) if cfg.verbose => {
                eprintln!("warning: failed to splice {}: {e}", raw_path.display());
            }
            Err(_) => {}
        }
    }

    let txt_path = library_path(cfg, station, minute, "txt");
    if let (Ok(text), Some(tts)) = (fs::read_to_string(&txt_path), tts) {
        match buf.insert_speech(1000, tts, text.trim()) {
            Ok(_) => return Ok(()),
            Err(e) if cfg.verbose => {
                eprintln!("warning: failed to synthesize {}: {e}", txt_path.display());
            }
            Err(_) => {}
        }
    }

    if !cfg.no_tone {
        let freq = station.schedule_tone_hz(hour, minute);
        if freq != 0 {
            buf.add_tone(1000, 45_000, freq as f64, MINUS_6DB)?;
        }
    }
    Ok(())
}

/// Step 3: "At the tone, H hours M minutes Coordinated Universal Time",
/// spliced at the station's announcement offset, speaking the *next*
/// minute. WWV uses a male voice, WWVH a female voice — the choice is the
/// caller's responsibility via which `TtsEngine` it supplies; this function
/// only picks the splice offset and the wording.
fn splice_minute_announcement(
    buf: &mut AudioBuffer,
    cfg: &Config,
    station: Station,
    hour: u8,
    minute: u8,
    tts: Option<&dyn TtsEngine>,
) -> Result<()> {
    if cfg.no_voice {
        return Ok(());
    }
    let Some(tts) = tts else { return Ok(()) };

    let (next_hour, next_minute) = if minute == 59 {
        (if hour == 23 { 0 } else { hour + 1 }, 0)
    } else {
        (hour, minute + 1)
    };

    let hour_word = if next_hour == 1 { "hour" } else { "hours" };
    let minute_word = if next_minute == 1 { "minute" } else { "minutes" };
    let text = format!(
        "At the tone, {next_hour} {hour_word} {next_minute} {minute_word} Coordinated Universal Time."
    );

    let offset = station.announcement_offset_ms();
    match buf.insert_speech(offset, tts, &text) {
        Ok(_) => Ok(()),
        Err(e) => {
            if cfg.verbose {
                eprintln!("warning: minute announcement synthesis failed: {e}");
            }
            Ok(())
        }
    }
}

/// Step 4: the 100 Hz subcarrier timecode. On a 61-second minute the
/// inserted leap second (s==59) carries no subcarrier pulse of its own —
/// the marker that would fall on 59 is displaced to s==60 instead, per the
/// slot layout in [`crate::timecode`].
fn apply_subcarrier(buf: &mut AudioBuffer, cfg: &Config, code: Option<&Timecode>, length_secs: u8) -> Result<()> {
    if cfg.no_code {
        return Ok(());
    }
    let Some(code) = code else { return Ok(()) };

    for s in 1..length_secs {
        let base = s as u32 * 1000;
        let is_marker = if length_secs == 61 {
            s == 60 || (s % 10 == 9 && s != 59)
        } else {
            s % 10 == 9
        };

        if length_secs == 61 && s == 59 {
            continue; // the leap second itself: no modulation
        }

        if is_marker {
            buf.add_tone(base, base + 800, 100.0, MINUS_6DB)?;
            // low 200 ms: "fully off" per spec — nothing to add.
        } else if code.slot(s as usize) == 1 {
            buf.add_tone(base, base + 500, 100.0, MINUS_6DB)?;
        } else {
            buf.add_tone(base, base + 200, 100.0, MINUS_6DB)?;
        }
    }
    Ok(())
}

/// Step 5: the minute/hour marker beep, 0–800 ms, then 200 ms of silence.
fn apply_minute_beep(buf: &mut AudioBuffer, station: Station, minute: u8) -> Result<()> {
    buf.overlay_tone(0, 800, station.beep_freq_hz(minute), 1.0)?;
    buf.overlay_silence(800, 1000)?;
    Ok(())
}

/// Step 6: a 5 ms full-scale tick at the start of each second, guarded by
/// 40 ms of silence (−10/+30 ms), for every second except 29 and the last
/// two seconds of the minute.
fn apply_second_ticks(buf: &mut AudioBuffer, station: Station, length_secs: u8) -> Result<()> {
    for s in 1..length_secs {
        if s == 29 || s >= 59 {
            continue;
        }
        let base = s as u32 * 1000;
        buf.overlay_silence(base - 10, base + 30)?;
        buf.overlay_tone(base, base + 5, station.tick_freq_hz(), 1.0)?;
    }
    Ok(())
}

/// Step 7: an extra 5 ms tick 100 ms after the main tick, on seconds
/// `1..=|dut1|` when DUT1 is positive, or `9..=8+|dut1|` when negative. No
/// guard silence surrounds these.
fn apply_dut1_double_ticks(buf: &mut AudioBuffer, station: Station, dut1: crate::civil::Dut1Tenths) -> Result<()> {
    let magnitude = dut1.get().unsigned_abs() as u8;
    if magnitude == 0 {
        return Ok(());
    }
    let seconds: Box<dyn Iterator<Item = u8>> = if dut1.get() > 0 {
        Box::new(1..=magnitude)
    } else {
        Box::new(9..=8 + magnitude)
    };
    for s in seconds {
        let base = s as u32 * 1000 + 100;
        buf.overlay_tone(base, base + 5, station.tick_freq_hz(), 1.0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civil::{CivilTime, Dut1Tenths};
    use crate::speech::Pcm;
    use std::sync::Mutex;

    fn test_config() -> Config {
        Config {
            library_dir: "/nonexistent/path/for/tests".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn buffer_length_matches_minute_length() {
        let cfg = test_config();
        let civil = CivilTime::new(2024, 6, 15, 12, 34, 0);
        let (dut1, _) = Dut1Tenths::new_clamped(0);
        let code = Timecode::build(&civil, dut1, false);
        for length in [59u8, 60, 61] {
            let buf = assemble_minute(&cfg, Station::Wwv, length, Some(&code), dut1, 12, 34, None).unwrap();
            assert_eq!(buf.len(), length as u32 as usize * cfg.sample_rate as usize);
        }
    }

    #[test]
    fn minute_zero_uses_hour_beep() {
        let cfg = test_config();
        let (dut1, _) = Dut1Tenths::new_clamped(0);
        let buf = assemble_minute(&cfg, Station::Wwv, 60, None, dut1, 5, 0, None).unwrap();
        let spms = cfg.sample_rate / 1000;
        let peak = buf.as_slice()[..(400 * spms) as usize]
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap();
        assert!(peak > 30_000);
    }

    #[test]
    fn hour_zero_suppresses_440_schedule_tone() {
        let cfg = test_config();
        let (dut1, _) = Dut1Tenths::new_clamped(0);
        // WWV schedule says 440 at minute 2.
        let buf = assemble_minute(&cfg, Station::Wwv, 60, None, dut1, 0, 2, None).unwrap();
        let spms = cfg.sample_rate / 1000;
        // A slice strictly between two seconds' tick/guard windows (each
        // guard is [s*1000-10, s*1000+30)): clear of ticks so any signal
        // left over would have to be the scheduled tone, which must be
        // absent here.
        let window = &buf.as_slice()[(2030 * spms) as usize..(2970 * spms) as usize];
        assert!(window.iter().all(|&s| s == 0));
    }

    #[test]
    fn positive_dut1_double_ticks_on_seconds_one_through_magnitude() {
        let cfg = test_config();
        let (dut1, _) = Dut1Tenths::new_clamped(7);
        let buf = assemble_minute(&cfg, Station::Wwv, 60, None, dut1, 3, 15, None).unwrap();
        let spms = cfg.sample_rate as usize / 1000;
        for s in 1u32..=7 {
            let start = (s as usize * 1000 + 100) * spms;
            let peak = buf.as_slice()[start..start + 5 * spms]
                .iter()
                .map(|v| v.unsigned_abs())
                .max()
                .unwrap();
            assert!(peak > 0, "expected double tick at second {s}");
        }
        // second 8 should have no double tick
        let start = (8 * 1000 + 100) * spms;
        let peak = buf.as_slice()[start..start + 5 * spms]
            .iter()
            .map(|v| v.unsigned_abs())
            .max()
            .unwrap();
        assert_eq!(peak, 0);
    }

    #[test]
    fn negative_dut1_double_ticks_on_seconds_nine_through_eight_plus_magnitude() {
        let cfg = test_config();
        let (dut1, _) = Dut1Tenths::new_clamped(-7);
        let buf = assemble_minute(&cfg, Station::Wwv, 60, None, dut1, 3, 15, None).unwrap();
        let spms = cfg.sample_rate as usize / 1000;
        for s in 9u32..=15 {
            let start = (s as usize * 1000 + 100) * spms;
            let peak = buf.as_slice()[start..start + 5 * spms]
                .iter()
                .map(|v| v.unsigned_abs())
                .max()
                .unwrap();
            assert!(peak > 0, "expected double tick at second {s}");
        }
    }

    struct RecordingTts {
        seen: Mutex<Vec<String>>,
        sample_rate: u32,
    }

    impl TtsEngine for RecordingTts {
        fn synthesize(&self, text: &str) -> Result<Pcm> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(Pcm(vec![0u8; self.sample_rate as usize]))
        }
    }

    #[test]
    fn announcement_uses_singular_units_for_one() {
        let cfg = test_config();
        let (dut1, _) = Dut1Tenths::new_clamped(0);
        let tts = RecordingTts {
            seen: Mutex::new(Vec::new()),
            sample_rate: cfg.sample_rate,
        };
        // minute 59 of hour 0 -> next is hour 1, minute 0.
        let _ = assemble_minute(&cfg, Station::Wwv, 60, None, dut1, 0, 59, Some(&tts)).unwrap();
        let seen = tts.seen.lock().unwrap();
        assert!(seen.iter().any(|t| t.contains("1 hour ") && t.contains("0 minutes")));
    }

    #[test]
    fn second_ticks_skip_29_and_final_two_seconds() {
        let cfg = test_config();
        let (dut1, _) = Dut1Tenths::new_clamped(0);
        let buf = assemble_minute(&cfg, Station::Wwv, 60, None, dut1, 3, 15, None).unwrap();
        let spms = cfg.sample_rate as usize / 1000;
        let start = 29 * 1000 * spms;
        let peak = buf.as_slice()[start..start + 5 * spms]
            .iter()
            .map(|v| v.unsigned_abs())
            .max()
            .unwrap();
        assert_eq!(peak, 0);
    }
}
