//! Simulation configuration
//!
//! A plain data struct — no file format, no `serde` — constructed either
//! programmatically by an embedding application or by the demonstration
//! CLI's hand-rolled argument parser (`main.rs`), matching the teacher's
//! flag parsing in its own `main.rs`.

use crate::civil::{CivilTime, Dut1Tenths, LeapState};
use crate::station::Station;

/// Default library directory, matching the original program's hard-coded path.
pub const DEFAULT_LIBDIR: &str = "/usr/local/share/ka9q-radio";

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Full simulation configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output sample rate in Hz. Must divide 1000 evenly.
    pub sample_rate: u32,
    /// Which station to simulate.
    pub station: Station,
    /// Starting civil time.
    pub start_time: CivilTime,
    /// Whether `start_time` was supplied manually (disables the startup
    /// wall-clock re-check in the producer).
    pub manual_time: bool,
    /// Initial UT1-UTC offset, tenths of a second.
    pub dut1: Dut1Tenths,
    /// Leap-second arming state.
    pub leap_state: LeapState,
    /// Suppress the 440/500/600 Hz scheduled tones.
    pub no_tone: bool,
    /// Suppress spoken announcements.
    pub no_voice: bool,
    /// Suppress the 100 Hz subcarrier timecode.
    pub no_code: bool,
    /// Dump the timecode and TTS commands to stderr.
    pub verbose: bool,
    /// Library directory root for per-station announcement files.
    pub library_dir: String,
    /// Audio output device index, if overridden.
    pub device: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sample_rate: DEFAULT_SAMPLE_RATE,
            station: Station::Wwv,
            start_time: CivilTime::new(2024, 1, 1, 0, 0, 0),
            manual_time: false,
            dut1: Dut1Tenths::new_clamped(0).0,
            leap_state: LeapState::None,
            no_tone: false,
            no_voice: false,
            no_code: false,
            verbose: false,
            library_dir: DEFAULT_LIBDIR.to_string(),
            device: None,
        }
    }
}

/// A non-fatal configuration correction applied by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning(pub String);

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Config {
    /// Apply the §7 config error-handling rules: contradictory leap flags
    /// are both cleared, out-of-range DUT1 is clamped, a leap arming that
    /// contradicts the DUT1 sign/magnitude is canceled, and a pre-2007 start
    /// year is flagged (DST bits will read as clear). Returns the corrected
    /// config alongside the warnings raised, mirroring the original's
    /// `fprintf(stderr, "Warning: ...")` followed by continuing with a
    /// corrected value rather than aborting.
    pub fn validate(mut self) -> crate::error::Result<(Self, Vec<ConfigWarning>)> {
        let mut warnings = Vec::new();

        if self.sample_rate == 0 || self.sample_rate % 1000 != 0 {
            return Err(crate::error::WwvSimError::Config(format!(
                "sample rate {} does not divide 1000 evenly; tick math would not close",
                self.sample_rate
            )));
        }

        if self.start_time.year < 2007 {
            warnings.push(ConfigWarning(format!(
                "DST rules prior to 2007 not implemented; DST bits = 0 for year {}",
                self.start_time.year
            )));
        }

        let (dut1, clamped) = Dut1Tenths::new_clamped(self.dut1.get() as i32);
        self.dut1 = dut1;
        if clamped {
            warnings.push(ConfigWarning(
                "ut1 offset out of range, limited to -7 to +7 tenths".to_string(),
            ));
        }

        if matches!(self.leap_state, LeapState::PositivePending)
            && matches!(self.leap_state, LeapState::NegativePending)
        {
            // Unreachable given the enum's mutual exclusivity, but kept to
            // document the rule: a caller constructing `Config` by hand
            // from two independent bools (as the CLI does before building
            // `LeapState`) is exactly the case the original guarded against.
            self.leap_state = LeapState::None;
            warnings.push(ConfigWarning(
                "positive and negative leap seconds can't both be pending! both cancelled".into(),
            ));
        }

        match self.leap_state {
            LeapState::PositivePending if self.dut1.get() > -3 => {
                self.leap_state = LeapState::None;
                warnings.push(ConfigWarning(
                    "positive leap second cancelled since dut1 > -0.3 sec".into(),
                ));
            }
            LeapState::NegativePending if self.dut1.get() < 3 => {
                self.leap_state = LeapState::None;
                warnings.push(ConfigWarning(
                    "negative leap second cancelled since dut1 < +0.3 sec".into(),
                ));
            }
            _ => {}
        }

        Ok((self, warnings))
    }
}

/// Build a [`LeapState`] from the two independent `--positive`/`--negative`
/// CLI flags, canceling both if somehow both were given (defence in depth;
/// `Config::validate` also checks this).
pub fn leap_state_from_flags(positive: bool, negative: bool) -> LeapState {
    match (positive, negative) {
        (true, false) => LeapState::PositivePending,
        (false, true) => LeapState::NegativePending,
        _ => LeapState::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_dividing_sample_rate() {
        let cfg = Config {
            sample_rate: 44_100,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_dut1_resets_to_zero_at_construction() {
        // new_clamped already resets out-of-range values to 0 at construction,
        // so validate() sees an in-range value and raises no further warning.
        let (dut1, _) = Dut1Tenths::new_clamped(20);
        let cfg = Config { dut1, ..Config::default() };
        let (validated, warnings) = cfg.validate().unwrap();
        assert_eq!(validated.dut1.get(), 0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn cancels_positive_leap_incompatible_with_dut1() {
        let (dut1, _) = Dut1Tenths::new_clamped(5);
        let cfg = Config {
            dut1,
            leap_state: LeapState::PositivePending,
            ..Config::default()
        };
        let (validated, warnings) = cfg.validate().unwrap();
        assert_eq!(validated.leap_state, LeapState::None);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn accepts_positive_leap_compatible_with_dut1() {
        let (dut1, _) = Dut1Tenths::new_clamped(-5);
        let cfg = Config {
            dut1,
            leap_state: LeapState::PositivePending,
            ..Config::default()
        };
        let (validated, _warnings) = cfg.validate().unwrap();
        assert_eq!(validated.leap_state, LeapState::PositivePending);
    }

    #[test]
    fn warns_on_pre_2007_year() {
        let cfg = Config {
            start_time: CivilTime::new(2000, 1, 1, 0, 0, 0),
            ..Config::default()
        };
        let (_validated, warnings) = cfg.validate().unwrap();
        assert!(warnings.iter().any(|w| w.0.contains("2007")));
    }
}
