//! Producer loop (C8): advance civil time, assemble minutes, enqueue them
//!
//! `Producer::run_one_minute` implements one iteration of spec.md §4.7
//! steps 1–4 (everything up to, but not including, the enqueue/backpressure/
//! advance that only make sense with a real queue and a real clock) as a
//! single method so it's testable without a thread: the wall-clock check in
//! step 4 is injected as a closure instead of calling `SystemTime::now()`
//! directly. `Producer::spawn` wraps the full loop — enqueue, backpressure,
//! time advance — on its own thread.

use std::sync::Arc;
use std::time::Duration;

use crate::civil::{CivilTime, Dut1Tenths, LeapState};
use crate::config::Config;
use crate::error::Result;
use crate::minute::assemble_minute;
use crate::queue::{MinuteQueue, QueueEntry};
use crate::speech::TtsEngine;
use crate::station::Station;
use crate::timecode::Timecode;

/// Counters useful for tests and a verbose end-of-run summary, in the
/// spirit of the teacher's lightweight playback stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProducerStats {
    pub minutes_produced: u64,
    pub minutes_discarded_at_startup: u64,
}

pub struct Producer {
    pub civil: CivilTime,
    pub dut1: Dut1Tenths,
    pub leap_state: LeapState,
    pub startup: bool,
    pub stats: ProducerStats,
    config: Config,
    station: Station,
    queue: Arc<MinuteQueue>,
    tts: Option<Arc<dyn TtsEngine>>,
}

impl Producer {
    pub fn new(config: Config, queue: Arc<MinuteQueue>, tts: Option<Arc<dyn TtsEngine>>) -> Self {
        Producer {
            civil: config.start_time,
            dut1: config.dut1,
            leap_state: config.leap_state,
            startup: true,
            stats: ProducerStats::default(),
            station: config.station,
            config,
            queue,
            tts,
        }
    }

    /// Step 1: the length of the minute currently being built, from the
    /// armed leap state — only end-of-June/December minutes are eligible.
    fn minute_length(&self) -> u8 {
        if self.civil.is_leap_second_eligible() {
            match self.leap_state {
                LeapState::PositivePending => 61,
                LeapState::NegativePending => 59,
                LeapState::None => 60,
            }
        } else {
            60
        }
    }

    /// Steps 1–4: build the timecode and minute buffer for the current
    /// civil time, then (on the first minute only, and only if the caller
    /// didn't pin a manual start time) re-check the wall clock. If it has
    /// already moved past this minute, the buffer is discarded — `Ok(None)`
    /// — and production resumes at the next minute on the following call.
    pub fn run_one_minute(&mut self, now: impl Fn() -> (CivilTime, Duration)) -> Result<Option<QueueEntry>> {
        let length = self.minute_length();
        let code = if self.config.no_code {
            None
        } else {
            Some(Timecode::build(&self.civil, self.dut1, self.leap_state.is_pending()))
        };

        let buffer = assemble_minute(
            &self.config,
            self.station,
            length,
            code.as_ref(),
            self.dut1,
            self.civil.hour,
            self.civil.minute,
            self.tts.as_deref(),
        )?;

        if self.startup && !self.config.manual_time {
            let (wall_now, into_minute) = now();
            let same_minute = wall_now.year == self.civil.year
                && wall_now.month == self.civil.month
                && wall_now.day == self.civil.day
                && wall_now.hour == self.civil.hour
                && wall_now.minute == self.civil.minute;

            if !same_minute {
                self.stats.minutes_discarded_at_startup += 1;
                if self.config.verbose {
                    eprintln!(
                        "startup drift: wall clock advanced past {:02}:{:02}, discarding buffer",
                        self.civil.hour, self.civil.minute
                    );
                }
                return Ok(None);
            }

            self.startup = false;
            let start_offset = (into_minute.as_secs_f64() * self.config.sample_rate as f64).round() as usize;
            self.stats.minutes_produced += 1;
            return Ok(Some(QueueEntry::new(buffer, start_offset)));
        }

        self.startup = false;
        self.stats.minutes_produced += 1;
        Ok(Some(QueueEntry::new(buffer, 0)))
    }

    /// Step 7: advance civil time by one minute, clearing whichever leap
    /// state just fired and applying its DUT1 correction.
    pub fn advance(&mut self) {
        match self.leap_state {
            LeapState::PositivePending if self.minute_length() == 61 => {
                self.leap_state = LeapState::None;
                self.dut1.after_positive_leap();
            }
            LeapState::NegativePending if self.minute_length() == 59 => {
                self.leap_state = LeapState::None;
                self.dut1.after_negative_leap();
            }
            _ => {}
        }
        self.civil.advance_minute();
    }

    /// Run the full producer loop (steps 1–7) on its own thread: assemble,
    /// enqueue, back off while the queue is deep, advance, repeat forever.
    pub fn spawn(mut self, now: impl Fn() -> (CivilTime, Duration) + Send + 'static) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || loop {
            match self.run_one_minute(&now) {
                Ok(Some(entry)) => {
                    self.queue.push(entry);
                    self.queue.wait_while_len_at_least(2, Duration::from_secs(30));
                }
                Ok(None) => {}
                Err(e) => {
                    if self.config.verbose {
                        eprintln!("producer error: {e}");
                    }
                }
            }
            self.advance();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MinuteQueue;

    fn producer_with(config: Config) -> Producer {
        Producer::new(config, Arc::new(MinuteQueue::new()), None)
    }

    #[test]
    fn manual_time_skips_wall_clock_check() {
        let config = Config {
            manual_time: true,
            start_time: CivilTime::new(2024, 6, 15, 12, 34, 0),
            ..Config::default()
        };
        let mut producer = producer_with(config);
        let entry = producer
            .run_one_minute(|| panic!("wall clock should not be consulted in manual mode"))
            .unwrap();
        assert!(entry.is_some());
        assert_eq!(entry.unwrap().start_offset, 0);
    }

    #[test]
    fn startup_drift_discards_buffer() {
        let config = Config {
            manual_time: false,
            start_time: CivilTime::new(2024, 6, 15, 12, 34, 0),
            ..Config::default()
        };
        let mut producer = producer_with(config);
        let later = CivilTime::new(2024, 6, 15, 12, 35, 2);
        let entry = producer.run_one_minute(|| (later, Duration::from_secs(2))).unwrap();
        assert!(entry.is_none());
        assert_eq!(producer.stats.minutes_discarded_at_startup, 1);
        assert!(producer.startup, "startup flag stays set until a minute matches");
    }

    #[test]
    fn startup_alignment_computes_sample_offset() {
        let config = Config {
            manual_time: false,
            start_time: CivilTime::new(2024, 6, 15, 12, 34, 0),
            sample_rate: 1000,
            ..Config::default()
        };
        let mut producer = producer_with(config);
        let same = CivilTime::new(2024, 6, 15, 12, 34, 27);
        let entry = producer
            .run_one_minute(|| (same, Duration::from_millis(27_500)))
            .unwrap()
            .unwrap();
        assert_eq!(entry.start_offset, 27_500); // 1000 samples/sec * 27.5 sec
        assert!(!producer.startup);
    }

    #[test]
    fn positive_leap_clears_and_bumps_dut1() {
        let (dut1, _) = Dut1Tenths::new_clamped(-5);
        let config = Config {
            manual_time: true,
            start_time: CivilTime::new(2015, 12, 31, 23, 59, 0),
            leap_state: LeapState::PositivePending,
            dut1,
            ..Config::default()
        };
        let mut producer = producer_with(config);
        producer.run_one_minute(|| unreachable!()).unwrap();
        producer.advance();
        assert_eq!(producer.leap_state, LeapState::None);
        assert_eq!(producer.dut1.get(), 5);
        assert_eq!(producer.civil, CivilTime::new(2016, 1, 1, 0, 0, 0));
    }
}
