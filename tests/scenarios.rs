//! End-to-end scenarios from spec §8, driving the public API the way an
//! embedding application would rather than poking at module internals.

use std::sync::Arc;
use std::time::Duration;

use wwvsim::civil::{CivilTime, Dut1Tenths, LeapState};
use wwvsim::config::Config;
use wwvsim::producer::Producer;
use wwvsim::queue::MinuteQueue;
use wwvsim::station::Station;
use wwvsim::timecode::decode::DstState;
use wwvsim::timecode::Timecode;

#[test]
fn scenario_positive_leap_minute_ends_with_61_seconds_and_clears_pending() {
    let (dut1, _) = Dut1Tenths::new_clamped(0);
    let config = Config {
        manual_time: true,
        start_time: CivilTime::new(2015, 12, 31, 23, 59, 0),
        leap_state: LeapState::PositivePending,
        station: Station::Wwv,
        dut1,
        ..Config::default()
    };
    let queue = Arc::new(MinuteQueue::new());
    let mut producer = Producer::new(config, queue, None);

    let entry = producer.run_one_minute(|| unreachable!("manual time skips the wall clock")).unwrap().unwrap();
    assert_eq!(entry.buffer.len(), 61 * 48_000);

    producer.advance();
    assert_eq!(producer.leap_state, LeapState::None);
    assert_eq!(producer.dut1.get(), 10);
    assert_eq!(producer.civil, CivilTime::new(2016, 1, 1, 0, 0, 0));
}

#[test]
fn scenario_dst_starts_today_on_2023_03_12() {
    let civil = CivilTime::new(2023, 3, 12, 0, 0, 0);
    assert_eq!(civil.day_of_year(), 71);
    let (dut1, _) = Dut1Tenths::new_clamped(0);
    let tc = Timecode::build(&civil, dut1, false);
    let decoded = tc.decode();
    assert_eq!(decoded.dst_state, DstState::StartsToday);
}

#[test]
fn scenario_startup_alignment_computes_exact_sample_offset() {
    // Wall clock reads 12:34:27.500 while building the 12:34 minute.
    let config = Config {
        manual_time: false,
        start_time: CivilTime::new(2024, 6, 15, 12, 34, 0),
        sample_rate: 48_000,
        ..Config::default()
    };
    let queue = Arc::new(MinuteQueue::new());
    let mut producer = Producer::new(config, queue, None);

    let wall_now = CivilTime::new(2024, 6, 15, 12, 34, 27);
    let into_minute = Duration::from_millis(27_500);
    let entry = producer.run_one_minute(|| (wall_now, into_minute)).unwrap().unwrap();

    assert_eq!(entry.start_offset, 27_500 * 48); // 27.5 s * 48000 Hz
    assert!(!producer.startup);
}

#[test]
fn scenario_startup_drift_discards_and_resumes_next_minute() {
    let config = Config {
        manual_time: false,
        start_time: CivilTime::new(2024, 6, 15, 12, 34, 0),
        ..Config::default()
    };
    let queue = Arc::new(MinuteQueue::new());
    let mut producer = Producer::new(config, queue, None);

    // By the time step 4 checks, the wall clock has moved to 12:35:02.
    let wall_now = CivilTime::new(2024, 6, 15, 12, 35, 2);
    let entry = producer.run_one_minute(|| (wall_now, Duration::from_secs(2))).unwrap();
    assert!(entry.is_none());

    producer.advance();
    assert_eq!(producer.civil, CivilTime::new(2024, 6, 15, 12, 35, 0));

    // Production resumes at 12:35 and now matches the wall clock.
    let entry = producer
        .run_one_minute(|| (CivilTime::new(2024, 6, 15, 12, 35, 0), Duration::ZERO))
        .unwrap();
    assert!(entry.is_some());
    assert!(!producer.startup);
}

#[test]
fn scenario_wwvh_hour_zero_silences_scheduled_440() {
    // schedule says 440 at minute=1 for WWVH; hour==0 forces silence in the
    // scheduled-tone layer. Disable the subcarrier so it can't contribute
    // signal of its own, and assert over a slice that sits strictly between
    // two seconds' tick/guard windows (each guard is [s*1000-10, s*1000+30)),
    // the way minute.rs's own unit test isolates the scheduled-tone layer.
    let config = Config {
        manual_time: true,
        start_time: CivilTime::new(2020, 1, 1, 0, 1, 0),
        station: Station::Wwvh,
        no_code: true,
        ..Config::default()
    };
    let queue = Arc::new(MinuteQueue::new());
    let mut producer = Producer::new(config.clone(), queue, None);
    let entry = producer.run_one_minute(|| unreachable!()).unwrap().unwrap();

    let spms = config.sample_rate as usize / 1000;
    let window = &entry.buffer.as_slice()[2030 * spms..2970 * spms];
    assert!(window.iter().all(|&s| s == 0));
}
