//! Demonstration CLI: parses the option table from spec §6 by hand (no
//! `clap`, matching the teacher's own `main.rs`) and runs the producer/
//! consumer pipeline against stdout.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use wwvsim::civil::CivilTime;
use wwvsim::config::{leap_state_from_flags, Config};
use wwvsim::output::{Consumer, StdoutSink};
use wwvsim::producer::Producer;
use wwvsim::queue::MinuteQueue;
use wwvsim::speech::SilentTts;

struct Options {
    verbose: bool,
    sample_rate: Option<u32>,
    wwvh: bool,
    ut1: Option<i32>,
    year: Option<i32>,
    month: Option<u8>,
    day: Option<u8>,
    hour: Option<u8>,
    minute: Option<u8>,
    second: Option<u8>,
    positive_leap: bool,
    negative_leap: bool,
    no_tone: bool,
    no_voice: bool,
    no_code: bool,
    device: Option<i32>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            verbose: false,
            sample_rate: None,
            wwvh: false,
            ut1: None,
            year: None,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
            positive_leap: false,
            negative_leap: false,
            no_tone: false,
            no_voice: false,
            no_code: false,
            device: None,
        }
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut i = 0;

    fn next_val(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
        *i += 1;
        args.get(*i).cloned().ok_or_else(|| format!("{flag} requires a value"))
    }

    while i < args.len() {
        match args[i].as_str() {
            "-v" | "--verbose" => opts.verbose = true,
            "-r" | "--samprate" => {
                let v = next_val(args, &mut i, "--samprate")?;
                opts.sample_rate = Some(v.parse().map_err(|_| format!("invalid sample rate {v}"))?);
            }
            "-H" | "--wwvh" => opts.wwvh = true,
            "-u" | "--ut1" => {
                let v = next_val(args, &mut i, "--ut1")?;
                opts.ut1 = Some(v.parse().map_err(|_| format!("invalid ut1 {v}"))?);
            }
            "-Y" | "--year" => {
                let v = next_val(args, &mut i, "--year")?;
                opts.year = Some(v.parse().map_err(|_| format!("invalid year {v}"))?);
            }
            "-M" | "--month" => {
                let v = next_val(args, &mut i, "--month")?;
                opts.month = Some(v.parse().map_err(|_| format!("invalid month {v}"))?);
            }
            "-D" | "--day" => {
                let v = next_val(args, &mut i, "--day")?;
                opts.day = Some(v.parse().map_err(|_| format!("invalid day {v}"))?);
            }
            "-h" | "--hour" => {
                let v = next_val(args, &mut i, "--hour")?;
                opts.hour = Some(v.parse().map_err(|_| format!("invalid hour {v}"))?);
            }
            "-m" | "--minute" => {
                let v = next_val(args, &mut i, "--minute")?;
                opts.minute = Some(v.parse().map_err(|_| format!("invalid minute {v}"))?);
            }
            "-s" | "--second" => {
                let v = next_val(args, &mut i, "--second")?;
                opts.second = Some(v.parse().map_err(|_| format!("invalid second {v}"))?);
            }
            "-P" | "--positive" => opts.positive_leap = true,
            "-N" | "--negative" => opts.negative_leap = true,
            "-t" | "--no-tone" => opts.no_tone = true,
            "-d" | "--no-voice" => opts.no_voice = true,
            "-c" | "--no-code" => opts.no_code = true,
            "-n" | "--device" => {
                let v = next_val(args, &mut i, "--device")?;
                opts.device = Some(v.parse().map_err(|_| format!("invalid device {v}"))?);
            }
            other => return Err(format!("unrecognized option: {other}")),
        }
        i += 1;
    }
    Ok(opts)
}

/// Today's UTC date/time via the host clock, with no external time crate —
/// matches the teacher's avoidance of a `chrono` dependency it doesn't
/// otherwise need. Gregorian civil-date math is handled by
/// [`wwvsim::calendar`].
fn now_utc() -> (CivilTime, Duration) {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let mut days = since_epoch.as_secs() / 86_400;
    let secs_of_day = since_epoch.as_secs() % 86_400;
    let mut year = 1970i32;
    loop {
        let year_len = if wwvsim::calendar::is_leap_year(year) { 366 } else { 365 };
        if days < year_len {
            break;
        }
        days -= year_len;
        year += 1;
    }
    let mut day_in_year = days as u16 + 1;
    let (month, day) = {
        let mut m = 1u8;
        loop {
            let len = wwvsim::calendar::days_in_month(year, m) as u16;
            if day_in_year <= len {
                break (m, day_in_year as u8);
            }
            day_in_year -= len;
            m += 1;
        }
    };
    let hour = (secs_of_day / 3600) as u8;
    let minute = (secs_of_day / 60 % 60) as u8;
    let second = (secs_of_day % 60) as u8;
    let into_minute = Duration::from_secs(second as u64) + Duration::from_millis(since_epoch.subsec_millis() as u64);
    (CivilTime::new(year, month, day, hour, minute, second), into_minute)
}

fn build_config(opts: &Options) -> Config {
    let mut config = Config::default();

    if opts.wwvh {
        config.station = wwvsim::station::Station::Wwvh;
    }
    if let Some(rate) = opts.sample_rate {
        config.sample_rate = rate;
    }
    if let Some(raw) = opts.ut1 {
        config.dut1 = wwvsim::civil::Dut1Tenths::new_clamped(raw).0;
    }
    config.leap_state = leap_state_from_flags(opts.positive_leap, opts.negative_leap);
    config.no_tone = opts.no_tone;
    config.no_voice = opts.no_voice;
    config.no_code = opts.no_code;
    config.verbose = opts.verbose;
    config.device = opts.device;

    let manual = opts.year.is_some()
        || opts.month.is_some()
        || opts.day.is_some()
        || opts.hour.is_some()
        || opts.minute.is_some()
        || opts.second.is_some();

    if manual {
        let (wall, _) = now_utc();
        config.start_time = CivilTime::new(
            opts.year.unwrap_or(wall.year),
            opts.month.unwrap_or(wall.month),
            opts.day.unwrap_or(wall.day),
            opts.hour.unwrap_or(wall.hour),
            opts.minute.unwrap_or(wall.minute),
            opts.second.unwrap_or(0),
        );
        config.manual_time = true;
    } else {
        config.start_time = now_utc().0;
        config.manual_time = false;
    }

    config
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = parse_args(&args)?;
    let config = build_config(&opts);
    let (config, warnings) = config.validate().map_err(|e| e.to_string())?;
    for warning in &warnings {
        eprintln!("Warning: {warning}");
    }

    let queue = Arc::new(MinuteQueue::new());
    let tts: Option<Arc<dyn wwvsim::speech::TtsEngine>> = Some(Arc::new(SilentTts {
        sample_rate: config.sample_rate,
    }));
    let sample_rate = config.sample_rate;
    let producer = Producer::new(config, queue.clone(), tts);
    let _producer_handle = producer.spawn(now_utc);

    let mut consumer = Consumer::new(queue, Box::new(StdoutSink::default()));
    consumer.run(sample_rate).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
