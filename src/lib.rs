//! WWV/WWVH time-signal broadcast simulator
//!
//! A bit-accurate audio simulation of the North American time-signal
//! broadcasts WWV (Fort Collins, Colorado) and WWVH (Kauai, Hawaii):
//! second ticks, minute/hour marker beeps, a BCD time code modulated on a
//! 100 Hz subcarrier, scheduled continuous tones, and spoken announcements,
//! phased to real time.
//!
//! # Crate feature flags
//! - `audio` (default): real-time playback through a host audio device via
//!   [`output::RodioSink`]. Without it, [`output::StdoutSink`] is always
//!   available for piping raw PCM downstream.
//!
//! # Quick start
//! ```no_run
//! use std::sync::Arc;
//! use wwvsim::config::Config;
//! use wwvsim::queue::MinuteQueue;
//! use wwvsim::producer::Producer;
//! use wwvsim::output::{Consumer, StdoutSink};
//!
//! let (config, _warnings) = Config::default().validate().unwrap();
//! let queue = Arc::new(MinuteQueue::new());
//! let start_time = config.start_time;
//! let producer = Producer::new(config.clone(), queue.clone(), None);
//! let _handle = producer.spawn(move || (start_time, std::time::Duration::ZERO));
//!
//! let mut consumer = Consumer::new(queue, Box::new(StdoutSink::default()));
//! // consumer.run(config.sample_rate).unwrap(); // runs forever
//! ```

pub mod audio;
pub mod bcd;
pub mod calendar;
pub mod civil;
pub mod config;
pub mod error;
pub mod minute;
pub mod output;
pub mod producer;
pub mod queue;
pub mod schedule;
pub mod speech;
pub mod station;
pub mod timecode;

pub use error::{Result, WwvSimError};
