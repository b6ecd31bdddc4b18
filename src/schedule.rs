//! Per-station broadcast schedule tables (C7)
//!
//! One table per station, indexed by minute-of-hour, giving the continuous
//! tone frequency for that minute (0 = silent). Transcribed verbatim from
//! the official schedule; see spec §6 for the annotated layout.

/// WWV (Fort Collins, CO) tone schedule, indexed by minute of hour.
#[rustfmt::skip]
pub const WWV_TONE_SCHEDULE: [u16; 60] = [
    0, 600, 440,   0,   0, 600, 500, 600,   0,   0,
    0, 600, 500, 600, 500, 600,   0, 600,   0, 600,
  500, 600, 500, 600, 500, 600, 500, 600, 500,   0,
    0, 600, 500, 600, 500, 600, 500, 600, 500, 600,
  500, 600, 500,   0,   0,   0,   0,   0,   0,   0,
    0,   0, 500, 600, 500, 600, 500, 600, 500,   0,
];

/// WWVH (Kauai, HI) tone schedule, indexed by minute of hour.
#[rustfmt::skip]
pub const WWVH_TONE_SCHEDULE: [u16; 60] = [
    0, 440, 600,   0,   0, 500, 600,   0,   0,   0,
    0,   0, 600, 500,   0,   0,   0,   0,   0,   0,
  600, 500, 600, 500, 600, 500, 600, 500, 600,   0,
    0, 500, 600, 500, 600, 500, 600, 500, 600, 500,
  600, 500, 600, 500, 600,   0, 600,   0,   0,   0,
    0,   0,   0, 500, 600, 500, 600, 500, 600,   0,
];
