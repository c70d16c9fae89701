//! Fade ramps.
//!
//! A fade moves the driven level toward the requested duty value by a
//! constant step once per frame. The step is fixed by the configured
//! duration, `256 / duration` (at least 1), so ramps are linear rather than
//! easing out.

use core::cmp::Ordering;

use fugit::{HertzU32, MillisDurationU32};

/// Level increment applied per fade tick for a ramp of `duration` ticks.
///
/// A duration of zero means no ramp and yields the full range.
#[must_use]
pub const fn step_size(duration: u16) -> u8 {
    if duration == 0 {
        return u8::MAX;
    }

    let step = 256 / duration as u32;

    if step == 0 {
        1
    } else if step > u8::MAX as u32 {
        u8::MAX
    } else {
        step as u8
    }
}

/// Next driven level on the way from `current` to `target`.
///
/// `up` and `down` are the ramp durations in fade ticks for the rising and
/// falling direction; zero jumps straight to `target`. The result never
/// passes `target`.
#[must_use]
pub fn next_level(current: u8, target: u8, up: u16, down: u16) -> u8 {
    match current.cmp(&target) {
        Ordering::Less if up > 0 => current.saturating_add(step_size(up)).min(target),
        Ordering::Greater if down > 0 => current.saturating_sub(step_size(down)).max(target),
        _ => target,
    }
}

/// Number of frames covering `duration` at `frame_rate`, rounded to nearest.
///
/// Any non-zero duration lasts at least one frame. Durations too long to
/// count saturate at `u16::MAX`.
#[must_use]
pub fn frames_for(duration: MillisDurationU32, frame_rate: HertzU32) -> u16 {
    let millis = u64::from(duration.to_millis());

    if millis == 0 {
        return 0;
    }

    let frames = (millis * u64::from(frame_rate.to_Hz()) + 500) / 1000;

    u16::try_from(frames.max(1)).unwrap_or(u16::MAX)
}
