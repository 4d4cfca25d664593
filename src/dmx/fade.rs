// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Linear fade interpolation. Everything here is pure: the same tick always produces
//! the same frame.

use std::time::Duration;

use super::{DmxError, FadePair, Frame};

impl FadePair {
    /// Returns the intensity of this channel at the given tick. The fraction of the range
    /// covered is `tick / total_ticks`, and the result is truncated rather than rounded.
    fn value_at(&self, tick: u32, total_ticks: u32) -> u8 {
        let start = f64::from(self.start);
        let range = f64::from(self.end) - start;
        let delta = range / f64::from(total_ticks) * f64::from(tick);

        // Both endpoints are bytes, so the sum stays in range for tick <= total_ticks.
        (start + delta) as u8
    }
}

/// Computes the frame for the given tick of a fade, one value per pair in pair order.
pub fn interpolate(tick: u32, total_ticks: u32, pairs: &[FadePair]) -> Result<Frame, DmxError> {
    if total_ticks == 0 {
        return Err(DmxError::InvalidConfiguration(
            "a fade needs at least one tick".into(),
        ));
    }

    Ok(pairs
        .iter()
        .map(|pair| pair.value_at(tick, total_ticks))
        .collect())
}

/// The number of ticks in a fade of the given duration: floor(duration / interval).
/// A fade that would produce no ticks at all is rejected.
pub fn total_ticks(duration: Duration, interval: Duration) -> Result<u32, DmxError> {
    let interval_ms = interval.as_millis();
    if interval_ms == 0 {
        return Err(DmxError::InvalidConfiguration(
            "the tick interval must be at least 1ms".into(),
        ));
    }

    let ticks = duration.as_millis() / interval_ms;
    if ticks == 0 {
        return Err(DmxError::InvalidConfiguration(format!(
            "a fade of {}ms is shorter than the {}ms tick interval",
            duration.as_millis(),
            interval_ms
        )));
    }

    u32::try_from(ticks).map_err(|_| {
        DmxError::InvalidConfiguration(format!("a fade of {} ticks is too long", ticks))
    })
}
