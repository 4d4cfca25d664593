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
use std::time::Duration;

mod client;
mod error;
pub mod fade;
mod runloop;
mod scheduler;

pub use client::{DmxClient, OlaClient, SendOutcome};
pub use error::DmxError;
pub use runloop::Completion;
pub use scheduler::{RunReport, Scheduler};
pub(crate) use scheduler::check_channel_count;

/// A DMX universe is 512 channels.
pub const UNIVERSE_SIZE: usize = 512;

/// One complete set of channel intensities, in channel order.
pub type Frame = Vec<u8>;

/// The start and end intensity of a single faded channel. The end may be lower than
/// the start for a fade down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadePair {
    pub start: u8,
    pub end: u8,
}

impl FadePair {
    /// Creates a new fade pair.
    pub fn new(start: u8, end: u8) -> FadePair {
        FadePair { start, end }
    }
}

/// The values the scheduler needs to place frames on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// The OLA universe frames are sent to.
    pub universe: u32,
    /// The time between ticks.
    pub interval: Duration,
}
