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

use std::{path::Path, time::Duration};

use duration_string::DurationString;

use crate::dmx::{self, fade, DmxError, FadePair};

/// How channel values are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Send the values once.
    Set,
    /// Fade from start values to end values over a duration.
    Dim,
}

impl Mode {
    /// Picks the mode from the name the program was run as: anything with "dim" in its
    /// file name fades, everything else sets.
    pub fn from_program_name(program: &str) -> Mode {
        let name = Path::new(program)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(program);

        if name.to_lowercase().contains("dim") {
            Mode::Dim
        } else {
            Mode::Set
        }
    }
}

/// A fully parsed request for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send these channel values once.
    Set { channels: Vec<u8> },
    /// Fade each channel from its start to its end value over the duration.
    Dim {
        duration: Duration,
        pairs: Vec<FadePair>,
    },
}

impl Command {
    /// Parses positional arguments for the given mode. Set takes one intensity per channel.
    /// Dim takes a duration followed by a start and end intensity per channel.
    pub fn parse(mode: Mode, args: &[String]) -> Result<Command, DmxError> {
        match mode {
            Mode::Set => Ok(Command::Set {
                channels: args
                    .iter()
                    .map(|arg| parse_intensity(arg))
                    .collect::<Result<Vec<u8>, DmxError>>()?,
            }),
            Mode::Dim => {
                let (duration, values) = args
                    .split_first()
                    .ok_or_else(|| invalid("a fade needs a duration".into()))?;
                let duration = parse_duration(duration)?;

                if values.len() % 2 != 0 {
                    return Err(invalid(format!(
                        "fade values come in start/end pairs, got {} values",
                        values.len()
                    )));
                }

                let pairs = values
                    .chunks_exact(2)
                    .map(|pair| {
                        Ok(FadePair::new(
                            parse_intensity(&pair[0])?,
                            parse_intensity(&pair[1])?,
                        ))
                    })
                    .collect::<Result<Vec<FadePair>, DmxError>>()?;

                Ok(Command::Dim { duration, pairs })
            }
        }
    }

    /// Gets the mode of this command.
    pub fn mode(&self) -> Mode {
        match self {
            Command::Set { .. } => Mode::Set,
            Command::Dim { .. } => Mode::Dim,
        }
    }

    /// Checks the command against the tick interval so that bad input is caught before
    /// anything connects to OLA.
    pub fn validate(&self, interval: Duration) -> Result<(), DmxError> {
        match self {
            Command::Set { channels } => dmx::check_channel_count(channels.len()),
            Command::Dim { duration, pairs } => {
                dmx::check_channel_count(pairs.len())?;
                fade::total_ticks(*duration, interval).map(|_| ())
            }
        }
    }
}

fn invalid(message: String) -> DmxError {
    DmxError::InvalidConfiguration(message)
}

/// Parses a single channel intensity. Values outside of a byte are rejected rather than
/// clamped.
fn parse_intensity(value: &str) -> Result<u8, DmxError> {
    let intensity: i64 = value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{} is not an integer intensity", value)))?;

    u8::try_from(intensity)
        .map_err(|_| invalid(format!("intensity {} is outside of 0-255", intensity)))
}

/// Parses a fade duration. Bare integers are milliseconds, anything else is a duration
/// string like "2s" or "1500ms".
fn parse_duration(value: &str) -> Result<Duration, DmxError> {
    if let Ok(millis) = value.trim().parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }

    Ok(DurationString::from_string(value.to_string())
        .map_err(|err| invalid(format!("{} is not a duration: {}", value, err)))?
        .into())
}
