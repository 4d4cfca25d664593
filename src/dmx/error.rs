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

/// Errors that end a DMX run. Every error is terminal, nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DmxError {
    /// Arguments, environment or settings were unusable. Raised before any frame is scheduled.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The DMX client did not accept a frame.
    #[error("transmission failure: {0}")]
    TransmissionFailure(String),
}

impl DmxError {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DmxError::TransmissionFailure(_) => 1,
            DmxError::InvalidConfiguration(_) => 2,
        }
    }
}
