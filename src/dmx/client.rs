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

use std::{
    error::Error,
    net::TcpStream,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender};
use ola::{client::StreamingClientConfig, DmxBuffer, StreamingClient};
use tracing::{debug, error, info};

use super::{Completion, DmxError};

/// The number of times to try to reach the OLA daemon before giving up.
const CONNECT_ATTEMPTS: usize = 3;

/// How long to wait between connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The result of handing one frame to a DMX client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The frame was accepted.
    Sent,
    /// The frame was not accepted. Transport errors and rejections are not distinguished.
    Failed(String),
}

impl SendOutcome {
    /// Returns true if the frame was accepted.
    pub fn succeeded(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

/// A client that can put frames on a DMX universe. Sending is asynchronous: `send_dmx`
/// returns right away and the client completes `on_complete` exactly once, later, with the
/// outcome. Callers never have more than one frame outstanding.
pub trait DmxClient: Send {
    /// Submits a frame to the given universe.
    fn send_dmx(&mut self, universe: u32, frame: &[u8], on_complete: Completion);
}

/// A blocking connection to the OLA daemon.
trait OlaConnection: Send + 'static {
    /// Sends DMX data to a universe.
    fn send_dmx(&mut self, universe: u32, buffer: &DmxBuffer) -> Result<(), Box<dyn Error>>;
}

impl OlaConnection for StreamingClient<TcpStream> {
    fn send_dmx(&mut self, universe: u32, buffer: &DmxBuffer) -> Result<(), Box<dyn Error>> {
        StreamingClient::send_dmx(self, universe, buffer)?;
        Ok(())
    }
}

/// A frame waiting for the OLA thread.
struct Request {
    universe: u32,
    buffer: DmxBuffer,
    on_complete: Completion,
}

/// A DMX client backed by the OLA streaming client. The streaming client blocks on its
/// socket, so frames are handed to a dedicated thread which reports each outcome back.
pub struct OlaClient {
    sender: Option<Sender<Request>>,
    client_handle: Option<JoinHandle<()>>,
}

impl OlaClient {
    /// Connects to the OLA daemon on the given port.
    pub fn connect(port: u16) -> Result<OlaClient, DmxError> {
        let config = StreamingClientConfig {
            server_port: port,
            ..Default::default()
        };

        let mut maybe_client = None;
        for i in 0..CONNECT_ATTEMPTS {
            // Don't sleep on the first iteration.
            if i > 0 {
                thread::sleep(CONNECT_RETRY_DELAY);
            }

            match ola::connect_with_config(config.clone()) {
                Ok(client) => {
                    maybe_client = Some(client);
                    break;
                }
                Err(err) => debug!(
                    err = err.to_string(),
                    attempt = i + 1,
                    "Error connecting to OLA, trying again."
                ),
            }
        }

        match maybe_client {
            Some(client) => {
                info!(port, "Connected to OLA.");
                Ok(Self::start(client))
            }
            None => Err(DmxError::TransmissionFailure(format!(
                "unable to connect to OLA on port {}",
                port
            ))),
        }
    }

    /// Starts the OLA thread for the given connection.
    fn start<T: OlaConnection>(connection: T) -> OlaClient {
        let (sender, receiver) = crossbeam_channel::unbounded::<Request>();
        let client_handle = thread::spawn(move || {
            Self::ola_thread(connection, receiver);
        });

        OlaClient {
            sender: Some(sender),
            client_handle: Some(client_handle),
        }
    }

    fn ola_thread<T: OlaConnection>(mut connection: T, receiver: Receiver<Request>) {
        for request in receiver.iter() {
            let outcome = match connection.send_dmx(request.universe, &request.buffer) {
                Ok(()) => SendOutcome::Sent,
                Err(err) => {
                    error!(
                        err = err.to_string(),
                        "Error sending DMX to universe {}", request.universe
                    );
                    SendOutcome::Failed(err.to_string())
                }
            };
            request.on_complete.complete(outcome);
        }
    }
}

/// Copies a frame into an OLA buffer. Channels past the end of the frame are left at zero.
fn to_buffer(frame: &[u8]) -> DmxBuffer {
    let mut buffer = DmxBuffer::new();
    for (channel, value) in frame.iter().enumerate() {
        buffer.set_channel(channel, *value);
    }
    buffer
}

impl DmxClient for OlaClient {
    fn send_dmx(&mut self, universe: u32, frame: &[u8], on_complete: Completion) {
        let request = Request {
            universe,
            buffer: to_buffer(frame),
            on_complete,
        };

        let Some(sender) = self.sender.as_ref() else {
            request
                .on_complete
                .complete(SendOutcome::Failed("OLA client is closed".into()));
            return;
        };

        if let Err(err) = sender.send(request) {
            err.into_inner()
                .on_complete
                .complete(SendOutcome::Failed("OLA thread has stopped".into()));
        }
    }
}

impl Drop for OlaClient {
    fn drop(&mut self) {
        // Closing the channel ends the OLA thread once it has drained.
        self.sender.take();
        if let Some(client_handle) = self.client_handle.take() {
            if client_handle.join().is_err() {
                error!("OLA thread panicked");
            }
        }
    }
}
