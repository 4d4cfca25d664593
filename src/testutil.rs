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
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::dmx::{Completion, DmxClient, SendOutcome};

/// How a mock client answers.
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// Accept every frame right away.
    Ack,
    /// Accept every frame right away except the nth (1 based), which fails.
    FailOn(usize),
    /// Accept every frame after the given delay.
    AckAfter(Duration),
    /// Never report back.
    Silent,
}

/// A frame captured by the mock client.
#[derive(Clone, Debug)]
pub struct SentFrame {
    pub universe: u32,
    pub frame: Vec<u8>,
    pub at: Instant,
}

/// Mock DMX client for testing. Clones share their captured frames.
#[derive(Clone)]
pub struct MockDmxClient {
    behavior: Behavior,
    sent_messages: Arc<Mutex<Vec<SentFrame>>>,
    withheld: Arc<Mutex<Vec<Completion>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockDmxClient {
    pub fn new(behavior: Behavior) -> MockDmxClient {
        MockDmxClient {
            behavior,
            sent_messages: Arc::new(Mutex::new(Vec::new())),
            withheld: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of frames sent
    pub fn message_count(&self) -> usize {
        self.sent_messages.lock().len()
    }

    /// Get all sent frames
    pub fn messages(&self) -> Vec<SentFrame> {
        self.sent_messages.lock().clone()
    }

    /// Get just the channel values of every sent frame
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.sent_messages
            .lock()
            .iter()
            .map(|message| message.frame.clone())
            .collect()
    }

    /// The most frames that were ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// The number of completions the client is sitting on.
    pub fn withheld_count(&self) -> usize {
        self.withheld.lock().len()
    }
}

impl DmxClient for MockDmxClient {
    fn send_dmx(&mut self, universe: u32, frame: &[u8], on_complete: Completion) {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let count = {
            let mut sent_messages = self.sent_messages.lock();
            sent_messages.push(SentFrame {
                universe,
                frame: frame.to_vec(),
                at: Instant::now(),
            });
            sent_messages.len()
        };

        match self.behavior {
            Behavior::Ack => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                on_complete.complete(SendOutcome::Sent);
            }
            Behavior::FailOn(n) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                if count == n {
                    on_complete.complete(SendOutcome::Failed("Mock DMX client failure".into()));
                } else {
                    on_complete.complete(SendOutcome::Sent);
                }
            }
            Behavior::AckAfter(delay) => {
                let in_flight = self.in_flight.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    on_complete.complete(SendOutcome::Sent);
                });
            }
            Behavior::Silent => self.withheld.lock().push(on_complete),
        }
    }
}

/// Asserts that a paused-clock duration landed on the expected value. The timer wheel
/// works in whole milliseconds, so up to one extra millisecond is allowed.
pub fn assert_elapsed(expected: Duration, actual: Duration) {
    assert!(
        actual >= expected && actual - expected <= Duration::from_millis(1),
        "expected {:?} to have elapsed, got {:?}",
        expected,
        actual
    );
}

