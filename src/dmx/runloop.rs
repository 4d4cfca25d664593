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

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::Instant,
};

use super::SendOutcome;

/// An event handled by the run loop.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Event {
    /// An armed timer has fired.
    Tick,
    /// The DMX client has finished with the outstanding frame.
    SendComplete(SendOutcome),
}

/// The callback handed to a DMX client with every frame. Completing it delivers the
/// outcome back into the run loop that submitted the frame.
#[derive(Debug)]
pub struct Completion {
    sender: UnboundedSender<Event>,
}

impl Completion {
    /// Reports the outcome of the frame. If the run loop has already stopped, the outcome
    /// is dropped.
    pub fn complete(self, outcome: SendOutcome) {
        let _ = self.sender.send(Event::SendComplete(outcome));
    }
}

/// A cooperative, single consumer event loop. Timers and completions are both delivered
/// as events and handled one at a time by whoever drives `next_event`.
pub(super) struct RunLoop {
    sender: UnboundedSender<Event>,
    receiver: UnboundedReceiver<Event>,
    timers: Vec<JoinHandle<()>>,
}

impl RunLoop {
    /// Creates a new, empty run loop.
    pub fn new() -> RunLoop {
        let (sender, receiver) = mpsc::unbounded_channel();
        RunLoop {
            sender,
            receiver,
            timers: Vec::new(),
        }
    }

    /// Arms a one shot timer that delivers a tick after the given delay. The deadline is
    /// fixed now, not when the timer task first runs.
    pub fn add_event(&mut self, delay: Duration) {
        let deadline = Instant::now() + delay;
        let sender = self.sender.clone();

        self.timers.retain(|timer| !timer.is_finished());
        self.timers.push(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = sender.send(Event::Tick);
        }));
    }

    /// Creates a completion callback that reports into this loop.
    pub fn completion(&self) -> Completion {
        Completion {
            sender: self.sender.clone(),
        }
    }

    /// Waits for the next event. The loop holds a sender of its own, so this only returns
    /// None if the channel is closed out from under it.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Stops the loop. Returns the number of ticks that were armed but never handled,
    /// whether their timers were still running or had already fired.
    pub fn stop(&mut self) -> usize {
        let mut pending = 0;
        for timer in self.timers.drain(..) {
            if !timer.is_finished() {
                pending += 1;
                timer.abort();
            }
        }

        self.receiver.close();
        while let Ok(event) = self.receiver.try_recv() {
            if event == Event::Tick {
                pending += 1;
            }
        }
        pending
    }
}

impl Drop for RunLoop {
    fn drop(&mut self) {
        for timer in self.timers.iter() {
            timer.abort();
        }
    }
}
