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

use tracing::{debug, error, info, span, Instrument, Level};

use super::{
    fade,
    runloop::{Event, RunLoop},
    DmxClient, DmxError, FadePair, Frame, SchedulerConfig, SendOutcome, UNIVERSE_SIZE,
};

/// What happened during a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// The number of frames handed to the DMX client.
    pub frames_sent: u32,
    /// The number of ticks that were handled.
    pub ticks: u32,
    /// Ticks that had already been re-armed when the run stopped. A fade always stops
    /// with one of these outstanding, since it re-arms before checking whether it's done.
    pub pending_ticks: usize,
}

/// The frames a run produces.
#[derive(Clone, Copy)]
enum Program<'a> {
    /// A single frame with these values.
    Static(&'a [u8]),
    /// One interpolated frame per tick.
    Fade {
        pairs: &'a [FadePair],
        total_ticks: u32,
    },
}

impl Program<'_> {
    /// Returns true if ticks re-arm themselves.
    fn is_recurring(&self) -> bool {
        matches!(self, Program::Fade { .. })
    }

    /// Builds the frame for the given tick.
    fn frame(&self, tick: u32) -> Result<Frame, DmxError> {
        match self {
            Program::Static(channels) => Ok(channels.to_vec()),
            Program::Fade { pairs, total_ticks } => fade::interpolate(tick, *total_ticks, pairs),
        }
    }

    /// Returns true once the given tick has finished the program.
    fn is_done(&self, tick: u32) -> bool {
        match self {
            Program::Static(_) => true,
            Program::Fade { total_ticks, .. } => tick >= *total_ticks,
        }
    }
}

/// The states a run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing is armed yet.
    Idle,
    /// A timer is armed and no frame is outstanding.
    Armed,
    /// A frame is with the client. `held_tick` is set if a timer fired in the meantime.
    Sending { held_tick: bool },
    /// The run is over.
    Stopped,
}

/// What the run loop should do next.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    /// Arm a timer for the next tick.
    Arm,
    /// Hand this frame to the client.
    Send(Frame),
    /// Stop the run loop.
    Stop,
}

/// The schedule state of a single run. This never touches the clock or the client; it
/// only turns events into actions.
struct Run<'a> {
    program: Program<'a>,
    state: State,
    tick: u32,
    frames_sent: u32,
    held_at_stop: bool,
    failure: Option<String>,
}

impl<'a> Run<'a> {
    fn new(program: Program<'a>) -> Run<'a> {
        Run {
            program,
            state: State::Idle,
            tick: 0,
            frames_sent: 0,
            held_at_stop: false,
            failure: None,
        }
    }

    /// Arms the first tick.
    fn start(&mut self) -> Vec<Action> {
        if self.state != State::Idle {
            return Vec::new();
        }
        self.state = State::Armed;
        vec![Action::Arm]
    }

    /// Handles a fired timer. A recurring program re-arms before it does anything else so
    /// that the time spent building and sending the frame does not delay the next tick.
    fn tick(&mut self) -> Result<Vec<Action>, DmxError> {
        match self.state {
            State::Armed => {}
            State::Sending { .. } => {
                // Only one frame may be outstanding, so hold this tick until the client is done.
                self.state = State::Sending { held_tick: true };
                return Ok(Vec::new());
            }
            State::Idle | State::Stopped => return Ok(Vec::new()),
        }

        let mut actions = Vec::with_capacity(2);
        if self.program.is_recurring() {
            actions.push(Action::Arm);
        }

        self.tick += 1;
        let frame = self.program.frame(self.tick)?;
        self.frames_sent += 1;
        self.state = State::Sending { held_tick: false };
        actions.push(Action::Send(frame));
        Ok(actions)
    }

    /// Handles the client's verdict on the outstanding frame.
    fn on_send_complete(&mut self, outcome: SendOutcome) -> Result<Vec<Action>, DmxError> {
        let held_tick = match self.state {
            State::Sending { held_tick } => held_tick,
            _ => return Ok(Vec::new()),
        };

        if let SendOutcome::Failed(reason) = outcome {
            self.failure = Some(reason);
            return Ok(self.stop(held_tick));
        }

        if self.program.is_done(self.tick) {
            return Ok(self.stop(held_tick));
        }

        self.state = State::Armed;
        if held_tick {
            return self.tick();
        }
        Ok(Vec::new())
    }

    fn stop(&mut self, held_tick: bool) -> Vec<Action> {
        self.held_at_stop = held_tick;
        self.state = State::Stopped;
        vec![Action::Stop]
    }
}

/// Drives frames to a DMX client on a fixed tick interval, either once or as a fade.
pub struct Scheduler<C: DmxClient> {
    config: SchedulerConfig,
    client: C,
}

impl<C: DmxClient> Scheduler<C> {
    /// Creates a new scheduler.
    pub fn new(config: SchedulerConfig, client: C) -> Scheduler<C> {
        Scheduler { config, client }
    }

    /// Sends the given channel values once, one interval from now. The run stops after the
    /// first completion no matter what it reports.
    pub async fn run_once(&mut self, channels: &[u8]) -> Result<RunReport, DmxError> {
        check_channel_count(channels.len())?;

        info!(
            universe = self.config.universe,
            channels = channels.len(),
            "Setting DMX channels."
        );
        let span = span!(Level::INFO, "set (dmx)", universe = self.config.universe);
        self.drive(Program::Static(channels)).instrument(span).await
    }

    /// Fades the given channels from their start to their end values over the duration,
    /// one frame per interval. The last frame carries the end values whenever the change
    /// divides evenly into ticks.
    pub async fn run_fade(
        &mut self,
        pairs: &[FadePair],
        duration: Duration,
    ) -> Result<RunReport, DmxError> {
        check_channel_count(pairs.len())?;
        let total_ticks = fade::total_ticks(duration, self.config.interval)?;

        info!(
            universe = self.config.universe,
            channels = pairs.len(),
            duration_ms = duration.as_millis() as u64,
            total_ticks,
            "Fading DMX channels."
        );
        let span = span!(Level::INFO, "fade (dmx)", universe = self.config.universe);
        self.drive(Program::Fade { pairs, total_ticks })
            .instrument(span)
            .await
    }

    async fn drive(&mut self, program: Program<'_>) -> Result<RunReport, DmxError> {
        let mut run_loop = RunLoop::new();
        let mut run = Run::new(program);
        let mut actions = run.start();

        'run: loop {
            for action in actions.drain(..) {
                match action {
                    Action::Arm => run_loop.add_event(self.config.interval),
                    Action::Send(frame) => {
                        debug!(
                            tick = run.tick,
                            universe = self.config.universe,
                            frame = ?frame,
                            "Sending DMX frame."
                        );
                        self.client
                            .send_dmx(self.config.universe, &frame, run_loop.completion());
                    }
                    Action::Stop => break 'run,
                }
            }

            actions = match run_loop.next_event().await {
                Some(Event::Tick) => run.tick()?,
                Some(Event::SendComplete(outcome)) => run.on_send_complete(outcome)?,
                None => break,
            };
        }

        let pending_ticks = run_loop.stop() + usize::from(run.held_at_stop);
        if let Some(reason) = run.failure {
            error!(
                err = reason.as_str(),
                tick = run.tick,
                "DMX frame was not accepted, stopping."
            );
            return Err(DmxError::TransmissionFailure(reason));
        }

        let report = RunReport {
            frames_sent: run.frames_sent,
            ticks: run.tick,
            pending_ticks,
        };
        info!(
            frames_sent = report.frames_sent,
            pending_ticks = report.pending_ticks,
            "DMX run finished."
        );
        Ok(report)
    }
}

/// A run needs at least one channel and no more than a universe holds.
pub(crate) fn check_channel_count(count: usize) -> Result<(), DmxError> {
    if count == 0 {
        return Err(DmxError::InvalidConfiguration(
            "no channel values were given".into(),
        ));
    }
    if count > UNIVERSE_SIZE {
        return Err(DmxError::InvalidConfiguration(format!(
            "{} channels were given but a universe only has {}",
            count, UNIVERSE_SIZE
        )));
    }
    Ok(())
}
