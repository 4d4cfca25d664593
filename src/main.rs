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
use std::{path::PathBuf, process::ExitCode};

use clap::{crate_version, Parser, Subcommand};
use dmxset::{
    config::{Command, Mode, Settings},
    dmx::{DmxError, OlaClient, RunReport, Scheduler, SchedulerConfig},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Sets or fades DMX channels through OLA."
)]
struct Cli {
    /// The path to an optional YAML settings file. UNIVERSE, INTERVAL and OLA_PORT
    /// environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Commands>,

    /// Channel values. Without a subcommand, these are read as `set` values, or as
    /// `dim` values if the program name contains "dim".
    #[arg(allow_negative_numbers = true)]
    values: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sends one frame with the given channel intensities.
    Set {
        /// One intensity (0-255) per channel, starting at channel 1.
        #[arg(allow_negative_numbers = true)]
        values: Vec<String>,
    },
    /// Fades channels from a start to an end intensity.
    Dim {
        /// How long the fade takes, in milliseconds or as a duration string like 2s.
        duration: String,
        /// A start and end intensity (0-255) per channel, starting at channel 1.
        #[arg(allow_negative_numbers = true)]
        values: Vec<String>,
    },
}

/// Turns the command line into a command. An explicit subcommand wins over the program name.
fn resolve_command(
    program: &str,
    command: Option<Commands>,
    values: Vec<String>,
) -> Result<Command, DmxError> {
    let (mode, args) = match command {
        Some(Commands::Set { values }) => (Mode::Set, values),
        Some(Commands::Dim { duration, values }) => {
            let mut args = Vec::with_capacity(values.len() + 1);
            args.push(duration);
            args.extend(values);
            (Mode::Dim, args)
        }
        None => (Mode::from_program_name(program), values),
    };

    Command::parse(mode, &args)
}

fn run(cli: Cli, program: &str) -> Result<RunReport, DmxError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let command = resolve_command(program, cli.command, cli.values)?;
    command.validate(settings.interval())?;

    let client = OlaClient::connect(settings.ola_port())?;
    let mut scheduler = Scheduler::new(SchedulerConfig::from(&settings), client);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| {
            DmxError::TransmissionFailure(format!("unable to start the run loop: {}", err))
        })?;

    runtime.block_on(async {
        match command {
            Command::Set { channels } => scheduler.run_once(&channels).await,
            Command::Dim { duration, pairs } => scheduler.run_fade(&pairs, duration).await,
        }
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let program = std::env::args().next().unwrap_or_default();
    let cli = Cli::parse();

    match run(cli, &program) {
        Ok(report) => {
            info!(frames_sent = report.frames_sent, "Done.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(err = err.to_string(), "Unable to send DMX.");
            ExitCode::from(err.exit_code())
        }
    }
}
