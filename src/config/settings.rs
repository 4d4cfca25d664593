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

use config::{Config, Environment, File, FileFormat, Map};
use serde::Deserialize;
use tracing::debug;

use crate::dmx::SchedulerConfig;

use super::ConfigError;

/// The default OLA universe.
pub const DEFAULT_UNIVERSE: u32 = 0;
/// The default tick interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u32 = 50;
/// The default port of the OLA daemon.
pub const DEFAULT_OLA_PORT: u16 = 9010;

/// The environment variables that override settings.
const ENVIRONMENT_KEYS: [&str; 3] = ["UNIVERSE", "INTERVAL", "OLA_PORT"];

/// Settings for a run. Defaults are overridden by an optional YAML file, which is in turn
/// overridden by the UNIVERSE, INTERVAL and OLA_PORT environment variables.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// The OLA universe to send to.
    universe: u32,

    /// The tick interval in milliseconds.
    interval: u64,

    /// The port the OLA daemon listens on.
    ola_port: u16,
}

impl Settings {
    /// Loads the settings from the given file (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let environment: Map<String, String> = std::env::vars()
            .filter(|(key, _)| ENVIRONMENT_KEYS.contains(&key.as_str()))
            .collect();
        Self::load_with_environment(path, environment)
    }

    fn load_with_environment(
        path: Option<&Path>,
        environment: Map<String, String>,
    ) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder()
            .set_default("universe", i64::from(DEFAULT_UNIVERSE))?
            .set_default("interval", i64::from(DEFAULT_INTERVAL_MS))?
            .set_default("ola_port", i64::from(DEFAULT_OLA_PORT))?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }

        let settings: Settings = builder
            .add_source(
                Environment::default()
                    .source(Some(environment))
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if settings.interval == 0 {
            return Err(ConfigError::Invalid(
                "interval must be greater than zero".into(),
            ));
        }

        debug!(
            universe = settings.universe,
            interval_ms = settings.interval,
            ola_port = settings.ola_port,
            "Loaded settings."
        );
        Ok(settings)
    }

    /// Gets the OLA universe.
    pub fn universe(&self) -> u32 {
        self.universe
    }

    /// Gets the tick interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    /// Gets the OLA port.
    pub fn ola_port(&self) -> u16 {
        self.ola_port
    }
}

impl From<&Settings> for SchedulerConfig {
    fn from(settings: &Settings) -> Self {
        SchedulerConfig {
            universe: settings.universe(),
            interval: settings.interval(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, time::Duration};

    use config::Map;
    use serial_test::serial;

    use crate::{config::ConfigError, dmx::SchedulerConfig};

    use super::{Settings, DEFAULT_OLA_PORT};

    fn environment(vars: &[(&str, &str)]) -> Map<String, String> {
        vars.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() -> Result<(), Box<dyn Error>> {
        let settings = Settings::load_with_environment(None, environment(&[]))?;

        assert_eq!(0, settings.universe());
        assert_eq!(Duration::from_millis(50), settings.interval());
        assert_eq!(DEFAULT_OLA_PORT, settings.ola_port());
        Ok(())
    }

    #[test]
    fn test_universe_override() -> Result<(), Box<dyn Error>> {
        let settings = Settings::load_with_environment(None, environment(&[("UNIVERSE", "3")]))?;

        assert_eq!(3, settings.universe());
        assert_eq!(Duration::from_millis(50), settings.interval());
        Ok(())
    }

    #[test]
    fn test_interval_override_leaves_universe_alone() -> Result<(), Box<dyn Error>> {
        let settings =
            Settings::load_with_environment(None, environment(&[("INTERVAL", "200")]))?;

        assert_eq!(0, settings.universe());
        assert_eq!(Duration::from_millis(200), settings.interval());
        Ok(())
    }

    #[test]
    fn test_independent_overrides() -> Result<(), Box<dyn Error>> {
        let settings = Settings::load_with_environment(
            None,
            environment(&[("UNIVERSE", "7"), ("INTERVAL", "25"), ("OLA_PORT", "9100")]),
        )?;

        assert_eq!(7, settings.universe());
        assert_eq!(Duration::from_millis(25), settings.interval());
        assert_eq!(9100, settings.ola_port());
        Ok(())
    }

    #[test]
    fn test_file_then_environment() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("dmxset.yaml");
        fs::write(&path, "universe: 2\ninterval: 40\nola_port: 9011\n")?;

        let settings = Settings::load_with_environment(Some(path.as_path()), environment(&[]))?;
        assert_eq!(2, settings.universe());
        assert_eq!(Duration::from_millis(40), settings.interval());
        assert_eq!(9011, settings.ola_port());

        let settings = Settings::load_with_environment(
            Some(path.as_path()),
            environment(&[("INTERVAL", "100")]),
        )?;
        assert_eq!(2, settings.universe());
        assert_eq!(Duration::from_millis(100), settings.interval());
        Ok(())
    }

    #[test]
    fn test_missing_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nope.yaml");
        let result = Settings::load_with_environment(Some(path.as_path()), environment(&[]));

        assert!(matches!(result, Err(ConfigError::Load(_))));
        Ok(())
    }

    #[test]
    fn test_malformed_values() {
        assert!(
            Settings::load_with_environment(None, environment(&[("INTERVAL", "fast")])).is_err()
        );
        assert!(
            Settings::load_with_environment(None, environment(&[("OLA_PORT", "port")])).is_err()
        );
    }

    #[test]
    fn test_zero_interval() {
        assert!(matches!(
            Settings::load_with_environment(None, environment(&[("INTERVAL", "0")])),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_scheduler_config() -> Result<(), Box<dyn Error>> {
        let settings = Settings::load_with_environment(
            None,
            environment(&[("UNIVERSE", "5"), ("INTERVAL", "75")]),
        )?;

        assert_eq!(
            SchedulerConfig {
                universe: 5,
                interval: Duration::from_millis(75),
            },
            SchedulerConfig::from(&settings)
        );
        Ok(())
    }

    #[test]
    #[serial]
    fn test_process_environment() -> Result<(), Box<dyn Error>> {
        std::env::set_var("UNIVERSE", "12");
        std::env::set_var("INTERVAL", "20");
        let result = Settings::load(None);
        std::env::remove_var("UNIVERSE");
        std::env::remove_var("INTERVAL");

        let settings = result?;
        assert_eq!(12, settings.universe());
        assert_eq!(Duration::from_millis(20), settings.interval());
        Ok(())
    }
}
