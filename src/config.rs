//! Application-level configuration loading, including game timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BALANZA_BACK_CONFIG_PATH";

const DEFAULT_TICK_MS: u64 = 1_000;
const DEFAULT_TURN_TIMEOUT_TICKS: u32 = 60;
const DEFAULT_COUNTDOWN_TICKS: u32 = 20;
const DEFAULT_FULL_ROSTER_COUNTDOWN_TICKS: u32 = 5;
const DEFAULT_FULL_ROSTER_SIZE: usize = 10;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Timing rules of the group game, expressed in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTimings {
    /// Length of one tick.
    pub tick: Duration,
    /// Ticks a turn holder has before being eliminated.
    pub turn_timeout_ticks: u32,
    /// Countdown length for a regular even roster.
    pub countdown_ticks: u32,
    /// Countdown length once the roster is full.
    pub full_roster_countdown_ticks: u32,
    /// Roster size considered full.
    pub full_roster_size: usize,
}

impl GameTimings {
    /// Countdown length for a roster of `roster_size` players.
    pub fn countdown_for(&self, roster_size: usize) -> u32 {
        if roster_size == self.full_roster_size {
            self.full_roster_countdown_ticks
        } else {
            self.countdown_ticks
        }
    }

    /// Wall-clock duration of the turn timeout.
    pub fn turn_timeout(&self) -> Duration {
        self.tick * self.turn_timeout_ticks
    }
}

impl Default for GameTimings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            turn_timeout_ticks: DEFAULT_TURN_TIMEOUT_TICKS,
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            full_roster_countdown_ticks: DEFAULT_FULL_ROSTER_COUNTDOWN_TICKS,
            full_roster_size: DEFAULT_FULL_ROSTER_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    timings: GameTimings,
    store_timeout: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        tick_ms = app_config.timings.tick.as_millis() as u64,
                        turn_timeout_ticks = app_config.timings.turn_timeout_ticks,
                        "loaded game timings from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Build a configuration with explicit timings, keeping the other defaults.
    pub fn with_timings(timings: GameTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    /// Group game timings.
    pub fn timings(&self) -> GameTimings {
        self.timings
    }

    /// Upper bound for a single storage call.
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timings: GameTimings::default(),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    tick_ms: Option<u64>,
    turn_timeout_ticks: Option<u32>,
    countdown_ticks: Option<u32>,
    full_roster_countdown_ticks: Option<u32>,
    full_roster_size: Option<usize>,
    store_timeout_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = GameTimings::default();
        let timings = GameTimings {
            tick: value
                .tick_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick),
            turn_timeout_ticks: value
                .turn_timeout_ticks
                .filter(|ticks| *ticks > 0)
                .unwrap_or(defaults.turn_timeout_ticks),
            countdown_ticks: value
                .countdown_ticks
                .filter(|ticks| *ticks > 0)
                .unwrap_or(defaults.countdown_ticks),
            full_roster_countdown_ticks: value
                .full_roster_countdown_ticks
                .filter(|ticks| *ticks > 0)
                .unwrap_or(defaults.full_roster_countdown_ticks),
            full_roster_size: value
                .full_roster_size
                .unwrap_or(defaults.full_roster_size),
        };

        Self {
            timings,
            store_timeout: Duration::from_millis(
                value.store_timeout_ms.unwrap_or(DEFAULT_STORE_TIMEOUT_MS),
            ),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
