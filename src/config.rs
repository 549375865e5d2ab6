//! Configuration management for the head gesture application

use crate::{
    action::{ActionCommands, ActionExecutor, CommandExecutor, GestureAction, LogExecutor},
    constants::DEFAULT_CHANNEL_CAPACITY,
    gesture::{GestureConfig, GestureKind},
    session::SessionOptions,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr, sync::Arc};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sensitivity and gesture bindings
    pub gesture: GestureConfig,

    /// Orientation input handling
    pub input: InputConfig,

    /// Action execution
    pub executor: ExecutorConfig,
}

/// Orientation input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Optional rate limit before recognition, in Hz
    pub throttle_hz: Option<f64>,

    /// Bound of the sample channel
    pub channel_capacity: usize,
}

/// Which executor runs the actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// Log actions only
    #[default]
    Log,
    /// Run the configured commands
    Command,
}

/// Action executor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Executor type
    pub kind: ExecutorKind,

    /// Commands for the command executor
    pub commands: ActionCommands,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            throttle_hz: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Command => f.write_str("command"),
        }
    }
}

impl FromStr for ExecutorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "command" | "cmd" => Ok(Self::Command),
            _ => Err(Error::ConfigError(format!("Unknown executor: {s}"))),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Serialize configuration to YAML text
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Snapshot handed to the recognition engine
    pub const fn gesture_config(&self) -> GestureConfig {
        self.gesture
    }

    /// Session tuning from the input section
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            throttle_hz: self.input.throttle_hz,
            channel_capacity: self.input.channel_capacity,
            ..SessionOptions::default()
        }
    }

    /// Create the configured action executor
    pub fn create_executor(&self) -> Arc<dyn ActionExecutor> {
        match self.executor.kind {
            ExecutorKind::Log => Arc::new(LogExecutor),
            ExecutorKind::Command => Arc::new(CommandExecutor::new(self.executor.commands.clone())),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(hz) = self.input.throttle_hz {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "Throttle rate must be a positive number of Hz, got {hz}"
                )));
            }
        }
        if self.input.channel_capacity == 0 {
            return Err(Error::ConfigError(
                "Channel capacity must be greater than 0".to_string(),
            ));
        }

        // Every bound action needs something to run
        if self.executor.kind == ExecutorKind::Command {
            for kind in [GestureKind::LeftFlick, GestureKind::RightFlick, GestureKind::Nod] {
                let action = self.gesture.bindings.get(kind);
                if action != GestureAction::Disabled && self.executor.commands.command_for(action).is_empty() {
                    return Err(Error::ConfigError(format!(
                        "{kind} is bound to {action} but no command is configured for it"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head Gesture Control Configuration

# Recognition
gesture:
  sensitivity: Medium          # Low | Medium | High
  bindings:
    left_flick: "Previous Track"
    right_flick: "Next Track"
    nod: "Play/Pause"           # or "Volume Up", "Volume Down", "Disabled"

# Orientation input
input:
  throttle_hz: null            # e.g. 10.0 to rate-limit samples before recognition
  channel_capacity: 256

# Action execution
executor:
  kind: log                    # log | command
  commands:
    play_pause: ["playerctl", "play-pause"]
    next_track: ["playerctl", "next"]
    previous_track: ["playerctl", "previous"]
    volume_up: ["playerctl", "volume", "0.1+"]
    volume_down: ["playerctl", "volume", "0.1-"]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Sensitivity;

    #[test]
    fn test_example_config_matches_defaults() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml("gesture:\n  sensitivity: high\n").unwrap();
        assert_eq!(config.gesture.sensitivity, Sensitivity::High);
        assert_eq!(config.gesture.bindings, Default::default());
        assert_eq!(config.input.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_invalid_throttle() {
        let mut config = Config::default();
        config.input.throttle_hz = Some(-1.0);
        assert!(config.validate().is_err());

        config.input.throttle_hz = Some(10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_command_executor_requires_commands() {
        let mut config = Config::default();
        config.executor.kind = ExecutorKind::Command;
        config.executor.commands.play_pause.clear();
        assert!(config.validate().is_err());

        config.gesture.bindings.nod = GestureAction::Disabled;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_executor_kind_parsing() {
        assert_eq!("log".parse::<ExecutorKind>().unwrap(), ExecutorKind::Log);
        assert_eq!("Command".parse::<ExecutorKind>().unwrap(), ExecutorKind::Command);
        assert!("applescript".parse::<ExecutorKind>().is_err());
    }

    #[test]
    fn test_create_executor() {
        let mut config = Config::default();
        assert_eq!(config.create_executor().name(), "LogExecutor");
        config.executor.kind = ExecutorKind::Command;
        assert_eq!(config.create_executor().name(), "CommandExecutor");
    }
}
