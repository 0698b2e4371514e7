//! CLI argument definitions for the Switchboard binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Environment variable naming the configuration file.
pub const ENV_CONFIG: &str = "SWITCHBOARD_CONFIG";

/// Switchboard: a terminal assistant that routes each message to the right tool.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Session key. Defaults to "terminal".
    #[arg(short = 's', long = "session")]
    pub session: Option<String>,

    /// Use mock collaborators instead of the network, SMTP and tesseract.
    #[arg(long = "offline")]
    pub offline: bool,
}

impl CliArgs {
    /// Priority: --config flag > SWITCHBOARD_CONFIG > ~/.switchboard/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var(ENV_CONFIG) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| config_level.to_string())
    }

    pub fn session_key(&self) -> String {
        self.session
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "terminal".to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".switchboard").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".switchboard").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = CliArgs::parse_from([
            "switchboard",
            "--config",
            "/tmp/sb.toml",
            "-l",
            "debug",
            "--session",
            "work",
            "--offline",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/sb.toml"));
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(args.session_key(), "work");
        assert!(args.offline);
    }

    #[test]
    fn test_defaults_fall_back_to_config() {
        let args = CliArgs::parse_from(["switchboard"]);
        assert_eq!(args.resolve_log_level("warn"), "warn");
        assert_eq!(args.session_key(), "terminal");
        assert!(!args.offline);
    }
}
