use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a whitelist run
///
/// The defaults mirror the paths used on the mail host; a TOML file can
/// override any of them for testing or non-standard layouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mail log scanned for successful logins
    pub log_path: PathBuf,
    /// SQLite journal of extracted login events
    pub db_path: PathBuf,
    /// Draft file consumed by the fail2ban ignoreip configuration
    pub draft_path: PathBuf,
    /// Journal entries older than this many days are pruned each run
    pub records_max_age_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_path: PathBuf::from("/var/log/gn_f2b_mail.log"),
            db_path: PathBuf::from("/etc/fail2ban/jail.d/gn_whitelist.db"),
            draft_path: PathBuf::from("/etc/fail2ban/jail.d/gn-ignoreip.draft"),
            records_max_age_days: 30,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
