//! Settings read from the environment at startup.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{FixedOffset, Local, Offset};

const DATABASE_VAR: &str = "TRIPSPLIT_DATABASE";
const UTC_OFFSET_VAR: &str = "TRIPSPLIT_UTC_OFFSET_MINUTES";
const DEFAULT_DATABASE: &str = "tripsplit.db";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_path: PathBuf,
    /// Time zone used to decide which day a bill belongs to.
    pub utc_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(get: F) -> anyhow::Result<Config> {
        let database_path = get(DATABASE_VAR)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
            .into();

        let utc_offset = match get(UTC_OFFSET_VAR) {
            Some(minutes) => {
                let minutes: i32 = minutes
                    .trim()
                    .parse()
                    .with_context(|| format!("{UTC_OFFSET_VAR} must be a number of minutes"))?;
                minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .with_context(|| format!("{UTC_OFFSET_VAR} is out of range: {minutes}"))?
            }
            None => Local::now().offset().fix(),
        };

        Ok(Config {
            database_path,
            utc_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_from_vars() -> anyhow::Result<()> {
        let config = Config::from_vars(vars(&[
            (DATABASE_VAR, "/tmp/trips.db"),
            (UTC_OFFSET_VAR, "480"),
        ]))?;
        assert_eq!(config.database_path, PathBuf::from("/tmp/trips.db"));
        assert_eq!(config.utc_offset.local_minus_utc(), 8 * 3600);

        let config = Config::from_vars(vars(&[(UTC_OFFSET_VAR, "-300")]))?;
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(config.utc_offset.local_minus_utc(), -5 * 3600);
        Ok(())
    }

    #[test]
    fn test_config_invalid_offset() {
        assert!(Config::from_vars(vars(&[(UTC_OFFSET_VAR, "eight")])).is_err());
        assert!(Config::from_vars(vars(&[(UTC_OFFSET_VAR, "100000")])).is_err());
        assert!(Config::from_vars(vars(&[(UTC_OFFSET_VAR, "100000000")])).is_err());
        assert!(Config::from_vars(vars(&[(UTC_OFFSET_VAR, "-2147483648")])).is_err());
    }
}
