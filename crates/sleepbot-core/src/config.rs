use std::{env, fs, path::Path, time::Duration};

use chrono_tz::Tz;

use crate::{errors::Error, messaging::throttled::ThrottleConfig, Result};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Forum topic that announcements (and replies that cannot edit) go to.
    pub topic_id: Option<i32>,
    pub timezone: Tz,
    pub throttle: ThrottleConfig,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let topic_id = match lookup("TOPIC_ID").and_then(non_empty) {
            Some(raw) => Some(raw.trim().parse::<i32>().map_err(|_| {
                Error::Config(format!("TOPIC_ID must be an integer, got {raw:?}"))
            })?),
            None => None,
        };

        let timezone = match lookup("SLEEP_TIMEZONE").and_then(non_empty) {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|e| Error::Config(format!("SLEEP_TIMEZONE: {e}")))?,
            None => DEFAULT_TIMEZONE,
        };

        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: parse_u64(&lookup, "THROTTLE_GLOBAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: parse_u64(&lookup, "THROTTLE_PER_CHAT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        Ok(Self {
            telegram_bot_token,
            topic_id,
            timezone,
            throttle,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

/// Unset or blank is `None`; anything else must be a non-negative integer.
fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = cfg(&[("TELEGRAM_BOT_TOKEN", "abc")]).unwrap();
        assert_eq!(c.telegram_bot_token, "abc");
        assert_eq!(c.topic_id, None);
        assert_eq!(c.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(c.throttle, ThrottleConfig::default());
    }

    #[test]
    fn falls_back_to_bot_token() {
        let c = cfg(&[("TELEGRAM_BOT_TOKEN", " "), ("BOT_TOKEN", "xyz")]).unwrap();
        assert_eq!(c.telegram_bot_token, "xyz");
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(cfg(&[]), Err(Error::Config(_))));
    }

    #[test]
    fn parses_topic_timezone_and_throttle() {
        let c = cfg(&[
            ("BOT_TOKEN", "t"),
            ("TOPIC_ID", " 4 "),
            ("SLEEP_TIMEZONE", "Europe/Warsaw"),
            ("THROTTLE_PER_CHAT_MS", "0"),
        ])
        .unwrap();
        assert_eq!(c.topic_id, Some(4));
        assert_eq!(c.timezone, chrono_tz::Europe::Warsaw);
        assert_eq!(c.throttle.per_chat_min_interval, Duration::ZERO);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(cfg(&[("BOT_TOKEN", "t"), ("TOPIC_ID", "four")]).is_err());
        assert!(cfg(&[("BOT_TOKEN", "t"), ("SLEEP_TIMEZONE", "Mars/Olympus")]).is_err());
    }

    #[test]
    fn rejects_bad_throttle_values() {
        for key in ["THROTTLE_GLOBAL_MS", "THROTTLE_PER_CHAT_MS"] {
            for bad in ["fast", "-5", "1.5"] {
                let err = cfg(&[("BOT_TOKEN", "t"), (key, bad)]).unwrap_err();
                assert!(
                    matches!(&err, Error::Config(msg) if msg.contains(key)),
                    "{key}={bad}: {err}"
                );
            }
        }
        // Blank still means "use the default".
        let c = cfg(&[("BOT_TOKEN", "t"), ("THROTTLE_GLOBAL_MS", " ")]).unwrap();
        assert_eq!(c.throttle, ThrottleConfig::default());
    }

    #[test]
    fn dotenv_parsing() {
        let parsed = parse_dotenv("# comment\nBOT_TOKEN=\"abc\"\n\nTOPIC_ID = 4\nbroken\n=x\n");
        assert_eq!(
            parsed,
            vec![
                ("BOT_TOKEN".to_string(), "abc".to_string()),
                ("TOPIC_ID".to_string(), "4".to_string()),
            ]
        );
    }
}
