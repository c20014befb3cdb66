//! Daemon configuration from the environment.
//!
//! | Variable                     | Default                              |
//! |------------------------------|--------------------------------------|
//! | `CADENCE_STATE_DIR`          | `$XDG_STATE_HOME/cadence`, else      |
//! |                              | `$HOME/.local/state/cadence`         |
//! | `CADENCE_API_ADDR`           | `127.0.0.1:7786`                     |
//! | `CADENCE_RESUME_POLICY`      | `restart` (or `preserve-phase`)      |
//! | `CADENCE_ALERT_COMMAND`      | unset: alerts are logged             |
//! | `CADENCE_ALERT_TIMEOUT_SECS` | `5`                                  |
//! | `CADENCE_WATCHDOG_SECS`      | `60`                                 |
//! | `CADENCE_STALE_GRACE_SECS`   | `30`                                 |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::alarm::{DEFAULT_STALE_GRACE, DEFAULT_WATCHDOG_PERIOD, ResumePolicy};
use crate::error::{Error, Result};
use crate::notifier::DEFAULT_ALERT_TIMEOUT;
use crate::store::STATE_FILE_NAME;

pub const DEFAULT_API_ADDR: &str = "127.0.0.1:7786";

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub state_dir: PathBuf,
    pub api_addr: SocketAddr,
    pub resume_policy: ResumePolicy,
    /// Shell command run for every alert. `None` logs alerts instead.
    pub alert_command: Option<String>,
    pub alert_timeout: Duration,
    pub watchdog_period: Duration,
    /// How late a fire may be before the watchdog treats it as lost.
    pub stale_grace: Duration,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let state_dir = match get("CADENCE_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_state_dir(&get)?,
        };

        let api_addr = match get("CADENCE_API_ADDR") {
            Some(addr) => parse("CADENCE_API_ADDR", &addr)?,
            None => parse("CADENCE_API_ADDR", DEFAULT_API_ADDR)?,
        };

        let resume_policy = match get("CADENCE_RESUME_POLICY") {
            Some(policy) => parse("CADENCE_RESUME_POLICY", &policy)?,
            None => ResumePolicy::default(),
        };

        Ok(Self {
            state_dir,
            api_addr,
            resume_policy,
            alert_command: get("CADENCE_ALERT_COMMAND"),
            alert_timeout: secs(&get, "CADENCE_ALERT_TIMEOUT_SECS", DEFAULT_ALERT_TIMEOUT, 1)?,
            watchdog_period: secs(&get, "CADENCE_WATCHDOG_SECS", DEFAULT_WATCHDOG_PERIOD, 1)?,
            stale_grace: secs(&get, "CADENCE_STALE_GRACE_SECS", DEFAULT_STALE_GRACE, 0)?,
        })
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE_NAME)
    }
}

fn default_state_dir(get: &impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(xdg) = get("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cadence"));
    }
    match get("HOME") {
        Some(home) => Ok(PathBuf::from(home).join(".local/state/cadence")),
        None => Err(Error::InvalidConfig(
            "cannot locate a state directory; set CADENCE_STATE_DIR".into(),
        )),
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{key}: cannot parse {value:?}")))
}

fn secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
    min: u64,
) -> Result<Duration> {
    let Some(value) = get(key) else {
        return Ok(default);
    };
    let secs: u64 = parse(key, &value)?;
    if secs < min {
        return Err(Error::InvalidConfig(format!(
            "{key}: must be at least {min} seconds"
        )));
    }
    Ok(Duration::from_secs(secs))
}
