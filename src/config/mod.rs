//! Locating, reading and writing `odmcp.toml`.
//!
//! Every setting has a default, so a missing file is not an error. A file that
//! does exist is parsed strictly and its bounds are checked before anything
//! uses it: a zero timeout or page bound fails here, not on the first call.

pub mod schema;

pub use schema::{EndpointConfig, OdmcpConfig, PeopleSearchConfig};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

const HOME_DIR: &str = ".odmcp";
const CONFIG_FILE: &str = "odmcp.toml";

/// `~/.odmcp`, or `.odmcp` in the working directory when there is no home.
pub fn default_home_dir() -> PathBuf {
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(HOME_DIR),
        None => PathBuf::from(HOME_DIR),
    }
}

pub fn default_config_path() -> PathBuf {
    default_home_dir().join(CONFIG_FILE)
}

/// Expand a leading `~` in a user-supplied path.
pub fn resolve_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Read `path` into a checked config. Absent file means defaults.
pub fn load_config(path: &Path) -> Result<OdmcpConfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(OdmcpConfig::default());
        }
        Err(e) => return Err(e).with_context(|| format!("Cannot read {}", path.display())),
    };

    let config: OdmcpConfig = toml::from_str(&raw)
        .with_context(|| format!("{} is not a valid odmcp config", path.display()))?;
    check_bounds(&config).with_context(|| format!("Rejected settings in {}", path.display()))?;
    Ok(config)
}

/// Timeouts and the page bound must be positive.
fn check_bounds(config: &OdmcpConfig) -> Result<()> {
    let positive = [
        ("request_timeout_secs", config.request_timeout_secs),
        ("paging_timeout_secs", config.paging_timeout_secs),
        ("max_pages", u64::from(config.max_pages)),
    ];
    for (key, value) in positive {
        if value == 0 {
            bail!("`{key}` must be at least 1");
        }
    }
    Ok(())
}

/// Write `config` as pretty TOML, creating parent directories.
pub fn save_config(config: &OdmcpConfig, path: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Cannot render config as TOML")?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    std::fs::write(path, rendered).with_context(|| format!("Cannot write {}", path.display()))
}
