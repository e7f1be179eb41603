//! Persisted daemon configuration (spec §6 "A separate plaintext config
//! file"). Loaded once at startup from a TOML file and held by the facade
//! for the lifetime of the process; `get_setting`/`set_setting` round-trip
//! through the same struct rather than a separate opaque map, so a setting
//! read back is always one the config file itself understands.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Defaults match the Python original's `darkwallet/settings.py`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub gap_limit: u32,
    pub master_pocket_name: String,
    pub explorer_url: String,
    pub testnet_url: String,
    pub query_expire_time: u64,
    pub socks5: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8888,
            gap_limit: dw_common::DEFAULT_GAP_LIMIT,
            master_pocket_name: dw_common::DEFAULT_MASTER_POCKET_NAME.to_string(),
            explorer_url: "https://blockstream.info/api".to_string(),
            testnet_url: "https://blockstream.info/testnet/api".to_string(),
            query_expire_time: 30,
            socks5: None,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Reads a single named field as a string, for `dw-daemon`'s
    /// `dw_get_setting` command (spec §4.H). Unknown names are `not_found`.
    pub fn get(&self, name: &str) -> Result<String, Error> {
        match name {
            "port" => Ok(self.port.to_string()),
            "gap_limit" => Ok(self.gap_limit.to_string()),
            "master_pocket_name" => Ok(self.master_pocket_name.clone()),
            "explorer_url" => Ok(self.explorer_url.clone()),
            "testnet_url" => Ok(self.testnet_url.clone()),
            "query_expire_time" => Ok(self.query_expire_time.to_string()),
            "socks5" => Ok(self.socks5.clone().unwrap_or_default()),
            other => Err(Error::NotFound(other.to_string())),
        }
    }

    /// Writes a single named field from its string form. `socks5 = ""`
    /// clears the setting.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), Error> {
        match name {
            "port" => self.port = value.parse().map_err(|_| Error::InvalidSetting(name.to_string()))?,
            "gap_limit" => self.gap_limit = value.parse().map_err(|_| Error::InvalidSetting(name.to_string()))?,
            "master_pocket_name" => self.master_pocket_name = value.to_string(),
            "explorer_url" => self.explorer_url = value.to_string(),
            "testnet_url" => self.testnet_url = value.to_string(),
            "query_expire_time" => self.query_expire_time = value.parse().map_err(|_| Error::InvalidSetting(name.to_string()))?,
            "socks5" => self.socks5 = if value.is_empty() { None } else { Some(value.to_string()) },
            other => return Err(Error::NotFound(other.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.set("port", "9000").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.port, 9000);
        assert_eq!(loaded.gap_limit, Settings::default().gap_limit);
    }

    #[test]
    fn get_and_set_round_trip_named_fields() {
        let mut settings = Settings::default();
        settings.set("explorer_url", "https://example.test/api").unwrap();
        assert_eq!(settings.get("explorer_url").unwrap(), "https://example.test/api");
    }

    #[test]
    fn unknown_setting_name_is_not_found() {
        let settings = Settings::default();
        assert!(matches!(settings.get("does_not_exist"), Err(Error::NotFound(_))));
    }
}
