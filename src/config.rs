//! Profile configuration file.
//!
//! YAML file holding named host profiles plus a default-profile pointer,
//! kept in the user's home directory. Loading fills in the port and
//! protocol defaults; saving writes owner-only permissions since the
//! file carries credentials.

use crate::error::{ZmError, ZmResult};
use crate::types::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = ".zmconfig";
pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_PROTOCOL: &str = "ftp";

/// One saved host profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub host: String,
    #[serde(default)]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// "ftp" or "zosmf".
    #[serde(default)]
    pub protocol: String,
    /// High-level qualifier used as the default dataset pattern.
    #[serde(default)]
    pub hlq: String,
    #[serde(default)]
    pub uss_home: String,
}

impl Profile {
    /// Turn the profile into a transport config.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(
            &self.host,
            self.port,
            &self.user,
            &self.password,
            &self.protocol,
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub default_profile: String,
}

impl Config {
    /// Load the config from `path`, or from `~/.zmconfig` when `None`.
    pub fn load(path: Option<&Path>) -> ZmResult<Self> {
        let path = resolve_path(path)?;
        let data = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ZmError::invalid_config(format!(
                    "config file not found: {}\nrun the setup command to create one",
                    path.display()
                ))
            } else {
                ZmError::io_error(format!("cannot read config file: {}", e))
            }
        })?;

        let mut cfg: Config = serde_yaml::from_str(&data)
            .map_err(|e| ZmError::invalid_config(format!("invalid config file: {}", e)))?;

        for profile in cfg.profiles.values_mut() {
            if profile.port == 0 {
                profile.port = DEFAULT_PORT;
            }
            if profile.protocol.is_empty() {
                profile.protocol = DEFAULT_PROTOCOL.to_string();
            }
        }

        Ok(cfg)
    }

    /// Save the config to `path`, or to `~/.zmconfig` when `None`.
    pub fn save(&self, path: Option<&Path>) -> ZmResult<()> {
        let path = resolve_path(path)?;
        let data = serde_yaml::to_string(self)
            .map_err(|e| ZmError::invalid_config(format!("cannot serialize config: {}", e)))?;
        fs::write(&path, data)
            .map_err(|e| ZmError::io_error(format!("cannot write config file: {}", e)))?;

        // The file holds passwords.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                .map_err(|e| ZmError::io_error(format!("cannot set config permissions: {}", e)))?;
        }

        Ok(())
    }

    /// Look up a profile by name, falling back to the default profile.
    pub fn profile(&self, name: Option<&str>) -> ZmResult<&Profile> {
        let name = match name {
            Some(n) => n,
            None if !self.default_profile.is_empty() => self.default_profile.as_str(),
            None => {
                return Err(ZmError::invalid_config(
                    "no profile named and no default profile set",
                ))
            }
        };
        self.profiles
            .get(name)
            .ok_or_else(|| ZmError::invalid_config(format!("unknown profile: {}", name)))
    }
}

fn resolve_path(path: Option<&Path>) -> ZmResult<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => dirs::home_dir()
            .map(|home| home.join(DEFAULT_CONFIG_FILE))
            .ok_or_else(|| ZmError::invalid_config("cannot find home directory")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        let mut profiles = HashMap::new();
        profiles.insert(
            "prod".to_string(),
            Profile {
                host: "mvs1.example.com".into(),
                port: 21,
                user: "FALZONE".into(),
                password: "secret".into(),
                protocol: "ftp".into(),
                hlq: "FALZONE".into(),
                uss_home: "/u/falzone".into(),
            },
        );
        Config {
            profiles,
            default_profile: "prod".to_string(),
        }
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".zmconfig");

        let cfg = sample_config();
        cfg.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.default_profile, "prod");
        let p = loaded.profile(None).unwrap();
        assert_eq!(p.host, "mvs1.example.com");
        assert_eq!(p.user, "FALZONE");
    }

    #[test]
    fn load_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".zmconfig");
        fs::write(
            &path,
            "profiles:\n  dev:\n    host: mvs2.example.com\n    user: USER1\n",
        )
        .unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        let p = loaded.profiles.get("dev").unwrap();
        assert_eq!(p.port, DEFAULT_PORT);
        assert_eq!(p.protocol, DEFAULT_PROTOCOL);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope"))).unwrap_err();
        assert!(err.message.contains("config file not found"));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let cfg = sample_config();
        assert!(cfg.profile(Some("staging")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".zmconfig");
        sample_config().save(Some(&path)).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
