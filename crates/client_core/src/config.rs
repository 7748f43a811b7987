use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared::domain::{DeviceId, FancyId, ParticipantId};
use thiserror::Error;
use url::Url;

pub const DEFAULT_SETTINGS_PATH: &str = "panel.toml";

const PUSH_PATH: &str = "/sock";
const FALLBACK_PATH: &str = "/cgi-bin/fallback.cgi";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("server url must start with http:// or https://, got scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("at least one binary device must be configured")]
    NoDevices,
    #[error("device '{0}' is configured more than once")]
    DuplicateDevice(String),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("{participants} scene participants configured for {devices} devices")]
    SceneParticipantsMismatch { participants: usize, devices: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSettings {
    pub server_url: String,
    pub ws_url: Option<String>,
    pub fallback_url: Option<String>,
    pub push_enabled: bool,
    pub poll_interval_secs: u64,
    pub push_connect_timeout_ms: u64,
    pub devices: Vec<DeviceId>,
    pub device_topic_prefix: String,
    pub script_topic: String,
    pub multi_participant_script: String,
    pub scene_participants: Vec<ParticipantId>,
    pub scene_targets: Vec<String>,
    pub scene_select_all_target: String,
    pub fancy_lights: Vec<FancyId>,
    pub fancy_topic_prefix: String,
    pub fancy_topic_suffix: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1".into(),
            ws_url: None,
            fallback_url: None,
            push_enabled: true,
            poll_interval_secs: 30,
            push_connect_timeout_ms: 3000,
            devices: (1..=6)
                .map(|n| DeviceId(format!("basiclight{n}")))
                .collect(),
            device_topic_prefix: "action/GoLightCtrl/".into(),
            script_topic: "action/ceilingscripts/activatescript".into(),
            multi_participant_script: "redshift".into(),
            scene_participants: (1..=6).map(ParticipantId::Index).collect(),
            scene_targets: (1..=6)
                .map(|n| n.to_string())
                .chain(std::iter::once("A".to_string()))
                .collect(),
            scene_select_all_target: "A".into(),
            fancy_lights: vec![FancyId::new("ceiling1")],
            fancy_topic_prefix: "action/".into(),
            fancy_topic_suffix: "/light".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server_url: Option<String>,
    ws_url: Option<String>,
    fallback_url: Option<String>,
    push_enabled: Option<bool>,
    poll_interval_secs: Option<u64>,
    push_connect_timeout_ms: Option<u64>,
    devices: Option<Vec<DeviceId>>,
    device_topic_prefix: Option<String>,
    script_topic: Option<String>,
    multi_participant_script: Option<String>,
    scene_participants: Option<Vec<ParticipantId>>,
    scene_targets: Option<Vec<String>>,
    scene_select_all_target: Option<String>,
    fancy_lights: Option<Vec<FancyId>>,
    fancy_topic_prefix: Option<String>,
    fancy_topic_suffix: Option<String>,
}

impl PanelSettings {
    pub fn device_topic(&self, device: &DeviceId) -> String {
        format!("{}{}", self.device_topic_prefix, device)
    }

    pub fn fancy_topic(&self, fancy: &FancyId) -> String {
        format!(
            "{}{}{}",
            self.fancy_topic_prefix, fancy, self.fancy_topic_suffix
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn push_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.push_connect_timeout_ms)
    }

    pub fn push_url(&self) -> Result<Url, ConfigError> {
        if let Some(ws_url) = &self.ws_url {
            return parse_url(ws_url);
        }
        let base = parse_url(&self.server_url)?;
        let scheme = match base.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        let mut url = join_url(&base, PUSH_PATH)?;
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(base.scheme().to_string()))?;
        Ok(url)
    }

    pub fn fallback_url(&self) -> Result<Url, ConfigError> {
        if let Some(fallback_url) = &self.fallback_url {
            return parse_url(fallback_url);
        }
        let base = parse_url(&self.server_url)?;
        match base.scheme() {
            "http" | "https" => join_url(&base, FALLBACK_PATH),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device) {
                return Err(ConfigError::DuplicateDevice(device.to_string()));
            }
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        // A full participant list must mean every device.
        if self.scene_participants.len() != self.devices.len() {
            return Err(ConfigError::SceneParticipantsMismatch {
                participants: self.scene_participants.len(),
                devices: self.devices.len(),
            });
        }
        Ok(())
    }

    fn apply_file(&mut self, file: SettingsFile) {
        if let Some(v) = file.server_url {
            self.server_url = v;
        }
        if let Some(v) = file.ws_url {
            self.ws_url = Some(v);
        }
        if let Some(v) = file.fallback_url {
            self.fallback_url = Some(v);
        }
        if let Some(v) = file.push_enabled {
            self.push_enabled = v;
        }
        if let Some(v) = file.poll_interval_secs {
            self.poll_interval_secs = v;
        }
        if let Some(v) = file.push_connect_timeout_ms {
            self.push_connect_timeout_ms = v;
        }
        if let Some(v) = file.devices {
            self.devices = v;
        }
        if let Some(v) = file.device_topic_prefix {
            self.device_topic_prefix = v;
        }
        if let Some(v) = file.script_topic {
            self.script_topic = v;
        }
        if let Some(v) = file.multi_participant_script {
            self.multi_participant_script = v;
        }
        if let Some(v) = file.scene_participants {
            self.scene_participants = v;
        }
        if let Some(v) = file.scene_targets {
            self.scene_targets = v;
        }
        if let Some(v) = file.scene_select_all_target {
            self.scene_select_all_target = v;
        }
        if let Some(v) = file.fancy_lights {
            self.fancy_lights = v;
        }
        if let Some(v) = file.fancy_topic_prefix {
            self.fancy_topic_prefix = v;
        }
        if let Some(v) = file.fancy_topic_suffix {
            self.fancy_topic_suffix = v;
        }
    }

    /// Applies `PANEL_*` variables, then their `APP__*` aliases.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in ["PANEL_SERVER_URL", "APP__SERVER_URL"] {
            if let Some(v) = lookup(key) {
                self.server_url = v;
            }
        }
        for key in ["PANEL_WS_URL", "APP__WS_URL"] {
            if let Some(v) = lookup(key) {
                self.ws_url = Some(v);
            }
        }
        for key in ["PANEL_FALLBACK_URL", "APP__FALLBACK_URL"] {
            if let Some(v) = lookup(key) {
                self.fallback_url = Some(v);
            }
        }
        for key in ["PANEL_PUSH_ENABLED", "APP__PUSH_ENABLED"] {
            if let Some(v) = lookup(key) {
                self.push_enabled = parse_env(key, &v)?;
            }
        }
        for key in ["PANEL_POLL_INTERVAL_SECS", "APP__POLL_INTERVAL_SECS"] {
            if let Some(v) = lookup(key) {
                self.poll_interval_secs = parse_env(key, &v)?;
            }
        }
        for key in ["PANEL_PUSH_CONNECT_TIMEOUT_MS", "APP__PUSH_CONNECT_TIMEOUT_MS"] {
            if let Some(v) = lookup(key) {
                self.push_connect_timeout_ms = parse_env(key, &v)?;
            }
        }
        Ok(())
    }
}

/// Loads defaults, then the settings file (if present), then the process environment.
pub fn load_settings(path: Option<&Path>) -> Result<PanelSettings, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_PATH));
    let mut settings = PanelSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => settings.apply_file(parse_settings_file(path, &raw)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

fn parse_settings_file(path: &Path, raw: &str) -> Result<SettingsFile, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

fn join_url(base: &Url, path: &str) -> Result<Url, ConfigError> {
    base.join(path).map_err(|source| ConfigError::InvalidUrl {
        url: format!("{base}{path}"),
        source,
    })
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
