use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_path(name: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("panel_settings_{name}_{suffix}.toml"))
}

#[test]
fn defaults_describe_six_ceiling_lights() {
    let settings = PanelSettings::default();
    assert_eq!(settings.devices.len(), 6);
    assert_eq!(settings.scene_participants.len(), settings.devices.len());
    assert_eq!(settings.poll_interval(), Duration::from_secs(30));
    settings.validate().expect("defaults are valid");
}

#[test]
fn derives_topics_from_ids() {
    let settings = PanelSettings::default();
    assert_eq!(
        settings.device_topic(&DeviceId::new("basiclight2")),
        "action/GoLightCtrl/basiclight2"
    );
    assert_eq!(
        settings.fancy_topic(&FancyId::new("ceiling1")),
        "action/ceiling1/light"
    );
}

#[test]
fn derives_push_and_fallback_urls_from_server_url() {
    let settings = PanelSettings {
        server_url: "https://lights.example.org/panel/".into(),
        ..PanelSettings::default()
    };
    assert_eq!(
        settings.push_url().expect("push url").as_str(),
        "wss://lights.example.org/sock"
    );
    assert_eq!(
        settings.fallback_url().expect("fallback url").as_str(),
        "https://lights.example.org/cgi-bin/fallback.cgi"
    );
}

#[test]
fn explicit_urls_win_over_derived_ones() {
    let settings = PanelSettings {
        ws_url: Some("ws://10.0.0.5:8080/ws".into()),
        fallback_url: Some("http://10.0.0.5:8080/poll".into()),
        ..PanelSettings::default()
    };
    assert_eq!(
        settings.push_url().expect("push url").as_str(),
        "ws://10.0.0.5:8080/ws"
    );
    assert_eq!(
        settings.fallback_url().expect("fallback url").as_str(),
        "http://10.0.0.5:8080/poll"
    );
}

#[test]
fn rejects_non_http_server_url() {
    let settings = PanelSettings {
        server_url: "ftp://lights.example.org".into(),
        ..PanelSettings::default()
    };
    assert!(matches!(
        settings.push_url(),
        Err(ConfigError::UnsupportedScheme(scheme)) if scheme == "ftp"
    ));
}

#[test]
fn validation_rejects_duplicate_devices_and_zero_interval() {
    let duplicated = PanelSettings {
        devices: vec![DeviceId::new("a"), DeviceId::new("a")],
        ..PanelSettings::default()
    };
    assert!(matches!(
        duplicated.validate(),
        Err(ConfigError::DuplicateDevice(id)) if id == "a"
    ));

    let empty = PanelSettings {
        devices: Vec::new(),
        ..PanelSettings::default()
    };
    assert!(matches!(empty.validate(), Err(ConfigError::NoDevices)));

    let zero = PanelSettings {
        poll_interval_secs: 0,
        ..PanelSettings::default()
    };
    assert!(matches!(zero.validate(), Err(ConfigError::ZeroPollInterval)));
}

#[test]
fn validation_requires_one_scene_participant_per_device() {
    let four_devices = PanelSettings {
        devices: (1..=4)
            .map(|n| DeviceId(format!("basiclight{n}")))
            .collect(),
        ..PanelSettings::default()
    };
    assert!(matches!(
        four_devices.validate(),
        Err(ConfigError::SceneParticipantsMismatch {
            participants: 6,
            devices: 4
        })
    ));

    let matched = PanelSettings {
        scene_participants: (1..=4).map(ParticipantId::Index).collect(),
        ..four_devices
    };
    matched.validate().expect("one participant per device");
}

#[test]
fn env_overrides_apply_with_app_aliases_last() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("PANEL_SERVER_URL", "http://panel.local"),
        ("APP__SERVER_URL", "http://override.local"),
        ("PANEL_POLL_INTERVAL_SECS", "5"),
        ("PANEL_PUSH_ENABLED", "false"),
    ]);
    let mut settings = PanelSettings::default();
    settings
        .apply_env(|key| vars.get(key).map(|v| v.to_string()))
        .expect("apply env");

    assert_eq!(settings.server_url, "http://override.local");
    assert_eq!(settings.poll_interval_secs, 5);
    assert!(!settings.push_enabled);
}

#[test]
fn env_override_with_garbage_number_is_rejected() {
    let mut settings = PanelSettings::default();
    let err = settings
        .apply_env(|key| (key == "PANEL_POLL_INTERVAL_SECS").then(|| "soon".to_string()))
        .expect_err("should reject");
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: "PANEL_POLL_INTERVAL_SECS",
            ..
        }
    ));
}

#[test]
fn settings_file_overrides_defaults() {
    let path = temp_settings_path("file");
    fs::write(
        &path,
        r#"
server_url = "http://lightctrl.lan"
devices = ["couchred", "couchwhite"]
scene_participants = [1, 2]
multi_participant_script = "colorcycle"
fancy_lights = []
"#,
    )
    .expect("write settings");

    let raw = fs::read_to_string(&path).expect("read back");
    let mut settings = PanelSettings::default();
    settings.apply_file(parse_settings_file(&path, &raw).expect("parse"));

    assert_eq!(settings.server_url, "http://lightctrl.lan");
    assert_eq!(
        settings.devices,
        vec![DeviceId::new("couchred"), DeviceId::new("couchwhite")]
    );
    assert_eq!(
        settings.scene_participants,
        vec![ParticipantId::Index(1), ParticipantId::Index(2)]
    );
    assert_eq!(settings.multi_participant_script, "colorcycle");
    assert!(settings.fancy_lights.is_empty());
    assert_eq!(settings.poll_interval_secs, 30);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn malformed_settings_file_is_reported_with_path() {
    let path = temp_settings_path("broken");
    fs::write(&path, "devices = [").expect("write settings");

    let err = load_settings(Some(&path)).expect_err("should fail");
    assert!(matches!(err, ConfigError::Parse { path: ref p, .. } if *p == path));

    fs::remove_file(path).expect("cleanup");
}
