//! Line commands typed into the headless panel.

use panel_client::Gesture;
use serde_json::Value;
use shared::domain::DeviceId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid number '{0}'")]
    Number(String),
    #[error("invalid json: {0}")]
    Json(String),
}

pub fn parse_command(line: &str) -> Result<Option<Gesture>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let gesture = match verb {
        "toggle" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [id] => Gesture::Toggle(DeviceId::new(*id)),
            _ => return Err(CommandError::Usage("toggle <device>")),
        },
        "scene" => Gesture::SelectSceneTargets(rest.split_whitespace().map(String::from).collect()),
        "press" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [id, x, y] => Gesture::PressSplit {
                device: DeviceId::new(*id),
                rel_x: parse_number(x)?,
                rel_y: parse_number(y)?,
            },
            _ => return Err(CommandError::Usage("press <device> <x> <y>")),
        },
        "raw" => {
            let (topic, json) = rest
                .split_once(char::is_whitespace)
                .ok_or(CommandError::Usage("raw <topic> <json>"))?;
            Gesture::RawJson {
                topic: topic.to_string(),
                payload: parse_json(json)?,
            }
        }
        "states" => Gesture::MergeStates(parse_json(rest)?),
        "show" => Gesture::Refresh,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(gesture))
}

fn parse_number(raw: &str) -> Result<f64, CommandError> {
    raw.parse().map_err(|_| CommandError::Number(raw.to_string()))
}

fn parse_json(raw: &str) -> Result<Value, CommandError> {
    serde_json::from_str(raw.trim()).map_err(|e| CommandError::Json(e.to_string()))
}
