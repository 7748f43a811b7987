use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::ParticipantId,
    error::{PayloadError, PayloadKind},
};

/// Values of the `Action` field that mean a binary device is asserted.
pub const ASSERTED_ACTIONS: [&str; 3] = ["1", "on", "send"];

/// Script name that switches every scene participant off.
pub const SCRIPT_OFF: &str = "off";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchAction {
    On,
    Off,
}

impl SwitchAction {
    pub fn from_state(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCommand {
    #[serde(rename = "Action")]
    pub action: SwitchAction,
}

/// State notification for a binary device. `Action` is kept loosely typed
/// because bridges report it as a string or a number.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct InboundSwitch {
    #[serde(rename = "Action", default)]
    pub action: Option<Value>,
}

impl InboundSwitch {
    /// Reads `Action` from an object payload. Any other non-null payload has
    /// no `Action` and therefore decodes as deasserted.
    pub fn decode(payload: Value) -> Result<Self, PayloadError> {
        match payload {
            Value::Null => Err(PayloadError::new(PayloadKind::Switch, "null payload")),
            Value::Object(mut fields) => Ok(Self {
                action: fields.remove("Action"),
            }),
            _ => Ok(Self::default()),
        }
    }

    pub fn is_asserted(&self) -> bool {
        match &self.action {
            Some(Value::String(action)) => ASSERTED_ACTIONS.contains(&action.as_str()),
            Some(Value::Number(number)) => number.as_f64() == Some(1.0),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptActivation {
    #[serde(default)]
    pub script: String,
    #[serde(
        default,
        alias = "participants",
        skip_serializing_if = "Option::is_none"
    )]
    pub participating: Option<Vec<ParticipantId>>,
}

impl ScriptActivation {
    pub fn activate(script: impl Into<String>, participating: Vec<ParticipantId>) -> Self {
        Self {
            script: script.into(),
            participating: Some(participating),
        }
    }

    pub fn off() -> Self {
        Self {
            script: SCRIPT_OFF.to_string(),
            participating: None,
        }
    }

    /// Decodes a bridge notification field by field. A non-string `script`
    /// is kept as its JSON text and a participant list that is not an array
    /// counts as omitted.
    pub fn decode(payload: Value) -> Result<Self, PayloadError> {
        let mut fields = match payload {
            Value::Null => {
                return Err(PayloadError::new(
                    PayloadKind::ScriptActivation,
                    "null payload",
                ))
            }
            Value::Object(fields) => fields,
            _ => return Ok(Self::default()),
        };
        let script = match fields.remove("script") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(script)) => script,
            Some(other) => other.to_string(),
        };
        let participating = match fields
            .remove("participating")
            .or_else(|| fields.remove("participants"))
        {
            Some(Value::Array(list)) => {
                Some(list.into_iter().map(ParticipantId::coerce).collect())
            }
            _ => None,
        };
        Ok(Self {
            script,
            participating,
        })
    }
}

/// Framing used by the websocket bridge in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub ctx: String,
    #[serde(default)]
    pub data: Value,
}

impl BridgeEnvelope {
    pub fn decode(text: &str) -> Result<Self, PayloadError> {
        serde_json::from_str(text).map_err(|e| PayloadError::from_json(PayloadKind::Envelope, e))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundCommand {
    Switch {
        topic: String,
        command: SwitchCommand,
    },
    Script {
        topic: String,
        activation: ScriptActivation,
    },
    Raw {
        topic: String,
        payload: Value,
    },
}

impl OutboundCommand {
    pub fn switch(topic: impl Into<String>, action: SwitchAction) -> Self {
        Self::Switch {
            topic: topic.into(),
            command: SwitchCommand { action },
        }
    }

    pub fn topic(&self) -> &str {
        match self {
            Self::Switch { topic, .. } | Self::Script { topic, .. } | Self::Raw { topic, .. } => {
                topic
            }
        }
    }

    pub fn payload(&self) -> serde_json::Result<Value> {
        match self {
            Self::Switch { command, .. } => serde_json::to_value(command),
            Self::Script { activation, .. } => serde_json::to_value(activation),
            Self::Raw { payload, .. } => Ok(payload.clone()),
        }
    }

    pub fn into_envelope(self) -> serde_json::Result<BridgeEnvelope> {
        let data = self.payload()?;
        let ctx = match self {
            Self::Switch { topic, .. } | Self::Script { topic, .. } | Self::Raw { topic, .. } => {
                topic
            }
        };
        Ok(BridgeEnvelope { ctx, data })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn switch_command_uses_capitalized_action_field() {
        let cmd = OutboundCommand::switch("action/GoLightCtrl/basiclight1", SwitchAction::On);
        assert_eq!(cmd.payload().expect("payload"), json!({"Action": "on"}));
    }

    #[test]
    fn inbound_action_values_that_assert() {
        for action in [json!("1"), json!("on"), json!("send"), json!(1)] {
            let switch = InboundSwitch::decode(json!({ "Action": action })).expect("decode");
            assert!(switch.is_asserted(), "{action} should assert");
        }
    }

    #[test]
    fn inbound_action_values_that_deassert() {
        for payload in [
            json!({"Action": "off"}),
            json!({"Action": "0"}),
            json!({"Action": "ON"}),
            json!({"Action": 0}),
            json!({}),
        ] {
            let switch = InboundSwitch::decode(payload.clone()).expect("decode");
            assert!(!switch.is_asserted(), "{payload} should deassert");
        }
    }

    #[test]
    fn non_object_switch_payloads_deassert() {
        for payload in [json!("on"), json!(1), json!([]), json!(true)] {
            let switch = InboundSwitch::decode(payload.clone()).expect("decode");
            assert!(!switch.is_asserted(), "{payload} should deassert");
        }
        assert!(InboundSwitch::decode(Value::Null).is_err());
    }

    #[test]
    fn script_activation_defaults_odd_fields() {
        let activation =
            ScriptActivation::decode(json!({"script": 7, "participating": "1,2"})).expect("decode");
        assert_eq!(activation.script, "7");
        assert_eq!(activation.participating, None);

        let activation = ScriptActivation::decode(json!("redshift")).expect("decode");
        assert_eq!(activation, ScriptActivation::default());

        assert!(ScriptActivation::decode(Value::Null).is_err());
    }

    #[test]
    fn script_activation_accepts_participants_alias() {
        let activation =
            ScriptActivation::decode(json!({"script": "redshift", "participants": [1, "2"]}))
                .expect("decode");
        assert_eq!(
            activation.participating,
            Some(vec![ParticipantId::Index(1), ParticipantId::Index(2)])
        );
    }

    #[test]
    fn off_script_omits_participants() {
        let encoded = serde_json::to_value(ScriptActivation::off()).expect("encode");
        assert_eq!(encoded, json!({"script": "off"}));
    }

    #[test]
    fn envelope_carries_topic_as_ctx() {
        let envelope = OutboundCommand::Script {
            topic: "action/ceilingscripts/activatescript".to_string(),
            activation: ScriptActivation::activate("redshift", vec![ParticipantId::Index(2)]),
        }
        .into_envelope()
        .expect("envelope");
        assert_eq!(envelope.ctx, "action/ceilingscripts/activatescript");
        assert_eq!(
            envelope.data,
            json!({"script": "redshift", "participating": [2]})
        );
    }
}
