use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

name_newtype!(DeviceId);
name_newtype!(FancyId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Push,
    Poll,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => f.write_str("push"),
            Self::Poll => f.write_str("poll"),
        }
    }
}

/// Identifier of a scene participant.
///
/// Entries that look like integers are normalized to [`ParticipantId::Index`];
/// everything else keeps its original JSON representation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantId {
    Index(i64),
    Raw(Value),
}

impl ParticipantId {
    pub fn coerce(value: Value) -> Self {
        match &value {
            Value::Number(number) => match number.as_i64() {
                Some(index) => Self::Index(index),
                None => Self::Raw(value),
            },
            Value::String(text) => match text.trim().parse::<i64>() {
                Ok(index) => Self::Index(index),
                Err(_) => Self::Raw(value),
            },
            _ => Self::Raw(value),
        }
    }

    pub fn from_target(target: &str) -> Self {
        Self::coerce(Value::String(target.to_string()))
    }
}

impl From<i64> for ParticipantId {
    fn from(value: i64) -> Self {
        Self::Index(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Raw(Value::String(text)) => f.write_str(text),
            Self::Raw(other) => write!(f, "{other}"),
        }
    }
}

impl Serialize for ParticipantId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Index(index) => serializer.serialize_i64(*index),
            Self::Raw(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParticipantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::coerce)
    }
}

/// The active lighting script together with the participants it drives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub script: String,
    pub participants: Vec<ParticipantId>,
}

impl Scene {
    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coerces_numeric_strings_to_indices() {
        assert_eq!(ParticipantId::coerce(json!("4")), ParticipantId::Index(4));
        assert_eq!(ParticipantId::coerce(json!(" 2 ")), ParticipantId::Index(2));
        assert_eq!(ParticipantId::coerce(json!(3)), ParticipantId::Index(3));
    }

    #[test]
    fn keeps_non_numeric_entries_verbatim() {
        assert_eq!(
            ParticipantId::coerce(json!("spot")),
            ParticipantId::Raw(json!("spot"))
        );
        assert_eq!(
            ParticipantId::coerce(json!(2.5)),
            ParticipantId::Raw(json!(2.5))
        );
        assert_eq!(
            ParticipantId::coerce(json!(null)),
            ParticipantId::Raw(json!(null))
        );
    }

    #[test]
    fn participant_serializes_to_original_shape() {
        let encoded = serde_json::to_value(vec![
            ParticipantId::Index(1),
            ParticipantId::Raw(json!("spot")),
        ])
        .expect("encode");
        assert_eq!(encoded, json!([1, "spot"]));
    }

    #[test]
    fn device_id_is_transparent_on_the_wire() {
        let id: DeviceId = serde_json::from_value(json!("basiclight3")).expect("decode");
        assert_eq!(id, DeviceId::new("basiclight3"));
        assert_eq!(id.to_string(), "basiclight3");
    }
}
