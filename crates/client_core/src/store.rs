use std::collections::BTreeMap;

use serde_json::Value;
use shared::{
    domain::DeviceId,
    protocol::{OutboundCommand, SwitchAction},
};
use tracing::debug;

pub type DeviceSnapshot = BTreeMap<DeviceId, bool>;

/// Last known on/off state of every configured binary device.
///
/// The key space is fixed at construction; merges for other ids are dropped.
#[derive(Debug, Clone, Default)]
pub struct DeviceStore {
    devices: BTreeMap<DeviceId, bool>,
}

impl DeviceStore {
    pub fn new(devices: impl IntoIterator<Item = DeviceId>) -> Self {
        Self {
            devices: devices.into_iter().map(|id| (id, false)).collect(),
        }
    }

    pub fn contains(&self, device: &DeviceId) -> bool {
        self.devices.contains_key(device)
    }

    pub fn get(&self, device: &DeviceId) -> Option<bool> {
        self.devices.get(device).copied()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Last write wins; there is no sequencing, so a late stale notification
    /// overwrites a newer state.
    pub fn merge(&mut self, device: &DeviceId, observed_on: bool) -> bool {
        match self.devices.get_mut(device) {
            Some(on) => {
                *on = observed_on;
                true
            }
            None => {
                debug!(device = %device, "ignoring state for unknown device");
                false
            }
        }
    }

    /// Merges a `{id: value}` state map, using JSON truthiness for values.
    /// Returns how many known devices were updated.
    pub fn merge_all(&mut self, states: &serde_json::Map<String, Value>) -> usize {
        states
            .iter()
            .filter(|(id, value)| self.merge(&DeviceId::new(id.as_str()), is_truthy(value)))
            .count()
    }

    /// Builds the command asking for the inverse of the stored state.
    /// The store itself stays unchanged until the device echoes back.
    pub fn toggle_local(
        &self,
        device: &DeviceId,
        topic_for: impl FnOnce(&DeviceId) -> String,
    ) -> Option<OutboundCommand> {
        let on = self.get(device)?;
        Some(OutboundCommand::switch(
            topic_for(device),
            SwitchAction::from_state(!on),
        ))
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        self.devices.clone()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn panel_store() -> DeviceStore {
        DeviceStore::new((1..=6).map(|n| DeviceId(format!("basiclight{n}"))))
    }

    fn topic(device: &DeviceId) -> String {
        format!("action/GoLightCtrl/{device}")
    }

    #[test]
    fn starts_with_every_device_deasserted() {
        let store = panel_store();
        assert_eq!(store.len(), 6);
        assert!(store.snapshot().values().all(|on| !on));
    }

    #[test]
    fn merge_for_unknown_device_leaves_snapshot_unchanged() {
        let mut store = panel_store();
        let before = store.snapshot();

        assert!(!store.merge(&DeviceId::new("basiclight9"), true));

        assert_eq!(store.snapshot(), before);
        assert!(!store.contains(&DeviceId::new("basiclight9")));
    }

    #[test]
    fn last_merge_for_same_device_wins() {
        let mut store = panel_store();
        let device = DeviceId::new("basiclight2");

        store.merge(&device, true);
        store.merge(&device, false);

        assert_eq!(store.get(&device), Some(false));
    }

    #[test]
    fn stale_notification_overwrites_newer_state() {
        // Known limitation: no sequence numbers, so arrival order decides.
        let mut store = panel_store();
        let device = DeviceId::new("basiclight1");

        store.merge(&device, true);
        store.merge(&device, false);
        store.merge(&device, true);

        assert_eq!(store.get(&device), Some(true));
    }

    #[test]
    fn merges_for_different_devices_commute() {
        let a = DeviceId::new("basiclight1");
        let b = DeviceId::new("basiclight4");

        let mut first = panel_store();
        first.merge(&a, true);
        first.merge(&b, true);

        let mut second = panel_store();
        second.merge(&b, true);
        second.merge(&a, true);

        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn toggle_emits_inverse_without_touching_state() {
        let mut store = panel_store();
        let device = DeviceId::new("basiclight3");
        store.merge(&device, true);

        let cmd = store.toggle_local(&device, topic).expect("known device");

        assert_eq!(
            cmd,
            OutboundCommand::switch("action/GoLightCtrl/basiclight3", SwitchAction::Off)
        );
        assert_eq!(store.get(&device), Some(true));
    }

    #[test]
    fn toggle_for_unknown_device_emits_nothing() {
        let store = panel_store();
        assert!(store
            .toggle_local(&DeviceId::new("rfir1"), topic)
            .is_none());
    }

    #[test]
    fn merge_all_uses_truthiness_and_skips_unknown_ids() {
        let mut store = panel_store();
        let states = json!({
            "basiclight1": 1,
            "basiclight2": "yes",
            "basiclight3": 0,
            "basiclight4": null,
            "spots": true
        });

        let updated = store.merge_all(states.as_object().expect("object"));

        assert_eq!(updated, 4);
        assert_eq!(store.get(&DeviceId::new("basiclight1")), Some(true));
        assert_eq!(store.get(&DeviceId::new("basiclight2")), Some(true));
        assert_eq!(store.get(&DeviceId::new("basiclight3")), Some(false));
        assert_eq!(store.get(&DeviceId::new("basiclight4")), Some(false));
        assert!(!store.contains(&DeviceId::new("spots")));
    }
}
