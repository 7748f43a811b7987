use std::collections::HashMap;

use shared::domain::{DeviceId, FancyId};

use crate::config::PanelSettings;

/// What an inbound topic is about. Carried as data so handlers never
/// capture loop state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Device(DeviceId),
    Scene,
    Fancy(FancyId),
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationTable {
    routes: HashMap<String, Route>,
}

impl RegistrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per configured device, the scene topic and every fancy light.
    pub fn from_settings(settings: &PanelSettings) -> Self {
        let mut table = Self::new();
        for device in &settings.devices {
            table.register(settings.device_topic(device), Route::Device(device.clone()));
        }
        table.register(settings.script_topic.clone(), Route::Scene);
        for fancy in &settings.fancy_lights {
            table.register(settings.fancy_topic(fancy), Route::Fancy(fancy.clone()));
        }
        table
    }

    /// Later registrations for the same topic replace earlier ones.
    pub fn register(&mut self, topic: impl Into<String>, route: Route) {
        self.routes.insert(topic.into(), route);
    }

    pub fn resolve(&self, topic: &str) -> Option<&Route> {
        self.routes.get(topic)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.routes.contains_key(topic)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
