use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::DeviceId,
    error::{PayloadError, PayloadKind},
    protocol::{InboundSwitch, OutboundCommand, ScriptActivation, SwitchAction},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::PanelSettings,
    fancy::{ColorMath, FancyLightCache},
    projector::{project, project_fancy, project_scene, PanelView, UiSurface},
    routing::{RegistrationTable, Route},
    scene::{participants_from_targets, SceneReconciler},
    store::DeviceStore,
    transport::CommandSink,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Toggle(DeviceId),
    SelectSceneTargets(Vec<String>),
    /// Click on a split on/off tile at a position relative to its size.
    PressSplit {
        device: DeviceId,
        rel_x: f64,
        rel_y: f64,
    },
    RawJson {
        topic: String,
        payload: Value,
    },
    MergeStates(Value),
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Inbound { topic: String, payload: Value },
    Gesture(Gesture),
}

/// UI affordances the panel paints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    pub light_bindings: Vec<DeviceId>,
    pub scene_targets: Vec<String>,
    pub select_all_target: String,
}

impl PanelLayout {
    pub fn from_settings(settings: &PanelSettings) -> Self {
        Self {
            light_bindings: settings.devices.clone(),
            scene_targets: settings.scene_targets.clone(),
            select_all_target: settings.scene_select_all_target.clone(),
        }
    }
}

/// Sole owner of all panel state. Events are applied one at a time.
pub struct Panel<M: ColorMath> {
    settings: PanelSettings,
    layout: PanelLayout,
    store: DeviceStore,
    scenes: SceneReconciler,
    fancy: FancyLightCache<M>,
    routes: Arc<RegistrationTable>,
    sink: Arc<dyn CommandSink>,
    surface: Box<dyn UiSurface>,
}

impl<M: ColorMath> Panel<M> {
    pub fn new(
        settings: PanelSettings,
        math: M,
        routes: Arc<RegistrationTable>,
        sink: Arc<dyn CommandSink>,
        surface: Box<dyn UiSurface>,
    ) -> Self {
        let store = DeviceStore::new(settings.devices.iter().cloned());
        let scenes = SceneReconciler::new(
            settings.multi_participant_script.clone(),
            settings.scene_participants.clone(),
            settings.script_topic.clone(),
        );
        Self {
            layout: PanelLayout::from_settings(&settings),
            settings,
            store,
            scenes,
            fancy: FancyLightCache::new(math),
            routes,
            sink,
            surface,
        }
    }

    pub fn with_layout(mut self, layout: PanelLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn store(&self) -> &DeviceStore {
        &self.store
    }

    pub fn scenes(&self) -> &SceneReconciler {
        &self.scenes
    }

    pub fn fancy(&self) -> &FancyLightCache<M> {
        &self.fancy
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            lights: project(&self.store.snapshot(), &self.layout.light_bindings),
            scene: project_scene(self.scenes.current(), &self.layout.scene_targets),
            fancy: project_fancy(self.fancy.iter()),
        }
    }

    pub fn repaint(&mut self) {
        let view = self.view();
        self.surface.render(&view);
    }

    pub fn handle(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Inbound { topic, payload } => self.handle_inbound(&topic, payload),
            PanelEvent::Gesture(gesture) => self.handle_gesture(gesture),
        }
    }

    pub fn handle_inbound(&mut self, topic: &str, payload: Value) {
        let Some(route) = self.routes.resolve(topic).cloned() else {
            debug!(topic, "inbound: no handler registered");
            return;
        };
        match route {
            Route::Device(device) => match InboundSwitch::decode(payload) {
                Ok(switch) => {
                    self.store.merge(&device, switch.is_asserted());
                    self.repaint();
                }
                Err(err) => warn!(topic, %err, "inbound: dropping switch notification"),
            },
            Route::Scene => match ScriptActivation::decode(payload) {
                Ok(activation) => {
                    let scene = self.scenes.reconcile_activation(activation);
                    debug!(
                        script = %scene.script,
                        participants = scene.participants.len(),
                        "inbound: scene reconciled"
                    );
                    self.repaint();
                }
                Err(err) => warn!(topic, %err, "inbound: dropping scene activation"),
            },
            Route::Fancy(fancy) => {
                if let Err(err) = self.fancy.update_from_external(fancy.clone(), payload) {
                    warn!(fancy = %fancy, %err, "inbound: color derivation failed");
                }
                self.repaint();
            }
        }
    }

    pub fn handle_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Toggle(device) => {
                let settings = &self.settings;
                match self
                    .store
                    .toggle_local(&device, |id| settings.device_topic(id))
                {
                    Some(command) => self.emit(command),
                    None => debug!(device = %device, "gesture: toggle for unknown device"),
                }
            }
            Gesture::SelectSceneTargets(targets) => {
                let participants = participants_from_targets(
                    targets.iter().map(String::as_str),
                    &self.layout.select_all_target,
                );
                let command = self.scenes.activate_local(participants);
                self.emit(command);
            }
            Gesture::PressSplit {
                device,
                rel_x,
                rel_y,
            } => {
                let action = SwitchAction::from_state(rel_x + rel_y < 1.0);
                let command = OutboundCommand::switch(self.settings.device_topic(&device), action);
                self.emit(command);
            }
            Gesture::RawJson { topic, payload } => {
                self.emit(OutboundCommand::Raw { topic, payload });
            }
            Gesture::MergeStates(states) => match states {
                Value::Object(map) => {
                    let updated = self.store.merge_all(&map);
                    debug!(updated, "gesture: merged state map");
                    self.repaint();
                }
                other => {
                    let err = PayloadError::new(
                        PayloadKind::States,
                        format!("expected an object, got {other}"),
                    );
                    warn!(%err, "gesture: ignoring state map");
                }
            },
            Gesture::Refresh => self.repaint(),
        }
    }

    fn emit(&self, command: OutboundCommand) {
        debug!(topic = command.topic(), "outbound: sending");
        self.sink.send(command);
    }
}

/// Drives `panel` until every event sender is gone.
pub async fn run_panel<M: ColorMath>(mut panel: Panel<M>, mut events: mpsc::Receiver<PanelEvent>) {
    panel.repaint();
    while let Some(event) = events.recv().await {
        panel.handle(event);
    }
    info!("panel: event queue closed");
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;
