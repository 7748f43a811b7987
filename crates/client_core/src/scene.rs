use shared::{
    domain::{ParticipantId, Scene},
    protocol::{OutboundCommand, ScriptActivation},
};

/// Tracks the active lighting script and who takes part in it.
#[derive(Debug, Clone)]
pub struct SceneReconciler {
    multi_script: String,
    canonical: Vec<ParticipantId>,
    topic: String,
    current: Scene,
}

impl SceneReconciler {
    pub fn new(
        multi_script: impl Into<String>,
        canonical: Vec<ParticipantId>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            multi_script: multi_script.into(),
            canonical,
            topic: topic.into(),
            current: Scene::default(),
        }
    }

    pub fn current(&self) -> &Scene {
        &self.current
    }

    pub fn is_multi_participant(&self, script: &str) -> bool {
        script == self.multi_script
    }

    /// Replaces the current scene with the one described by `payload`.
    ///
    /// For the multi-participant script, a missing participant list and a
    /// list as long as the canonical one both select everybody. Any other
    /// script clears the participants.
    pub fn reconcile_activation(&mut self, payload: ScriptActivation) -> &Scene {
        let participants = if self.is_multi_participant(&payload.script) {
            match payload.participating {
                Some(list) if list.len() != self.canonical.len() => list,
                _ => self.canonical.clone(),
            }
        } else {
            Vec::new()
        };
        self.current = Scene {
            script: payload.script,
            participants,
        };
        &self.current
    }

    /// An empty selection switches the whole scene off rather than
    /// activating it with nobody. That also turns off lights that were not
    /// part of the scene.
    pub fn activate_local(&self, participants: Vec<ParticipantId>) -> OutboundCommand {
        let activation = if participants.is_empty() {
            ScriptActivation::off()
        } else {
            ScriptActivation::activate(self.multi_script.clone(), participants)
        };
        OutboundCommand::Script {
            topic: self.topic.clone(),
            activation,
        }
    }
}

/// Turns checked scene checkbox targets into participants, skipping the
/// select-all target.
pub fn participants_from_targets<'a>(
    targets: impl IntoIterator<Item = &'a str>,
    select_all_target: &str,
) -> Vec<ParticipantId> {
    targets
        .into_iter()
        .filter(|target| *target != select_all_target)
        .map(ParticipantId::from_target)
        .collect()
}
