//! Pure projections from panel state onto UI affordances.

use std::collections::BTreeMap;

use shared::domain::{DeviceId, FancyId, ParticipantId, Scene};

use crate::{
    fancy::{CompoundColorState, DayLevel},
    store::DeviceSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Asserted,
    Deasserted,
}

impl From<bool> for Indicator {
    fn from(on: bool) -> Self {
        if on {
            Self::Asserted
        } else {
            Self::Deasserted
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneView {
    pub selected: String,
    pub checkboxes: Vec<(String, bool)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FancyView {
    pub swatch: Option<String>,
    pub intensity_slider: Option<i64>,
    pub balance_slider: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelView {
    pub lights: BTreeMap<DeviceId, Indicator>,
    pub scene: SceneView,
    pub fancy: BTreeMap<FancyId, FancyView>,
}

/// Something that can show a [`PanelView`]. Rendering the same view twice
/// must leave the surface as it was after the first render.
pub trait UiSurface: Send {
    fn render(&mut self, view: &PanelView);
}

/// Maps every bound affordance whose device is known to its indicator.
/// Bindings for unknown devices are left out.
pub fn project(snapshot: &DeviceSnapshot, bindings: &[DeviceId]) -> BTreeMap<DeviceId, Indicator> {
    bindings
        .iter()
        .filter_map(|id| snapshot.get(id).map(|on| (id.clone(), Indicator::from(*on))))
        .collect()
}

pub fn project_scene(scene: &Scene, targets: &[String]) -> SceneView {
    SceneView {
        selected: scene.script.clone(),
        checkboxes: targets
            .iter()
            .map(|target| {
                let checked = scene.contains(&ParticipantId::from_target(target));
                (target.clone(), checked)
            })
            .collect(),
    }
}

pub fn intensity_slider(level: &DayLevel) -> i64 {
    (level.intensity * 1000.0).floor() as i64
}

pub fn balance_slider(level: &DayLevel) -> i64 {
    ((1000.0 - level.balance * 1000.0) / 2.0).floor() as i64
}

pub fn project_fancy<'a>(
    entries: impl IntoIterator<Item = (&'a FancyId, &'a CompoundColorState)>,
) -> BTreeMap<FancyId, FancyView> {
    entries
        .into_iter()
        .map(|(id, state)| {
            let view = match &state.derived {
                Some(derived) => FancyView {
                    swatch: Some(derived.rgb.css()),
                    intensity_slider: Some(intensity_slider(&derived.day_level)),
                    balance_slider: Some(balance_slider(&derived.day_level)),
                },
                None => FancyView::default(),
            };
            (id.clone(), view)
        })
        .collect()
}
