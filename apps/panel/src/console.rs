use std::fmt::Write as _;

use panel_client::{projector::Indicator, PanelView, UiSurface};

/// Prints the panel to stdout, skipping frames identical to the last one shown.
#[derive(Default)]
pub struct ConsoleSurface {
    shown: Option<PanelView>,
}

impl UiSurface for ConsoleSurface {
    fn render(&mut self, view: &PanelView) {
        if self.shown.as_ref() == Some(view) {
            return;
        }
        println!("{}", format_view(view));
        self.shown = Some(view.clone());
    }
}

pub fn format_view(view: &PanelView) -> String {
    let mut out = String::from("lights:");
    for (device, indicator) in &view.lights {
        let state = match indicator {
            Indicator::Asserted => "on",
            Indicator::Deasserted => "off",
        };
        let _ = write!(out, " {device}={state}");
    }

    let selected = if view.scene.selected.is_empty() {
        "-"
    } else {
        view.scene.selected.as_str()
    };
    let _ = write!(out, "\nscene: {selected}");
    for (target, checked) in &view.scene.checkboxes {
        let mark = if *checked { 'x' } else { ' ' };
        let _ = write!(out, " [{mark}]{target}");
    }

    for (fancy, fancy_view) in &view.fancy {
        let _ = write!(out, "\n{fancy}:");
        match (
            &fancy_view.swatch,
            fancy_view.intensity_slider,
            fancy_view.balance_slider,
        ) {
            (Some(swatch), Some(intensity), Some(balance)) => {
                let _ = write!(out, " {swatch} intensity={intensity} balance={balance}");
            }
            _ => out.push_str(" (no derived color)"),
        }
    }
    out
}
