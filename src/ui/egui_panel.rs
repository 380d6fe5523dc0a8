use super::{ControlPanel, ParameterChange};
use crate::color::Color;
use crate::tunables::{NumericRange, TunableKey, TunableValue};

const PANEL_WIDTH: f32 = 400.0;

#[derive(Debug, Clone)]
enum PanelControl {
    Color {
        key: TunableKey,
        srgb: [u8; 3],
    },
    Number {
        key: TunableKey,
        value: f32,
        range: NumericRange,
    },
}

/// Floating egui window with one widget per registered tunable.
#[derive(Debug)]
pub struct EguiPanel {
    title: String,
    controls: Vec<PanelControl>,
    changes: Vec<ParameterChange>,
}

impl EguiPanel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            controls: Vec::new(),
            changes: Vec::new(),
        }
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    /// Edit a control as if the user had moved it. Numbers are clamped to
    /// the control's range.
    pub fn edit(&mut self, key: TunableKey, value: TunableValue) -> bool {
        let Some(control) = self.controls.iter_mut().find(|control| match control {
            PanelControl::Color { key: k, .. } | PanelControl::Number { key: k, .. } => *k == key,
        }) else {
            return false;
        };
        let stored = match (control, value) {
            (PanelControl::Color { srgb, .. }, TunableValue::Color(color)) => {
                *srgb = color.to_srgb_bytes();
                TunableValue::Color(color)
            }
            (PanelControl::Number { value: current, range, .. }, TunableValue::Number(number)) => {
                *current = range.clamp(number);
                TunableValue::Number(*current)
            }
            _ => return false,
        };
        self.changes.push(ParameterChange { key, value: stored });
        true
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let controls = &mut self.controls;
        let changes = &mut self.changes;
        egui::Window::new(self.title.as_str())
            .default_width(PANEL_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                for control in controls.iter_mut() {
                    match control {
                        PanelControl::Color { key, srgb } => {
                            ui.horizontal(|ui| {
                                if ui.color_edit_button_srgb(srgb).changed() {
                                    changes.push(ParameterChange {
                                        key: *key,
                                        value: TunableValue::Color(Color::from_srgb_bytes(*srgb)),
                                    });
                                }
                                ui.label(key.name());
                            });
                        }
                        PanelControl::Number { key, value, range } => {
                            let slider = egui::Slider::new(value, range.min..=range.max)
                                .step_by(range.step as f64)
                                .text(key.name());
                            if ui.add(slider).changed() {
                                changes.push(ParameterChange {
                                    key: *key,
                                    value: TunableValue::Number(*value),
                                });
                            }
                        }
                    }
                }
            });
    }
}

impl ControlPanel for EguiPanel {
    fn add_color(&mut self, key: TunableKey, value: Color) {
        self.controls.push(PanelControl::Color {
            key,
            srgb: value.to_srgb_bytes(),
        });
    }

    fn add_number(&mut self, key: TunableKey, value: f32, range: NumericRange) {
        self.controls.push(PanelControl::Number {
            key,
            value: range.clamp(value),
            range,
        });
    }

    fn take_changes(&mut self) -> Vec<ParameterChange> {
        std::mem::take(&mut self.changes)
    }
}
