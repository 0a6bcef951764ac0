//! egui control panel for the trap
//!
//! Command buttons, status and state label, selection readout, a reference
//! equation list, and the blocking notice shown for rejected input.

use crate::operations::PulseKind;
use crate::state_display::StateDisplay;
use crate::trap::{Command, IonTrap};
use egui::{Color32, Context, FontFamily, FontId, RichText};

/// Equation entry with label and formula
pub struct Equation {
    pub name: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

pub const ION_TRAP_EQUATIONS: &[Equation] = &[
    Equation {
        name: "Rabi Oscillation",
        formula: "P₁(t) = sin²(Ωt/2)",
        description: "Excited population under resonant drive",
    },
    Equation {
        name: "π Pulse",
        formula: "Ωt = π :  |0⟩ ↔ |1⟩",
        description: "Full population transfer",
    },
    Equation {
        name: "π/2 Pulse",
        formula: "|0⟩ → (|0⟩ + |1⟩)/√2",
        description: "Equal superposition",
    },
    Equation {
        name: "Mølmer–Sørensen Gate",
        formula: "|00⟩ → (|00⟩ + i|11⟩)/√2",
        description: "Entangles two ions via shared motion",
    },
    Equation {
        name: "Doppler Limit",
        formula: "k_B T_D = ℏΓ/2",
        description: "Minimum temperature of laser cooling",
    },
];

pub const ION_TRAP_VARIABLES: &[(&str, &str)] = &[
    ("Ω", "Rabi frequency"),
    ("|0⟩,|1⟩", "Ground / excited state"),
    ("|+⟩", "Equal superposition"),
    ("⊗", "Tensor product"),
    ("Γ", "Transition linewidth"),
    ("T_D", "Doppler temperature"),
];

/// Panel copy of the state label, refreshed only when the display re-renders
#[derive(Debug, Default)]
pub struct StateLabelView {
    revision: Option<u64>,
    text: String,
    latex: String,
}

impl StateLabelView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull a newer label from the display; returns whether anything changed
    pub fn sync(&mut self, display: &StateDisplay) -> bool {
        if self.revision == Some(display.revision()) {
            return false;
        }
        self.revision = Some(display.revision());
        self.text = display.label().to_string();
        self.latex = display.latex().to_string();
        log::trace!("Panel label updated to revision {}", display.revision());
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn latex(&self) -> &str {
        &self.latex
    }
}

const ACCENT: Color32 = Color32::from_rgb(100, 200, 255);
const HEADING: Color32 = Color32::from_rgb(255, 200, 100);

/// Draw the side panel; returns the command of a clicked button
pub fn draw_control_panel(
    ctx: &Context,
    trap: &IonTrap,
    label: &mut StateLabelView,
    enabled: bool,
) -> Option<Command> {
    let mut command = None;
    label.sync(&trap.state.display);

    egui::SidePanel::right("control_panel")
        .min_width(280.0)
        .max_width(360.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(RichText::new("Ion Trap Quantum Computer").color(ACCENT));
            });
            ui.add_space(10.0);
            ui.separator();

            section(ui, "Status");
            ui.label(RichText::new(trap.state.status.to_string()).color(Color32::WHITE));
            if trap.state.entangling {
                ui.label(RichText::new("Entangling window open").small().color(Color32::GOLD));
            }

            section(ui, "State");
            ui.label(
                RichText::new(label.text())
                    .font(FontId::new(18.0, FontFamily::Monospace))
                    .color(Color32::from_rgb(200, 220, 255)),
            );
            ui.collapsing("LaTeX", |ui| {
                let mut markup = label.latex();
                ui.add(
                    egui::TextEdit::multiline(&mut markup)
                        .font(FontId::new(12.0, FontFamily::Monospace))
                        .desired_rows(2),
                );
            });

            section(ui, "Selection");
            let selected = trap.state.selection.current();
            let text = if selected.is_empty() {
                "Click an ion to select it (max 2)".to_string()
            } else {
                selected
                    .iter()
                    .map(|id| format!("Ion {}", id))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            ui.label(RichText::new(text).color(Color32::LIGHT_GRAY));

            section(ui, "Operations");
            ui.add_enabled_ui(enabled, |ui| {
                ui.horizontal_wrapped(|ui| {
                    if ui.button("Cool (C)").clicked() {
                        command = Some(Command::Cool);
                    }
                    if ui.button("π Pulse (P)").clicked() {
                        command = Some(Command::Pulse(PulseKind::Pi));
                    }
                    if ui.button("π/2 Pulse (H)").clicked() {
                        command = Some(Command::Pulse(PulseKind::HalfPi));
                    }
                    if ui.button("Entangle (E)").clicked() {
                        command = Some(Command::Entangle);
                    }
                });
            });

            ui.add_space(10.0);
            ui.separator();
            draw_equations(ui, ION_TRAP_EQUATIONS, ION_TRAP_VARIABLES);
        });

    command
}

/// Modal notice; `notice` is cleared when dismissed
pub fn draw_notice(ctx: &Context, notice: &mut Option<String>) {
    let Some(message) = notice.as_deref() else {
        return;
    };

    let mut dismissed = false;
    egui::Window::new("Notice")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(message).color(Color32::WHITE));
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });

    if dismissed {
        *notice = None;
    }
}

fn section(ui: &mut egui::Ui, title: &str) {
    ui.add_space(8.0);
    ui.label(RichText::new(title).strong().color(HEADING));
    ui.add_space(3.0);
}

fn draw_equations(ui: &mut egui::Ui, equations: &[Equation], variables: &[(&str, &str)]) {
    ui.label(RichText::new("Equations").strong().color(HEADING));
    ui.add_space(5.0);

    for eq in equations {
        ui.group(|ui| {
            ui.label(RichText::new(eq.name).strong().color(Color32::WHITE));
            ui.label(
                RichText::new(eq.formula)
                    .font(FontId::new(15.0, FontFamily::Monospace))
                    .color(Color32::from_rgb(200, 220, 255)),
            );
            ui.label(RichText::new(eq.description).small().color(Color32::GRAY));
        });
        ui.add_space(6.0);
    }

    ui.add_space(5.0);
    ui.label(RichText::new("Variables").strong().color(HEADING));
    for (symbol, meaning) in variables {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(*symbol)
                    .color(Color32::from_rgb(150, 255, 150))
                    .font(FontId::new(14.0, FontFamily::Monospace)),
            );
            ui.label(RichText::new("=").color(Color32::GRAY));
            ui.label(RichText::new(*meaning).color(Color32::LIGHT_GRAY));
        });
    }
}
