use egui::{Color32, Context, RichText, ScrollArea, TextEdit, Ui};

use crate::geo::{FieldKind, ParseWarning, WarningKind};
use crate::math::Mechanism;
use crate::renderer::Camera;
use crate::ui::state::{EdgeBlock, UiState};
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    /// Some input changed; rebuild once.
    pub rebuild: bool,
    pub set_vsync: Option<bool>,
}

pub fn draw_side_panel(ctx: &Context, state: &mut UiState) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(300.0)
        .max_width(420.0)
        .default_width(340.0)
        .frame(egui::Frame::default().fill(GRAY_900).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Fault Plane").strong());
                ui.add_space(4.0);
                ui.label(RichText::new("3D source geometry").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                section_header(ui, "UPPER EDGE");
                actions.rebuild |= coords_editor(ui, &mut state.upper_text, "upper_edge");
                ui.add_space(12.0);

                section_header(ui, "LOWER EDGE");
                actions.rebuild |= coords_editor(ui, &mut state.lower_text, "lower_edge");
                ui.add_space(12.0);

                section_header(ui, "ORIENTATION");
                actions.rebuild |= orientation_controls(ui, state);
                ui.add_space(12.0);

                section_header(ui, "MECHANISM");
                actions.rebuild |= mechanism_picker(ui, state);
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                status_panel(ui, state);
                ui.add_space(16.0);

                section_header(ui, "DISPLAY");
                ui.horizontal(|ui| {
                    if ui.checkbox(&mut state.vsync_enabled, "VSync").changed() {
                        actions.set_vsync = Some(state.vsync_enabled);
                    }
                    ui.checkbox(&mut state.show_help, "Help");
                });
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn coords_editor(ui: &mut Ui, text: &mut String, id: &str) -> bool {
    ui.label(RichText::new("lat lon depth, one point per line").color(TEXT_MUTED).size(11.0));
    egui::Frame::default()
        .fill(GRAY_950)
        .stroke(egui::Stroke::new(1.0, GRAY_700))
        .rounding(4.0)
        .inner_margin(6.0)
        .show(ui, |ui| {
            ui.add(
                TextEdit::multiline(text)
                    .id_salt(id)
                    .font(egui::FontId::new(12.0, egui::FontFamily::Monospace))
                    .desired_width(f32::INFINITY)
                    .desired_rows(4)
                    .text_color(TEXT_PRIMARY)
                    .frame(false),
            )
            .changed()
        })
        .inner
}

fn orientation_controls(ui: &mut Ui, state: &mut UiState) -> bool {
    let mut changed = false;
    egui::Grid::new("orientation")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label(RichText::new("Dip °").color(TEXT_MUTED));
            changed |= ui
                .add(TextEdit::singleline(&mut state.dip_text).desired_width(80.0))
                .changed();
            ui.end_row();

            ui.label(RichText::new("Strike °").color(TEXT_MUTED));
            changed |= ui
                .add(TextEdit::singleline(&mut state.strike_text).desired_width(80.0))
                .changed();
            ui.end_row();
        });
    changed
}

fn mechanism_picker(ui: &mut Ui, state: &mut UiState) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt("mechanism")
        .selected_text(state.mechanism.as_str())
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for label in &state.mechanisms {
                if ui
                    .selectable_label(state.mechanism == *label, label.as_str())
                    .clicked()
                    && state.mechanism != *label
                {
                    state.mechanism = label.clone();
                    changed = true;
                }
            }
        });

    let mode = match Mechanism::from_label(&state.mechanism) {
        Mechanism::Subduction => "extruded solid",
        Mechanism::Default => "edge outlines",
    };
    ui.add_space(4.0);
    ui.label(RichText::new(mode).color(TEXT_MUTED).size(11.0).italics());
    changed
}

fn status_panel(ui: &mut Ui, state: &UiState) {
    section_header(ui, "STATUS");
    egui::Frame::default()
        .fill(GRAY_800)
        .stroke(egui::Stroke::new(1.0, GRAY_700))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id =
                Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            if let Some(error) = &state.last_error {
                ui.label(RichText::new(error).color(ACCENT_RED));
                return;
            }

            match &state.last_outcome {
                None => {
                    ui.label(RichText::new("no scene").color(TEXT_MUTED));
                }
                Some(outcome) => {
                    egui::Grid::new("status").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                        ui.label(RichText::new("Build").color(TEXT_MUTED));
                        ui.label(RichText::new(format!("#{}", outcome.generation)).color(TEXT_PRIMARY));
                        ui.end_row();

                        ui.label(RichText::new("Primitives").color(TEXT_MUTED));
                        ui.label(RichText::new(outcome.primitives.to_string()).color(ACCENT_CYAN));
                        ui.end_row();

                        ui.label(RichText::new("Framed").color(TEXT_MUTED));
                        let (text, color) = if outcome.framed {
                            ("yes", ACCENT_GREEN)
                        } else {
                            ("origin", TEXT_MUTED)
                        };
                        ui.label(RichText::new(text).color(color));
                        ui.end_row();
                    });

                    if let Some(e) = &outcome.geometry_error {
                        ui.add_space(6.0);
                        ui.label(RichText::new(e.to_string()).color(ACCENT_AMBER));
                    }
                }
            }

            if !state.warnings.is_empty() {
                ui.add_space(6.0);
                for (block, warning) in &state.warnings {
                    ui.label(RichText::new(describe_warning(*block, warning)).color(ACCENT_AMBER));
                }
            }
        });
}

fn describe_warning(block: EdgeBlock, warning: &ParseWarning) -> String {
    let field = match warning.field {
        FieldKind::Lat => "lat",
        FieldKind::Lon => "lon",
        FieldKind::Depth => "depth",
        FieldKind::Angle => "angle",
    };
    let what = match warning.kind {
        WarningKind::FellBackToZero => "read as 0",
        WarningKind::IgnoredTrailing => "trailing text ignored",
    };
    match block {
        EdgeBlock::Upper => format!("upper:{} {field} {:?} {what}", warning.line, warning.raw),
        EdgeBlock::Lower => format!("lower:{} {field} {:?} {what}", warning.line, warning.raw),
        EdgeBlock::Orientation => format!("{field} {:?} {what}", warning.raw),
    }
}

pub fn draw_help_overlay(ctx: &Context, camera: &Camera) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id =
                        Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new("LMB+Drag - Orbit | Scroll - Zoom").color(TEXT_MUTED));
                    let t = camera.target;
                    ui.label(
                        RichText::new(format!(
                            "Target: ({:.2}, {:.2}, {:.2}) | Dist: {:.0}",
                            t.x,
                            t.y,
                            t.z,
                            camera.distance()
                        ))
                        .color(TEXT_MUTED),
                    );
                });
        });
}
