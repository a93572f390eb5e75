use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

// Tailwind gray/blue/cyan, matching the scene colours.
pub const GRAY_950: Color32 = Color32::from_rgb(3, 7, 18);
pub const GRAY_900: Color32 = Color32::from_rgb(17, 24, 39);
pub const GRAY_800: Color32 = Color32::from_rgb(31, 41, 55);
pub const GRAY_700: Color32 = Color32::from_rgb(55, 65, 81);
pub const GRAY_600: Color32 = Color32::from_rgb(75, 85, 99);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(209, 213, 219);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(156, 163, 175);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(243, 244, 246);

pub const ACCENT_BLUE: Color32 = Color32::from_rgb(59, 130, 246);
pub const ACCENT_CYAN: Color32 = Color32::from_rgb(34, 211, 238);
pub const ACCENT_AMBER: Color32 = Color32::from_rgb(245, 158, 11);
pub const ACCENT_RED: Color32 = Color32::from_rgb(239, 68, 68);
pub const ACCENT_GREEN: Color32 = Color32::from_rgb(34, 197, 94);

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = GRAY_900;
    visuals.window_fill = GRAY_900;
    visuals.faint_bg_color = GRAY_800;
    visuals.extreme_bg_color = GRAY_950;
    visuals.code_bg_color = GRAY_950;
    visuals.window_stroke = Stroke::new(1.0, GRAY_700);
    visuals.window_rounding = Rounding::same(6.0);
    visuals.warn_fg_color = ACCENT_AMBER;
    visuals.error_fg_color = ACCENT_RED;
    visuals.hyperlink_color = ACCENT_CYAN;
    visuals.selection = egui::style::Selection {
        bg_fill: ACCENT_BLUE.gamma_multiply(0.4),
        stroke: Stroke::new(1.0, ACCENT_BLUE),
    };
    visuals.text_cursor.stroke = Stroke::new(2.0, ACCENT_CYAN);

    let widgets = &mut visuals.widgets;
    for (w, fill, stroke) in [
        (&mut widgets.noninteractive, GRAY_900, GRAY_700),
        (&mut widgets.inactive, GRAY_800, GRAY_700),
        (&mut widgets.hovered, GRAY_700, ACCENT_BLUE),
        (&mut widgets.active, GRAY_600, ACCENT_CYAN),
        (&mut widgets.open, GRAY_700, ACCENT_BLUE),
    ] {
        w.bg_fill = fill;
        w.weak_bg_fill = fill;
        w.bg_stroke = Stroke::new(1.0, stroke);
        w.rounding = Rounding::same(4.0);
    }
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_MUTED);
    widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_BRIGHT);
    widgets.active.fg_stroke = Stroke::new(1.0, TEXT_BRIGHT);

    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
