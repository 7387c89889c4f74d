use eframe::egui;

pub struct PartyPalette {
    pub bg: egui::Color32,
    pub stroke: egui::Color32,
    pub accent: egui::Color32,
    pub pressed: egui::Color32,
}

impl Default for PartyPalette {
    fn default() -> Self {
        Self {
            bg: egui::Color32::from_rgb(245, 245, 245),
            stroke: egui::Color32::BLACK,
            accent: egui::Color32::from_rgb(255, 220, 0),
            pressed: egui::Color32::from_rgb(0, 255, 100),
        }
    }
}

/// Large type and hard outlines so the game reads from across the room.
pub fn configure_party_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let palette = PartyPalette::default();

    style
        .text_styles
        .iter_mut()
        .for_each(|(text_style, font_id)| {
            font_id.size = match text_style {
                egui::TextStyle::Heading => 32.0,
                egui::TextStyle::Body => 16.0,
                egui::TextStyle::Button => 16.0,
                _ => font_id.size,
            };
        });

    style.spacing.item_spacing = egui::vec2(12.0, 12.0);
    style.spacing.button_padding = egui::vec2(16.0, 10.0);

    style.visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(2.0, palette.stroke);
    style.visuals.widgets.inactive.bg_stroke = egui::Stroke::new(2.0, palette.stroke);
    style.visuals.widgets.inactive.bg_fill = egui::Color32::WHITE;
    style.visuals.widgets.inactive.weak_bg_fill = egui::Color32::WHITE;
    style.visuals.widgets.hovered.bg_fill = palette.accent;
    style.visuals.widgets.hovered.weak_bg_fill = palette.accent;
    style.visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
    style.visuals.widgets.active.bg_fill = palette.pressed;
    style.visuals.widgets.active.weak_bg_fill = palette.pressed;
    style.visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);

    style.visuals.panel_fill = palette.bg;

    ctx.set_style(style);
}
