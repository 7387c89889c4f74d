use crate::domain::color::Rgb;
use crate::domain::models::{ConnectionStatus, PlayerView};
use eframe::egui;

pub struct Components;

impl Components {
    pub fn color32(rgb: &Rgb) -> egui::Color32 {
        let [r, g, b] = rgb.to_rgb8();
        egui::Color32::from_rgb(r, g, b)
    }

    /// Black or white, whichever reads better on `bg`.
    pub fn text_on(bg: egui::Color32) -> egui::Color32 {
        let luma = 0.299 * bg.r() as f32 + 0.587 * bg.g() as f32 + 0.114 * bg.b() as f32;
        if luma > 140.0 {
            egui::Color32::BLACK
        } else {
            egui::Color32::WHITE
        }
    }

    pub fn swatch(ui: &mut egui::Ui, rgb: &Rgb, size: egui::Vec2) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::hover());
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        ui.painter().rect_filled(rect, 4.0, Self::color32(rgb));
        ui.painter().rect_stroke(rect, 4.0, stroke);
        response.on_hover_text(rgb.to_css())
    }

    /// Card for one player, filled with the player's current color.
    /// Returns true when "Register device" was clicked.
    pub fn player_card(ui: &mut egui::Ui, player: &PlayerView) -> bool {
        let fill = Self::color32(&player.color);
        let text = Self::text_on(fill);
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        let mut clicked = false;

        egui::Frame::none()
            .inner_margin(egui::Margin::same(15.0))
            .outer_margin(egui::Margin::same(8.0))
            .stroke(stroke)
            .fill(fill)
            .show(ui, |ui| {
                ui.set_min_width(180.0);
                ui.vertical(|ui| {
                    ui.label(
                        egui::RichText::new(&player.name)
                            .strong()
                            .size(18.0)
                            .color(text),
                    );
                    let enabled = player.connection == ConnectionStatus::Disconnected;
                    if ui
                        .add_enabled(enabled, egui::Button::new("Register device"))
                        .clicked()
                    {
                        clicked = true;
                    }
                    ui.label(
                        egui::RichText::new(player.status.to_string())
                            .size(22.0)
                            .color(text),
                    );
                    ui.label(
                        egui::RichText::new(format!("Points: {}", player.points))
                            .size(22.0)
                            .strong()
                            .color(text),
                    );
                });
            });

        clicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_contrasts_with_background() {
        assert_eq!(
            Components::text_on(egui::Color32::WHITE),
            egui::Color32::BLACK
        );
        assert_eq!(
            Components::text_on(egui::Color32::from_rgb(10, 10, 60)),
            egui::Color32::WHITE
        );
    }

    #[test]
    fn color_conversion_clamps() {
        let c = Components::color32(&Rgb::new(300.0, -5.0, 127.5));
        assert_eq!(c, egui::Color32::from_rgb(255, 0, 128));
    }
}
