use color_match_party::presentation::app::ColorMatchApp;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_title("Color Match Party"),
        ..Default::default()
    };

    eframe::run_native(
        "Color Match Party",
        options,
        Box::new(|cc| Ok(Box::new(ColorMatchApp::new(cc)?))),
    )
}
