use pixelpad::PainterApp;

/// Launch the native egui application.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1024.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "PixelPad",
        options,
        Box::new(|cc| Ok(Box::new(PainterApp::new(cc)?))),
    )
}
