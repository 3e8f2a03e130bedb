use clap::Parser;
use eframe::egui;

use sales_dashboard::app::SalesDashboardApp;
use sales_dashboard::config::Args;

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(SalesDashboardApp::new(&args)))),
    )
}
