mod auth;
mod config;
mod elasticity;
mod error;
mod loader;
mod model;
mod stats;
mod ui;

use anyhow::{anyhow, Result};
use clap::Parser;
use config::{Cli, Command, Settings};
use eframe::egui;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use ui::DashboardApp;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(Command::HashPassword { password }) = &cli.command {
        println!("{}", auth::hash_password(password)?);
        return Ok(());
    }

    let settings = Settings::from_cli(&cli)?;
    info!(
        users = settings.credentials.len(),
        files = settings.files.len(),
        "starting sales dashboard"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Data Dashboard",
        options,
        Box::new(|cc| {
            ui::set_custom_style(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(settings)))
        }),
    )
    .map_err(|e| anyhow!("dashboard window failed: {}", e))
}
