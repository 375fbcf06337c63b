//! tonelab - terminal music laboratory
//!
//! Run with: cargo run
//!
//! Boots the drum-lab widget on the default output device with a spectrum
//! view, a step grid, and transport controls.

mod app;
mod ui;

use app::TonelabApp;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tonelab=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    TonelabApp::new().run()
}
