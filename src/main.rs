use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use netcdf3::Version;

use xrviz::app::XrvizApp;
use xrviz::cli::Cli;
use xrviz::data::loader::load_file;
use xrviz::data::sample::{SimpleRng, self_test_array};
use xrviz::data::writer::write_netcdf;
use xrviz::state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.file {
        Some(path) => {
            let array = load_file(&path)?;
            run_viewer(AppState::new(array, Some(path)))
        }
        None => self_test(),
    }
}

/// Round-trip a generated array through a temporary netCDF file, then view it.
/// The file is removed when the viewer closes.
fn self_test() -> Result<()> {
    let array = self_test_array(&mut SimpleRng::from_time())?;

    let file = tempfile::Builder::new()
        .prefix("xrviz-selftest-")
        .suffix(".nc")
        .tempfile()
        .context("creating temporary file")?;
    write_netcdf(&array, file.path(), Version::Offset64Bit).context("writing self-test array")?;
    log::info!("Self test: wrote {}", file.path().display());

    let loaded = load_file(file.path())?;
    let viewed = run_viewer(AppState::new(loaded, None));
    let removed = file.close().context("removing temporary file");
    viewed?;
    removed
}

fn run_viewer(state: AppState) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 480.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "xrviz – Labeled Array Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(XrvizApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
