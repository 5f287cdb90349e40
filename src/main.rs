use anyhow::Result;
use clap::Parser;
use raincheck::{App, ForecastStore, APP_NAME};
use std::io::{stdin, stdout};
use std::path::PathBuf;

/// Interactive precipitation forecast lookup.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the forecast store file.
    /// Defaults to forecasts.json in the XDG data directory.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Alternate geocoding endpoint.
    #[arg(long, hide = true)]
    geocode_url: Option<String>,

    /// Alternate forecast endpoint.
    #[arg(long, hide = true)]
    forecast_url: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let path = match cli.file {
        Some(path) => path,
        None => xdg::BaseDirectories::with_prefix(APP_NAME)?.place_data_file("forecasts.json")?,
    };

    let store = ForecastStore::new(path);
    let stdin = stdin();
    let stdout = stdout();
    App::new(
        store,
        stdin.lock(),
        stdout.lock(),
        cli.geocode_url,
        cli.forecast_url,
    )
    .run()
}
