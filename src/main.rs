use ledgerbus::{init_logging, run_demo, Config, Credential, BUILD_DATE, VERSION};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;
    tracing::info!("ledgerbus {} (built {})", VERSION, BUILD_DATE);

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(Config::default_path);
    let config = match path {
        Some(path) => {
            tracing::info!("Loading settings from {}", path.display());
            Config::load_or_default(&path)?
        }
        None => Config::default(),
    };

    let password = Credential::new(std::env::var("LEDGERBUS_PASSWORD").unwrap_or_default());
    let report = run_demo(&config, &password)?;
    tracing::info!(
        "Server delivered {} message(s), UI received {}",
        report.server_deliveries,
        report.ui_deliveries
    );

    Ok(())
}
