pub mod config;
pub mod ingest;
pub mod search;
pub mod status;
pub mod sweep;

use std::path::PathBuf;

use crate::config::Config;

/// Load the config file or exit with guidance when none can be found.
pub(crate) fn load_required_config(
    path: Option<PathBuf>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/vectail/config.yml");
            eprintln!("  /etc/vectail/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'vectail config init' to generate one.");
            std::process::exit(1);
        }
    };

    Ok(crate::config::load_config(&path)?)
}
