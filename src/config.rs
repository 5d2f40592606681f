use anteml::ParserOptions;
use anyhow::{Context, Result};
use std::path::Path;

/// Name of the configuration file picked up from the working directory.
pub const CONFIG_FILE: &str = "anteml.json";

/// Load parser options.
///
/// An explicit `path` must exist. Without one, `anteml.json` in `dir` is
/// used when present, otherwise the defaults.
pub fn load_options(path: Option<&Path>, dir: &Path) -> Result<ParserOptions> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = dir.join(CONFIG_FILE);
            if !candidate.exists() {
                log::debug!("no {} in {}, using defaults", CONFIG_FILE, dir.display());
                return Ok(ParserOptions::default());
            }
            candidate
        }
    };

    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let options: ParserOptions = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    log::debug!("loaded options from {}", config_path.display());
    Ok(options)
}
