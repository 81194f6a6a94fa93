//! Configuration commands.

use friendcal_core::TracingConfig;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
///
/// Secret references are resolved, so a missing `pass` entry or unset
/// environment variable is reported here rather than at login.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    check(config)?;

    for value in [&config.auth.email, &config.auth.password].into_iter().flatten() {
        if secret::is_reference(value) {
            println!("resolved {}", value);
        }
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    println!("config: {}", ClientConfig::default_path().display());
    Ok(())
}

fn check(config: &ClientConfig) -> ClientResult<()> {
    config
        .facebook
        .to_provider_config()
        .map_err(ClientError::Config)?;
    TracingConfig::cli()
        .with_level_name(&config.logging.level)
        .map_err(|e| ClientError::Config(e.to_string()))?;
    config
        .auth
        .resolve_credentials()
        .map_err(ClientError::Secret)?;
    if config.output.save_to_file && config.output.path.trim().is_empty() {
        return Err(ClientError::Config(
            "output.path must be set when save_to_file is true".to_string(),
        ));
    }
    Ok(())
}
