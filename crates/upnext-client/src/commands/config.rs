//! Configuration commands.

use std::io::Write;
use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dumps the effective configuration as TOML.
pub fn dump<W: Write>(config: &ClientConfig, source: &Path, out: &mut W) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    writeln!(out, "# config.toml ({})", source.display())?;
    writeln!(out, "{}", toml_str)?;
    Ok(())
}

/// Validates the configuration and reports the resolved file locations.
pub fn validate<W: Write>(config: &ClientConfig, out: &mut W) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    let auth = config.to_auth_config();
    writeln!(out, "provisioning file: {}", auth.provisioning_path.display())?;
    writeln!(out, "credential file: {}", auth.credential_path.display())?;
    if !auth.provisioning_path.exists() {
        writeln!(out, "warning: provisioning file does not exist yet")?;
    }
    writeln!(out, "Configuration is valid.")?;
    Ok(())
}

/// Shows the configuration file path.
pub fn path<W: Write>(source: &Path, out: &mut W) -> ClientResult<()> {
    writeln!(out, "config: {}", source.display())?;
    Ok(())
}
