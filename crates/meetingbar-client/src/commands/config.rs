//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: Option<&Path>) -> ClientResult<()> {
    let toml_str = config.to_toml()?;
    println!("# config.toml ({})", ClientConfig::resolve_path(path).display());
    println!("{toml_str}");
    Ok(())
}

/// Every problem in the configuration, out-of-range values first.
pub fn problems(config: &ClientConfig) -> Vec<String> {
    let engine_config = config.to_engine_config();
    let mut problems = engine_config.problems();
    if let Err(e) = engine_config.source.validate() {
        problems.push(e.message().to_string());
    }
    problems
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    let problems = problems(config);
    if problems.is_empty() {
        println!("Configuration is valid.");
        return Ok(());
    }
    for problem in &problems {
        println!("- {problem}");
    }
    Err(ClientError::config(format!(
        "{} problem(s) found",
        problems.len()
    )))
}

/// Show the configuration file path.
pub fn path(path: Option<&Path>) -> ClientResult<()> {
    println!("config: {}", ClientConfig::resolve_path(path).display());
    Ok(())
}
