//! `autobot init` command implementation
//!
//! Writes a commented configuration template.

use crate::error::{CliError, Result};
use autobot_server::config::write_template;
use std::path::Path;

pub async fn run(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(CliError::AlreadyInitialized(path.display().to_string()));
    }
    write_template(path)?;
    println!("Wrote configuration template to {}", path.display());
    println!("Fill in the [providers] and [store] sections before running 'autobot sync'.");
    Ok(())
}
