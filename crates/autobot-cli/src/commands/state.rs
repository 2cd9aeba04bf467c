//! `autobot disable` and `autobot enable` command implementations

use crate::context::AppContext;
use crate::error::{CliError, Result};
use autobot_server::StoreError;

pub async fn disable(ctx: &AppContext, hash: u64) -> Result<()> {
    ctx.store.disable(hash).await.map_err(not_found)?;
    println!("Disabled vehicle {}", hash);
    Ok(())
}

pub async fn enable(ctx: &AppContext, hash: u64) -> Result<()> {
    ctx.store.enable(hash).await.map_err(not_found)?;
    println!("Enabled vehicle {}", hash);
    Ok(())
}

fn not_found(err: StoreError) -> CliError {
    match err {
        StoreError::NoSuchVehicle(hash) => CliError::VehicleNotFound(format!("hash {}", hash)),
        other => other.into(),
    }
}
