//! `autobot clear` command implementation

use crate::context::AppContext;
use crate::error::Result;

pub async fn run(ctx: &AppContext) -> Result<()> {
    ctx.store.clear().await?;
    if ctx.config.sync.clear_history {
        println!("Cleared vehicles, indexes and sync history.");
    } else {
        println!("Cleared vehicles and indexes. Sync history was kept.");
    }
    Ok(())
}
