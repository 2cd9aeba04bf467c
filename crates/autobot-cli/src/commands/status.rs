//! `autobot status` command implementation
//!
//! Shows the sync history and the most recent sync operations.

use crate::context::AppContext;
use crate::error::Result;

const RECENT_OPERATIONS: usize = 5;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let status = ctx.store.store_status().await?;
    let last_synced = ctx.store.last_synced().await?;

    println!("Store:           {}", ctx.store.backend().name());
    println!("History entries: {}", status.history_size);
    match &status.last_entry {
        Some(entry) => println!("Last log entry:  {}", entry),
        None => println!("Last log entry:  (none)"),
    }
    println!(
        "Last synced:     {}",
        last_synced.as_deref().unwrap_or("(never)")
    );

    let recent = ctx.store.recent_operations(RECENT_OPERATIONS).await?;
    if !recent.is_empty() {
        println!();
        println!("Recent operations:");
        for op in recent {
            println!("  {}", op);
        }
    }
    Ok(())
}
