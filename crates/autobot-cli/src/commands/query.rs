//! `autobot query` command implementation
//!
//! Streams matching vehicles to stdout as CSV.

use crate::context::AppContext;
use crate::error::Result;
use crate::QueryArgs;
use autobot_server::store::Query;
use tracing::info;

impl From<&QueryArgs> for Query {
    fn from(args: &QueryArgs) -> Self {
        Query {
            limit: args.limit,
            vehicle_type: args.vehicle_type.clone().unwrap_or_default(),
            brand: args.brand.clone().unwrap_or_default(),
            model: args.model.clone().unwrap_or_default(),
            fuel_type: args.fuel_type.clone().unwrap_or_default(),
            include_disabled: args.include_disabled,
        }
    }
}

pub async fn run(ctx: &AppContext, args: &QueryArgs) -> Result<()> {
    let query = Query::from(args);
    let stdout = std::io::stdout();
    let rows = ctx.store.query_to(stdout.lock(), &query).await?;
    info!(rows, "Query finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_flags_do_not_filter() {
        let query = Query::from(&QueryArgs {
            brand: Some("Ford".into()),
            ..QueryArgs::default()
        });
        assert_eq!(query.brand, "Ford");
        assert!(query.model.is_empty());
        assert_eq!(query.limit, 0);
    }
}
