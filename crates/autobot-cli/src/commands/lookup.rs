//! `autobot lookup` command implementation

use crate::context::AppContext;
use crate::error::{CliError, Result};
use crate::LookupKey;
use autobot_common::vehicle::RegCountry;

pub async fn run(
    ctx: &AppContext,
    country: RegCountry,
    key: &LookupKey,
    include_disabled: bool,
    json: bool,
) -> Result<()> {
    let (found, what) = match (&key.vin, &key.regnr) {
        (Some(vin), _) => (
            ctx.store.lookup_by_vin(country, vin, include_disabled).await?,
            format!("VIN {} ({})", vin, country),
        ),
        (None, Some(reg_nr)) => (
            ctx.store
                .lookup_by_registration(country, reg_nr, include_disabled)
                .await?,
            format!("registration {} ({})", reg_nr, country),
        ),
        (None, None) => return Err(CliError::config("either --vin or --regnr is required")),
    };

    let vehicle = found.ok_or_else(|| CliError::VehicleNotFound(what))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&vehicle).map_err(anyhow::Error::from)?);
    } else {
        println!("{}", vehicle);
    }
    Ok(())
}
