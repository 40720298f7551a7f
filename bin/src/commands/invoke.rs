//! Invoke command implementation.
//!
//! Invokes a data service with name=value parameters.

use anyhow::Result;

use crate::display::{build_hub, parse_param};

pub(crate) async fn invoke(
    api_key: &Option<String>,
    base_url: &Option<String>,
    service: &str,
    raw_params: &[String],
    cache_minutes: u64,
    pretty: bool,
) -> Result<()> {
    let params = raw_params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<Result<Vec<_>>>()?;

    let hub = build_hub(api_key, base_url)?;
    let service = hub.data_service(service).with_cache_minutes(cache_minutes);
    let result = service.invoke(&params).await?;

    let stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(stdout, &result)?;
    } else {
        serde_json::to_writer(stdout, &result)?;
    }
    println!();

    Ok(())
}
