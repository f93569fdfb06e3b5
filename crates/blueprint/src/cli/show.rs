//! `blueprint show`: print an event's baseline schema.

use super::error::HelpfulError;
use super::output::print_schema;
use anyhow::Result;
use blueprint_schema::{Schema, SchemaService};

#[derive(Debug)]
pub struct ShowArgs {
    pub event: String,
    pub json: bool,
}

/// Fetch the baseline for `event`.
pub async fn fetch<S>(service: &S, base_url: &str, event: &str) -> Result<Schema>
where
    S: SchemaService + ?Sized,
{
    service
        .fetch_schema(event)
        .await
        .map_err(|e| HelpfulError::service_error(base_url, &e).into())
}

pub async fn run<S>(args: ShowArgs, service: &S, base_url: &str) -> Result<()>
where
    S: SchemaService + ?Sized,
{
    let schema = fetch(service, base_url, &args.event).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        print_schema(&schema);
    }
    Ok(())
}
