//! `blueprint types`: list the transformers the service accepts.

use super::error::HelpfulError;
use super::output::print_table;
use anyhow::Result;
use blueprint_schema::{SchemaService, Transformer, TransformerKind};
use serde::Serialize;

#[derive(Debug)]
pub struct TypesArgs {
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo {
    pub tag: String,
    pub kind: String,
    /// False for tags this build does not know; they behave as scalars
    pub known: bool,
}

pub fn kind_label(kind: TransformerKind) -> String {
    match kind {
        TransformerKind::Scalar => "scalar".to_string(),
        TransformerKind::BoundedString { max_size } => format!("string (size 1..={})", max_size),
        TransformerKind::MappingTransformer { .. } => "mapping (needs mapping column)".to_string(),
    }
}

pub fn describe(tags: &[String]) -> Vec<TypeInfo> {
    tags.iter()
        .map(|tag| {
            let transformer = Transformer::from(tag.as_str());
            TypeInfo {
                tag: tag.clone(),
                kind: kind_label(transformer.kind()),
                known: !matches!(transformer, Transformer::Custom(_)),
            }
        })
        .collect()
}

pub async fn run<S>(args: TypesArgs, service: &S, base_url: &str) -> Result<()>
where
    S: SchemaService + ?Sized,
{
    let tags = service
        .fetch_types()
        .await
        .map_err(|e| HelpfulError::service_error(base_url, &e))?;
    let types = describe(&tags);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    let rows = types
        .into_iter()
        .map(|t| {
            let note = if t.known { String::new() } else { "unknown to this build".to_string() };
            vec![t.tag, t.kind, note]
        })
        .collect();
    print_table(&["Transformer", "Kind", "Note"], rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_and_unknown() {
        let tags = vec!["varchar".to_string(), "userIDWithMapping".to_string(), "geohash".to_string()];
        let types = describe(&tags);
        assert_eq!(types[0].kind, "string (size 1..=65535)");
        assert!(types[0].known);
        assert_eq!(types[1].kind, "mapping (needs mapping column)");
        assert_eq!(types[2].kind, "scalar");
        assert!(!types[2].known);
    }
}
