//! Baseline schema for one event.

use crate::column::Column;
use serde::{Deserialize, Serialize};

/// The server-confirmed column layout of an event.
///
/// Column order is display order; it only matters for positional deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "EventName")]
    pub event_name: String,

    #[serde(rename = "Columns", default)]
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(event_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            event_name: event_name.into(),
            columns,
        }
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Baseline index of the column with this outbound name.
    pub fn position_of(&self, outbound_name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.outbound_name == outbound_name)
    }

    pub fn outbound_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.outbound_name.as_str())
    }

    /// True when no two columns share an outbound name.
    pub fn has_unique_outbound_names(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.outbound_names().all(|name| seen.insert(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_annotated_schema() {
        let json = r#"{
            "EventName": "login",
            "Version": 3,
            "Columns": [
                {"InboundName":"time","OutboundName":"time","Transformer":"f@timestamp@unix","ColumnCreationOptions":" sortkey","SupportingColumns":""},
                {"InboundName":"ip","OutboundName":"ip","Transformer":"varchar","ColumnCreationOptions":"(15)","SupportingColumns":""}
            ]
        }"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.event_name, "login");
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.position_of("ip"), Some(1));
        assert_eq!(schema.column(1).and_then(|c| c.bounded_size()), Some(15));
        assert!(schema.has_unique_outbound_names());
    }

    #[test]
    fn test_duplicate_outbound_names_detected() {
        let schema = Schema::new(
            "e",
            vec![Column::new("a", "x", "int"), Column::new("b", "x", "int")],
        );
        assert!(!schema.has_unique_outbound_names());
    }
}
