//! Fixed column policies: protected, reserved, and non-deletable columns.

use crate::schema::Schema;

/// Outbound name that may never be deleted or renamed.
pub const PROTECTED_COLUMN: &str = "time";

/// Outbound names the warehouse reserves, compared lower-case.
pub const RESERVED_OUTBOUND_NAMES: &[&str] = &["date"];

/// Creation-option markers that pin a column in place.
pub const FORBIDDEN_DELETE_MARKERS: &[&str] = &["distkey", "sortkey"];

pub fn is_reserved_outbound_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    RESERVED_OUTBOUND_NAMES.iter().any(|r| *r == lower)
}

/// Whether the baseline column at `index` may be staged for deletion.
///
/// Consulted before staging; commit validation does not repeat it. An index
/// outside the baseline is never deletable.
pub fn is_column_deletable(schema: &Schema, index: usize) -> bool {
    match schema.column(index) {
        Some(column) => !FORBIDDEN_DELETE_MARKERS
            .iter()
            .any(|marker| column.column_creation_options.contains(marker)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    #[test]
    fn test_reserved_names_case_insensitive() {
        assert!(is_reserved_outbound_name("date"));
        assert!(is_reserved_outbound_name("DATE"));
        assert!(is_reserved_outbound_name("Date"));
        assert!(!is_reserved_outbound_name("date_utc"));
    }

    #[test]
    fn test_sort_and_dist_keys_not_deletable() {
        let schema = Schema::new(
            "login",
            vec![
                Column::new("time", "time", "f@timestamp@unix").with_options(" sortkey"),
                Column::new("user", "user", "bigint").with_options(" distkey"),
                Column::new("ip", "ip", "varchar").with_size(15),
            ],
        );
        assert!(!is_column_deletable(&schema, 0));
        assert!(!is_column_deletable(&schema, 1));
        assert!(is_column_deletable(&schema, 2));
        assert!(!is_column_deletable(&schema, 3));
    }
}
