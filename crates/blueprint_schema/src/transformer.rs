//! Transformer catalog
//!
//! A transformer selects the conversion function that turns an inbound event
//! property into an outbound column value. The set is closed: the persistence
//! service only understands the tags listed here. Tags reported by a newer
//! catalog survive a round-trip as [`Transformer::Custom`] and behave as
//! scalars.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Upper bound for a bounded-string column size.
pub const MAX_BOUNDED_STRING_SIZE: u32 = 65535;

/// A conversion function tag for a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Transformer {
    Bigint,
    Bool,
    Float,
    Int,
    IpAsn,
    IpAsnInteger,
    IpCity,
    IpCountry,
    IpRegion,
    /// Length-bounded string; the only transformer whose size matters
    #[default]
    Varchar,
    UnixTimestamp,
    UnixTimestampUtc,
    /// Resolves a user id through another column's inbound value
    UserIdWithMapping,
    /// Tag not known to this build of the catalog
    Custom(String),
}

/// Structural shape of a transformer, used by column validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformerKind {
    /// Fixed-representation value, no extra parameters
    Scalar,
    /// String bounded by `0 < size <= max_size`
    BoundedString { max_size: u32 },
    /// Value derived from a supporting column's inbound name
    MappingTransformer { supporting_column_required: bool },
}

impl Transformer {
    /// Every tag known to the catalog, in service order.
    pub fn all() -> Vec<Transformer> {
        vec![
            Transformer::Bigint,
            Transformer::Bool,
            Transformer::Float,
            Transformer::Int,
            Transformer::IpAsn,
            Transformer::IpAsnInteger,
            Transformer::IpCity,
            Transformer::IpCountry,
            Transformer::IpRegion,
            Transformer::Varchar,
            Transformer::UnixTimestamp,
            Transformer::UnixTimestampUtc,
            Transformer::UserIdWithMapping,
        ]
    }

    /// The wire tag understood by the persistence service.
    pub fn as_str(&self) -> &str {
        match self {
            Transformer::Bigint => "bigint",
            Transformer::Bool => "bool",
            Transformer::Float => "float",
            Transformer::Int => "int",
            Transformer::IpAsn => "ipAsn",
            Transformer::IpAsnInteger => "ipAsnInteger",
            Transformer::IpCity => "ipCity",
            Transformer::IpCountry => "ipCountry",
            Transformer::IpRegion => "ipRegion",
            Transformer::Varchar => "varchar",
            Transformer::UnixTimestamp => "f@timestamp@unix",
            Transformer::UnixTimestampUtc => "f@timestamp@unix-utc",
            Transformer::UserIdWithMapping => "userIDWithMapping",
            Transformer::Custom(tag) => tag,
        }
    }

    pub fn kind(&self) -> TransformerKind {
        match self {
            Transformer::Varchar => TransformerKind::BoundedString {
                max_size: MAX_BOUNDED_STRING_SIZE,
            },
            Transformer::UserIdWithMapping => TransformerKind::MappingTransformer {
                supporting_column_required: true,
            },
            _ => TransformerKind::Scalar,
        }
    }

    /// True when no tag was chosen at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Transformer::Custom(tag) if tag.is_empty())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind(), TransformerKind::MappingTransformer { .. })
    }

    pub fn is_bounded_string(&self) -> bool {
        matches!(self.kind(), TransformerKind::BoundedString { .. })
    }
}

impl fmt::Display for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transformer {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s {
            "bigint" => Transformer::Bigint,
            "bool" => Transformer::Bool,
            "float" => Transformer::Float,
            "int" => Transformer::Int,
            "ipAsn" => Transformer::IpAsn,
            "ipAsnInteger" => Transformer::IpAsnInteger,
            "ipCity" => Transformer::IpCity,
            "ipCountry" => Transformer::IpCountry,
            "ipRegion" => Transformer::IpRegion,
            "varchar" => Transformer::Varchar,
            "f@timestamp@unix" => Transformer::UnixTimestamp,
            "f@timestamp@unix-utc" => Transformer::UnixTimestampUtc,
            "userIDWithMapping" => Transformer::UserIdWithMapping,
            other => Transformer::Custom(other.to_string()),
        };
        Ok(parsed)
    }
}

impl From<&str> for Transformer {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Transformer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Transformer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_parse_to_variants() {
        for t in Transformer::all() {
            let parsed: Transformer = t.as_str().into();
            assert_eq!(parsed, t);
        }
    }

    #[test]
    fn test_unknown_tag_is_custom_scalar() {
        let t = Transformer::from("geoHash");
        assert_eq!(t, Transformer::Custom("geoHash".to_string()));
        assert_eq!(t.kind(), TransformerKind::Scalar);
        assert!(!t.is_empty());
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(Transformer::from("VARCHAR"), Transformer::Custom("VARCHAR".to_string()));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            Transformer::Varchar.kind(),
            TransformerKind::BoundedString { max_size: 65535 }
        );
        assert!(Transformer::UserIdWithMapping.is_mapping());
        assert!(!Transformer::IpCity.is_mapping());
        assert!(Transformer::from("").is_empty());
    }

    #[test]
    fn test_serde_uses_wire_tag() {
        let json = serde_json::to_string(&Transformer::UnixTimestampUtc).unwrap();
        assert_eq!(json, "\"f@timestamp@unix-utc\"");
        let back: Transformer = serde_json::from_str("\"userIDWithMapping\"").unwrap();
        assert_eq!(back, Transformer::UserIdWithMapping);
    }
}
