//! Catalog identities: which catalog an entry lives in and how slide keys order.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Slides,
    Infographics,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 2] = [CatalogKind::Slides, CatalogKind::Infographics];

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Slides => "slides",
            CatalogKind::Infographics => "infographics",
        }
    }

    /// Only slide catalogs carry `<group>_<ordinal>` keys with an ordering.
    pub fn supports_adjacency(self) -> bool {
        matches!(self, CatalogKind::Slides)
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "slides" => Ok(CatalogKind::Slides),
            "infographics" => Ok(CatalogKind::Infographics),
            other => Err(format!("unknown catalog `{other}`")),
        }
    }
}

/// Composite slide key `"<group>_<ordinal>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideKey {
    pub group: u64,
    pub ordinal: u64,
}

impl SlideKey {
    /// Accepts exactly `<group>_<ordinal>` with both parts numeric. Any other
    /// key, including one with extra `_` segments, has no neighbours.
    pub fn parse(key: &str) -> Option<Self> {
        let (group, ordinal) = key.split_once('_')?;
        Some(Self {
            group: group.parse().ok()?,
            ordinal: ordinal.parse().ok()?,
        })
    }

    pub fn next(self) -> Option<Self> {
        Some(Self {
            ordinal: self.ordinal.checked_add(1)?,
            ..self
        })
    }

    pub fn previous(self) -> Option<Self> {
        Some(Self {
            ordinal: self.ordinal.checked_sub(1)?,
            ..self
        })
    }
}

impl fmt::Display for SlideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.group, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_composite_slide_keys() {
        assert_eq!(
            SlideKey::parse("3_2"),
            Some(SlideKey {
                group: 3,
                ordinal: 2
            })
        );
        assert_eq!(SlideKey::parse("12_0").map(|k| k.to_string()), Some("12_0".into()));
        assert_eq!(SlideKey::parse("1042"), None);
        assert_eq!(SlideKey::parse("a_1"), None);
        assert_eq!(SlideKey::parse("1_b"), None);
        assert_eq!(SlideKey::parse("3_2_x"), None);
    }

    #[test]
    fn steps_within_a_group() {
        let key = SlideKey::parse("3_2").expect("key");
        assert_eq!(key.next().map(|k| k.to_string()), Some("3_3".into()));
        assert_eq!(key.previous().map(|k| k.to_string()), Some("3_1".into()));
        assert_eq!(
            SlideKey::parse("3_0").and_then(SlideKey::previous),
            None
        );
    }

    #[test]
    fn only_slides_support_adjacency() {
        assert!(CatalogKind::Slides.supports_adjacency());
        assert!(!CatalogKind::Infographics.supports_adjacency());
        assert_eq!("infographics".parse(), Ok(CatalogKind::Infographics));
        assert!("posters".parse::<CatalogKind>().is_err());
    }
}
