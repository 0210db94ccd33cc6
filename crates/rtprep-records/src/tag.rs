//! Data element tags and the tags the pipeline reads or rewrites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;

/// A `(group, element)` data element tag.
///
/// Serialized as `"GGGG,EEEE"` in upper-case hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
    pub group: u16,
    pub element: u16,
}

impl Tag {
    #[must_use]
    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X},{:04X}", self.group, self.element)
    }
}

impl FromStr for Tag {
    type Err = RecordError;

    /// Accepts `GGGG,EEEE`, `(GGGG,EEEE)` and `GGGGEEEE`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || RecordError::InvalidTag(raw.to_string());
        let trimmed = raw
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .replace(',', "");
        if trimmed.len() != 8 || !trimmed.is_ascii() {
            return Err(invalid());
        }
        let group = u16::from_str_radix(&trimmed[..4], 16).map_err(|_| invalid())?;
        let element = u16::from_str_radix(&trimmed[4..], 16).map_err(|_| invalid())?;
        Ok(Self { group, element })
    }
}

impl TryFrom<String> for Tag {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

/// Tags used by the cleanup pipeline.
pub mod tags {
    use super::Tag;

    pub const SOP_INSTANCE_UID: Tag = Tag::new(0x0008, 0x0018);
    pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag::new(0x0008, 0x1155);
    pub const DOSE_GRID_SCALING: Tag = Tag::new(0x3004, 0x000E);
    pub const ROI_NAME: Tag = Tag::new(0x3006, 0x0026);
    pub const RT_PLAN_LABEL: Tag = Tag::new(0x300A, 0x0002);
    pub const RT_PLAN_NAME: Tag = Tag::new(0x300A, 0x0003);
    pub const NUMBER_OF_FRACTIONS_PLANNED: Tag = Tag::new(0x300A, 0x0078);
    pub const SETUP_TECHNIQUE_DESCRIPTION: Tag = Tag::new(0x300A, 0x01B2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("300A,0002")]
    #[case("(300a,0002)")]
    #[case("300A0002")]
    fn parses_supported_forms(#[case] raw: &str) {
        assert_eq!(raw.parse::<Tag>().unwrap(), tags::RT_PLAN_LABEL);
    }

    #[rstest]
    #[case("300A")]
    #[case("GGGG,0002")]
    #[case("300A,00022")]
    fn rejects_malformed(#[case] raw: &str) {
        assert!(matches!(raw.parse::<Tag>(), Err(RecordError::InvalidTag(_))));
    }

    #[test]
    fn serializes_as_hex_pair() {
        let json = serde_json::to_string(&tags::DOSE_GRID_SCALING).unwrap();
        assert_eq!(json, "\"3004,000E\"");
        let back: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tags::DOSE_GRID_SCALING);
    }
}
