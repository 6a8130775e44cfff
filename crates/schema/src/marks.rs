//! Text formatting marks.
//!
//! A text node stores its marks as an integer bit set (`format`). Bits outside the known set
//! are kept as they are so that files written by newer editors survive a round-trip.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Formatting marks applied to a run of text.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextFormat: i64 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
        const HIGHLIGHT = 1 << 7;
    }
}

impl TextFormat {
    /// Names of the known marks that are set, in bit order.
    pub fn mark_names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }

    /// Bits that do not correspond to a known mark.
    pub fn unknown_bits(&self) -> i64 {
        self.bits() & !Self::all().bits()
    }
}

impl Serialize for TextFormat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.bits())
    }
}

impl<'de> Deserialize<'de> for TextFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Self::from_bits_retain(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_combined_marks() {
        let format: TextFormat = serde_json::from_str("9").expect("parse");
        assert!(format.contains(TextFormat::BOLD));
        assert!(format.contains(TextFormat::UNDERLINE));
        assert!(!format.contains(TextFormat::ITALIC));
        assert_eq!(format.mark_names(), vec!["BOLD", "UNDERLINE"]);
    }

    #[test]
    fn keeps_unknown_bits() {
        let format: TextFormat = serde_json::from_str("1025").expect("parse");
        assert_eq!(format.unknown_bits(), 1024);
        assert_eq!(serde_json::to_string(&format).expect("serialise"), "1025");
    }

    #[test]
    fn rejects_non_integer() {
        assert!(serde_json::from_str::<TextFormat>("\"bold\"").is_err());
        assert!(serde_json::from_str::<TextFormat>("1.5").is_err());
    }
}
