//! The S/I/E/⊥ marker alphabet cells of a tableau are built from.

use std::fmt;

/// One cell of a tableau's per-timeline column: a label start, a label
/// continuation ("interior"), a label end, or absence.
///
/// `Null`'s `Display` emits the literal `"_"`, matching the reference
/// implementation's raw-row and searchable-string spelling of ⊥.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Marker {
    Start(String),
    Interior(String),
    End(String),
    Null,
}

impl Marker {
    /// The label carried by this marker, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Marker::Start(l) | Marker::Interior(l) | Marker::End(l) => Some(l),
            Marker::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Marker::Null)
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Marker::Start(_))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Marker::End(_))
    }

    pub fn is_interior(&self) -> bool {
        matches!(self, Marker::Interior(_))
    }

    /// Parses the reference's textual spelling (`S_label`, `I_label`,
    /// `E_label`, `_`) into a `Marker`.
    pub fn parse(raw: &str) -> Option<Marker> {
        if raw == "_" {
            return Some(Marker::Null);
        }
        let (tag, label) = raw.split_once('_')?;
        if label.is_empty() {
            return None;
        }
        match tag {
            "S" => Some(Marker::Start(label.to_string())),
            "I" => Some(Marker::Interior(label.to_string())),
            "E" => Some(Marker::End(label.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Start(l) => write!(f, "S_{l}"),
            Marker::Interior(l) => write!(f, "I_{l}"),
            Marker::End(l) => write!(f, "E_{l}"),
            Marker::Null => write!(f, "_"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        for raw in ["S_a", "I_bar", "E_c", "_"] {
            let marker = Marker::parse(raw).expect("should parse");
            assert_eq!(marker.to_string(), raw);
        }
    }

    #[test]
    fn parse_rejects_unknown_tags() {
        assert_eq!(Marker::parse("X_a"), None);
        assert_eq!(Marker::parse("noseparator"), None);
        assert_eq!(Marker::parse("S_"), None);
    }

    #[test]
    fn label_accessor() {
        assert_eq!(Marker::Start("a".into()).label(), Some("a"));
        assert_eq!(Marker::Null.label(), None);
    }
}
