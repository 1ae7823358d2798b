//! Genogram value objects
//!
//! Value objects are immutable types that represent concepts in the genogram domain.
//! They are compared by value rather than identity. Every enumeration here has a fixed
//! string vocabulary which is also the tag used by the transport schema.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a person or fetus node, unique within one genogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw node number
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw node number
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Parse the transport form (`n12`)
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix('n')?.parse().ok().map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identifier of a relationship, unique within one genogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationshipId(u64);

impl RelationshipId {
    /// Wrap a raw relationship number
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw relationship number
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Parse the transport form (`r4`)
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix('r')?.parse().ok().map(Self)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Identifier of a persisted genogram document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a fresh document identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a closed enumeration with a fixed snake_case vocabulary.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $tag:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every member of the vocabulary, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Get the vocabulary tag
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }

            /// Look up a vocabulary tag; unknown tags are rejected
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($tag => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Gender or identity category of a person
    Gender {
        /// Drawn as a square
        Male => "male",
        /// Drawn as a circle
        Female => "female",
        NonBinary => "non_binary",
        Unknown => "unknown",
    }
}

vocabulary! {
    /// Whether a person is alive
    VitalStatus {
        Alive => "alive",
        Deceased => "deceased",
    }
}

vocabulary! {
    /// Status of a partner relationship
    PartnerStatus {
        Married => "married",
        Divorced => "divorced",
        Separated => "separated",
        Dating => "dating",
        Cohabiting => "cohabiting",
        Engaged => "engaged",
        Affair => "affair",
        Widowed => "widowed",
        /// Used for synthesized parent pairs
        Unknown => "unknown",
    }
}

vocabulary! {
    /// Status of a parent-child link
    ParentChildStatus {
        Biological => "biological",
        Adopted => "adopted",
        Foster => "foster",
        Pregnancy => "pregnancy",
        Miscarriage => "miscarriage",
        Abortion => "abortion",
    }
}

vocabulary! {
    /// Closeness or conflict quality of an emotional link
    EmotionalStatus {
        Close => "close",
        Fused => "fused",
        Distant => "distant",
        Hostile => "hostile",
        Conflictual => "conflictual",
        Cutoff => "cutoff",
        Abusive => "abusive",
    }
}

vocabulary! {
    /// Outcome of a pregnancy carried by a fetus node
    FetusStatus {
        Pregnancy => "pregnancy",
        Miscarriage => "miscarriage",
        Abortion => "abortion",
    }
}

impl Gender {
    /// Horizontal rank inside a couple: male left, female right, everything else between
    pub fn couple_rank(&self) -> u8 {
        match self {
            Gender::Male => 0,
            Gender::NonBinary | Gender::Unknown => 1,
            Gender::Female => 2,
        }
    }
}

impl Default for Gender {
    fn default() -> Self {
        Gender::Unknown
    }
}

impl Default for VitalStatus {
    fn default() -> Self {
        VitalStatus::Alive
    }
}

/// Represents the position of a node in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by an offset
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl Default for Position2D {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_transport_form() {
        let id = NodeId::new(12);
        assert_eq!(id.to_string(), "n12");
        assert_eq!(NodeId::parse("n12"), Some(id));
        assert_eq!(NodeId::parse("r12"), None);
        assert_eq!(NodeId::parse("n"), None);
    }

    #[test]
    fn test_relationship_id_transport_form() {
        let id = RelationshipId::new(4);
        assert_eq!(id.to_string(), "r4");
        assert_eq!(RelationshipId::parse("r4"), Some(id));
        assert_eq!(RelationshipId::parse("n4"), None);
    }

    #[test]
    fn test_vocabulary_round_trip() {
        for status in EmotionalStatus::ALL {
            assert_eq!(EmotionalStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(PartnerStatus::parse("married"), Some(PartnerStatus::Married));
        assert_eq!(PartnerStatus::parse("Married"), None);
        assert_eq!(Gender::parse("non_binary"), Some(Gender::NonBinary));
    }

    #[test]
    fn test_vocabulary_serde_tags() {
        let json = serde_json::to_string(&ParentChildStatus::Adopted).unwrap();
        assert_eq!(json, "\"adopted\"");
        let parsed: Result<FetusStatus, _> = serde_json::from_str("\"stillbirth\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_couple_rank() {
        assert!(Gender::Male.couple_rank() < Gender::Female.couple_rank());
        assert!(Gender::Unknown.couple_rank() < Gender::Female.couple_rank());
    }
}
