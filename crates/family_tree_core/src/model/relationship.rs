//! Role vocabulary and pairwise relation labels.
//!
//! # Responsibility
//! - Define the fixed role vocabulary stored on every member.
//! - Map a pair of roles to the labels each endpoint shows for the other.
//!
//! # Invariants
//! - `Relationship::SelfProfile` is reserved for the owner profile.
//! - `resolve_relation_labels` is pure and total: untabulated pairs pass
//!   through unchanged.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Role label stored on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Parent,
    Child,
    Sibling,
    Spouse,
    Grandparent,
    Cousin,
    Relatives,
    Pet,
    /// Owner profile role, serialized as `Self`.
    #[serde(rename = "Self")]
    SelfProfile,
}

impl Relationship {
    /// Roles a non-owner member may take, in form order.
    pub const MEMBER_CHOICES: [Relationship; 8] = [
        Relationship::Parent,
        Relationship::Child,
        Relationship::Sibling,
        Relationship::Spouse,
        Relationship::Grandparent,
        Relationship::Cousin,
        Relationship::Relatives,
        Relationship::Pet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "Parent",
            Self::Child => "Child",
            Self::Sibling => "Sibling",
            Self::Spouse => "Spouse",
            Self::Grandparent => "Grandparent",
            Self::Cousin => "Cousin",
            Self::Relatives => "Relatives",
            Self::Pet => "Pet",
            Self::SelfProfile => "Self",
        }
    }
}

impl Display for Relationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role label is outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRelationshipError(pub String);

impl Display for ParseRelationshipError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown relationship `{}`", self.0)
    }
}

impl Error for ParseRelationshipError {}

impl FromStr for Relationship {
    type Err = ParseRelationshipError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Parent" => Ok(Self::Parent),
            "Child" => Ok(Self::Child),
            "Sibling" => Ok(Self::Sibling),
            "Spouse" => Ok(Self::Spouse),
            "Grandparent" => Ok(Self::Grandparent),
            "Cousin" => Ok(Self::Cousin),
            "Relatives" => Ok(Self::Relatives),
            "Pet" => Ok(Self::Pet),
            "Self" => Ok(Self::SelfProfile),
            other => Err(ParseRelationshipError(other.to_string())),
        }
    }
}

/// Display label one endpoint of a connection shows for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationLabel {
    Parent,
    Child,
    Sibling,
    Spouse,
    Grandparent,
    Grandchild,
    GreatGrandparent,
    GreatGrandchild,
    Cousin,
    Relatives,
    Pet,
    PetFriend,
    Owner,
    SelfProfile,
}

impl RelationLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "Parent",
            Self::Child => "Child",
            Self::Sibling => "Sibling",
            Self::Spouse => "Spouse",
            Self::Grandparent => "Grandparent",
            Self::Grandchild => "Grandchild",
            Self::GreatGrandparent => "Great-grandparent",
            Self::GreatGrandchild => "Great-grandchild",
            Self::Cousin => "Cousin",
            Self::Relatives => "Relatives",
            Self::Pet => "Pet",
            Self::PetFriend => "Pet Friend",
            Self::Owner => "Owner",
            Self::SelfProfile => "Self",
        }
    }

    /// Role this label corresponds to, when it names a storable role.
    pub fn as_relationship(self) -> Option<Relationship> {
        match self {
            Self::Parent => Some(Relationship::Parent),
            Self::Child => Some(Relationship::Child),
            Self::Sibling => Some(Relationship::Sibling),
            Self::Spouse => Some(Relationship::Spouse),
            Self::Grandparent => Some(Relationship::Grandparent),
            Self::Cousin => Some(Relationship::Cousin),
            Self::Relatives => Some(Relationship::Relatives),
            Self::Pet => Some(Relationship::Pet),
            Self::Grandchild
            | Self::GreatGrandparent
            | Self::GreatGrandchild
            | Self::PetFriend
            | Self::Owner
            | Self::SelfProfile => None,
        }
    }
}

impl Display for RelationLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Relationship> for RelationLabel {
    fn from(value: Relationship) -> Self {
        match value {
            Relationship::Parent => Self::Parent,
            Relationship::Child => Self::Child,
            Relationship::Sibling => Self::Sibling,
            Relationship::Spouse => Self::Spouse,
            Relationship::Grandparent => Self::Grandparent,
            Relationship::Cousin => Self::Cousin,
            Relationship::Relatives => Self::Relatives,
            Relationship::Pet => Self::Pet,
            Relationship::SelfProfile => Self::SelfProfile,
        }
    }
}

/// Resolves the labels shown at each endpoint of a `role1`-`role2` link.
///
/// Rules apply in order: pets, owner-profile table, same-role table, then the
/// cross-role table. Anything untabulated passes both roles through.
pub fn resolve_relation_labels(
    role1: Relationship,
    role2: Relationship,
    involves_owner_profile: bool,
) -> (RelationLabel, RelationLabel) {
    use RelationLabel as L;
    use Relationship as R;

    let passthrough = (L::from(role1), L::from(role2));

    match (role1, role2) {
        (R::Pet, R::Pet) => return (L::PetFriend, L::PetFriend),
        (R::Pet, _) => return (L::Pet, L::Owner),
        (_, R::Pet) => return (L::Owner, L::Pet),
        _ => {}
    }

    if involves_owner_profile {
        return match role1 {
            R::Child => (L::Parent, L::Child),
            R::Parent => (L::Child, L::Parent),
            R::Grandparent => (L::Grandchild, L::Grandparent),
            R::Spouse => (L::Spouse, L::Spouse),
            R::Cousin => (L::Cousin, L::Cousin),
            R::Relatives => (L::Relatives, L::Relatives),
            _ => passthrough,
        };
    }

    if role1 == role2 {
        return match role1 {
            R::Parent | R::Grandparent => (L::Spouse, L::Spouse),
            R::Child => (L::Sibling, L::Sibling),
            R::Cousin => (L::Cousin, L::Cousin),
            R::Relatives => (L::Relatives, L::Relatives),
            _ => passthrough,
        };
    }

    match (role1, role2) {
        (R::Grandparent, R::Parent) => (L::Parent, L::Child),
        (R::Grandparent, R::Child) => (L::GreatGrandparent, L::GreatGrandchild),
        (R::Grandparent, R::Cousin | R::Relatives) => (L::Relatives, L::Relatives),
        (R::Grandparent, R::Spouse) => (L::Spouse, L::Spouse),

        (R::Parent, R::Grandparent) => (L::Child, L::Parent),
        (R::Parent, R::Child) => (L::Parent, L::Child),
        (R::Parent, R::Cousin) => (L::Cousin, L::Cousin),
        (R::Parent, R::Spouse) => (L::Parent, L::Child),
        (R::Parent, R::Relatives) => (L::Relatives, L::Relatives),

        (R::Child, R::Parent) => (L::Grandparent, L::Grandchild),
        (R::Child, R::Grandparent) => (L::GreatGrandparent, L::GreatGrandchild),
        (R::Child, R::Spouse) => (L::Parent, L::Child),
        (R::Child, R::Cousin | R::Relatives) => (L::Relatives, L::Relatives),

        (R::Spouse, R::Child) => (L::Parent, L::Child),
        (R::Spouse, R::Parent) => (L::Child, L::Parent),
        (R::Spouse, R::Grandparent) => (L::Grandchild, L::Grandparent),
        (R::Spouse, R::Cousin) => (L::Cousin, L::Cousin),
        (R::Spouse, R::Relatives) => (L::Relatives, L::Relatives),
        (R::Spouse, _) => (L::Spouse, L::Spouse),

        (R::Cousin | R::Relatives, _) => (L::Relatives, L::Relatives),

        _ => passthrough,
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_relation_labels, RelationLabel, Relationship};

    #[test]
    fn relationship_parses_its_own_labels() {
        for role in Relationship::MEMBER_CHOICES {
            assert_eq!(role.as_str().parse::<Relationship>(), Ok(role));
        }
        assert_eq!("Self".parse::<Relationship>(), Ok(Relationship::SelfProfile));
        assert!("Aunt".parse::<Relationship>().is_err());
    }

    #[test]
    fn sibling_pairs_pass_through() {
        assert_eq!(
            resolve_relation_labels(Relationship::Sibling, Relationship::Sibling, false),
            (RelationLabel::Sibling, RelationLabel::Sibling)
        );
    }

    #[test]
    fn label_wire_text_keeps_hyphenated_forms() {
        assert_eq!(RelationLabel::GreatGrandparent.as_str(), "Great-grandparent");
        assert_eq!(RelationLabel::PetFriend.to_string(), "Pet Friend");
    }
}
