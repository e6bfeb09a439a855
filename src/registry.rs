// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The catalog of type tags understood by the marshalers.
//!
//! Every value on the wire carries (or is inferred to have) a type tag. The registry maps each tag
//! to the [Kind] of value it denotes, which is what the JSON and XML marshalers branch on when
//! decoding. The tables are static, so the registry needs no initialization and may be consulted
//! from any number of threads.

use crate::member::MemberKind;
use crate::schema::DomainType;
use std::fmt::{self, Display, Formatter};

/// Scalar value kinds.
///
/// The first four are native to JSON and are written as bare scalars. The rest always travel
/// inside a typed envelope so that their meaning survives the trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    Float,
    String,
    Bytes,
    Date,
    Id,
    Path,
    Url,
    Email,
}

impl PrimitiveKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Date => "date",
            Self::Id => "id",
            Self::Path => "path",
            Self::Url => "url",
            Self::Email => "email",
        }
    }

    /// Whether values of this kind are written as bare JSON scalars.
    pub fn is_native(self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Integer | Self::Float | Self::String
        )
    }

    /// Whether the value of this kind is carried as a string.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Self::String | Self::Id | Self::Path | Self::Url | Self::Email
        )
    }
}

/// Collection kinds. Sets are sequences whose uniqueness is up to the caller, and a sorted map
/// is a map whose key order is significant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Map,
    SortedMap,
    Set,
    SortedSet,
    List,
}

impl CollectionKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::SortedMap => "sortedMap",
            Self::Set => "set",
            Self::SortedSet => "sortedSet",
            Self::List => "list",
        }
    }

    pub fn is_associative(self) -> bool {
        matches!(self, Self::Map | Self::SortedMap)
    }
}

/// What a type tag resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Primitive(PrimitiveKind),
    Collection(CollectionKind),
    Object(DomainType),
    Member(MemberKind),
    Unknown,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Primitive(kind) => write!(f, "primitive {}", kind.tag()),
            Kind::Collection(kind) => write!(f, "collection {}", kind.tag()),
            Kind::Object(ty) => write!(f, "domain object {}", ty.name()),
            Kind::Member(kind) => write!(f, "member {}", kind.tag()),
            Kind::Unknown => write!(f, "unknown"),
        }
    }
}

pub const PRIMITIVES: &[PrimitiveKind] = &[
    PrimitiveKind::Boolean,
    PrimitiveKind::Integer,
    PrimitiveKind::Float,
    PrimitiveKind::String,
    PrimitiveKind::Bytes,
    PrimitiveKind::Date,
    PrimitiveKind::Id,
    PrimitiveKind::Path,
    PrimitiveKind::Url,
    PrimitiveKind::Email,
];

pub const COLLECTIONS: &[CollectionKind] = &[
    CollectionKind::Map,
    CollectionKind::SortedMap,
    CollectionKind::Set,
    CollectionKind::SortedSet,
    CollectionKind::List,
];

/// Resolve a type tag against the catalog.
///
/// Tags the catalog does not know resolve to [Kind::Unknown]. Callers decide whether that is an
/// error; the marshalers pass such values through opaquely.
pub fn resolve(tag: &str) -> Kind {
    if let Some(kind) = PRIMITIVES.iter().find(|kind| kind.tag() == tag) {
        return Kind::Primitive(*kind);
    }
    if let Some(kind) = COLLECTIONS.iter().find(|kind| kind.tag() == tag) {
        return Kind::Collection(*kind);
    }
    if let Some(ty) = DomainType::from_name(tag) {
        return Kind::Object(ty);
    }
    if let Some(kind) = MemberKind::from_tag(tag) {
        return Kind::Member(kind);
    }
    Kind::Unknown
}

/// Whether `tag` names a JSON-native primitive.
pub fn is_native(tag: &str) -> bool {
    matches!(resolve(tag), Kind::Primitive(kind) if kind.is_native())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_catalog_tag() {
        assert_eq!(resolve("integer"), Kind::Primitive(PrimitiveKind::Integer));
        assert_eq!(resolve("path"), Kind::Primitive(PrimitiveKind::Path));
        assert_eq!(resolve("sortedMap"), Kind::Collection(CollectionKind::SortedMap));
        assert_eq!(resolve("sortedSet"), Kind::Collection(CollectionKind::SortedSet));
        assert_eq!(resolve("flow"), Kind::Object(DomainType::Flow));
        assert_eq!(resolve("drop"), Kind::Object(DomainType::Drop));
        assert_eq!(resolve("permissions"), Kind::Member(MemberKind::Permissions));
        assert_eq!(resolve("constraint"), Kind::Member(MemberKind::Constraint));
    }

    #[test]
    fn unknown_tags_are_not_errors() {
        assert_eq!(resolve("hologram"), Kind::Unknown);
        assert_eq!(resolve(""), Kind::Unknown);
        // Tags are case sensitive.
        assert_eq!(resolve("Flow"), Kind::Unknown);
    }

    #[test]
    fn native_primitives() {
        assert!(is_native("string"));
        assert!(is_native("boolean"));
        assert!(!is_native("path"));
        assert!(!is_native("date"));
        assert!(!is_native("map"));
        assert!(!is_native("flow"));
    }
}
