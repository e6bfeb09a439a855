// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::member::Member;
use crate::object::DomainObject;
use crate::registry::{self, CollectionKind, Kind, PrimitiveKind};
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;

/// The in-memory form of a value on the wire.
///
/// Sets and sorted sets are plain sequences; uniqueness and order are up to whoever builds them.
/// Maps keep insertion order, which is what a sorted map relies on.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Carried on the wire with millisecond precision.
    Date(DateTime<Utc>),
    List(Vec<TypedValue>),
    Map(IndexMap<String, TypedValue>),
    Object(Box<DomainObject>),
    Member(Box<Member>),
    /// A value that keeps its own tag while carried under a tag this client does not know.
    Tagged(Box<TypedValue>),
}

impl Value {
    /// The tag a value of this shape gets when nobody says otherwise.
    pub fn inferred_tag(&self) -> &str {
        match self {
            Value::Boolean(_) => PrimitiveKind::Boolean.tag(),
            Value::Integer(_) => PrimitiveKind::Integer.tag(),
            Value::Float(_) => PrimitiveKind::Float.tag(),
            Value::String(_) => PrimitiveKind::String.tag(),
            Value::Bytes(_) => PrimitiveKind::Bytes.tag(),
            Value::Date(_) => PrimitiveKind::Date.tag(),
            Value::List(_) => CollectionKind::List.tag(),
            Value::Map(_) => CollectionKind::Map.tag(),
            Value::Object(object) => object.ty().name(),
            Value::Member(member) => member.kind().tag(),
            Value::Tagged(inner) => inner.tag(),
        }
    }

    /// Whether a value of this shape may be carried under `kind`.
    pub fn fits(&self, kind: Kind) -> bool {
        match (kind, self) {
            (Kind::Primitive(PrimitiveKind::Boolean), Value::Boolean(_))
            | (Kind::Primitive(PrimitiveKind::Integer), Value::Integer(_))
            | (Kind::Primitive(PrimitiveKind::Float), Value::Float(_))
            | (Kind::Primitive(PrimitiveKind::Bytes), Value::Bytes(_))
            | (Kind::Primitive(PrimitiveKind::Date), Value::Date(_)) => true,
            (Kind::Primitive(kind), Value::String(_)) => kind.is_textual(),
            (Kind::Collection(kind), Value::Map(_)) => kind.is_associative(),
            (Kind::Collection(kind), Value::List(_)) => !kind.is_associative(),
            (Kind::Object(ty), Value::Object(object)) => object.ty() == ty,
            (Kind::Member(kind), Value::Member(member)) => member.kind() == kind,
            // Opaque tags carry anything except a resource or member, which always carry their
            // own tag.
            (Kind::Unknown, Value::Object(_)) | (Kind::Unknown, Value::Member(_)) => false,
            (Kind::Unknown, Value::Tagged(_)) => true,
            (Kind::Unknown, _) => true,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, TypedValue>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DomainObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Value::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_tagged(&self) -> Option<&TypedValue> {
        match self {
            Value::Tagged(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<Vec<TypedValue>> for Value {
    fn from(items: Vec<TypedValue>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, TypedValue>> for Value {
    fn from(entries: IndexMap<String, TypedValue>) -> Self {
        Value::Map(entries)
    }
}

impl From<DomainObject> for Value {
    fn from(object: DomainObject) -> Self {
        Value::Object(Box::new(object))
    }
}

impl From<Member> for Value {
    fn from(member: Member) -> Self {
        Value::Member(Box::new(member))
    }
}

/// A value together with the type tag it travels under.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedValue {
    tag: String,
    value: Value,
}

impl TypedValue {
    pub fn new(tag: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }

    /// Tag a value by its shape. A tagged value is simply unwrapped.
    pub fn infer(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Tagged(inner) => *inner,
            value => Self {
                tag: value.inferred_tag().to_string(),
                value,
            },
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> Kind {
        registry::resolve(&self.tag)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.tag, self.value)
    }

    pub fn boolean(b: bool) -> Self {
        Self::infer(b)
    }

    pub fn integer(i: i64) -> Self {
        Self::infer(i)
    }

    pub fn float(f: f64) -> Self {
        Self::infer(f)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::infer(s.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::new(PrimitiveKind::Id.tag(), id.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::new(PrimitiveKind::Path.tag(), path.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::new(PrimitiveKind::Url.tag(), url.into())
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self::new(PrimitiveKind::Email.tag(), email.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::infer(bytes.into())
    }

    pub fn date(date: DateTime<Utc>) -> Self {
        Self::infer(date)
    }

    /// A date from milliseconds since the Unix epoch, the form dates take on the wire.
    pub fn date_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self::date)
    }

    pub fn list(items: impl IntoIterator<Item = TypedValue>) -> Self {
        Self::infer(items.into_iter().collect::<Vec<_>>())
    }

    pub fn set(items: impl IntoIterator<Item = TypedValue>) -> Self {
        Self::new(
            CollectionKind::Set.tag(),
            items.into_iter().collect::<Vec<_>>(),
        )
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, TypedValue)>) -> Self {
        Self::infer(collect_map(entries))
    }

    pub fn sorted_map<K: Into<String>>(entries: impl IntoIterator<Item = (K, TypedValue)>) -> Self {
        Self::new(CollectionKind::SortedMap.tag(), collect_map(entries))
    }
}

fn collect_map<K: Into<String>>(
    entries: impl IntoIterator<Item = (K, TypedValue)>,
) -> IndexMap<String, TypedValue> {
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .collect()
}

impl From<DomainObject> for TypedValue {
    fn from(object: DomainObject) -> Self {
        Self::infer(object)
    }
}

impl From<Member> for TypedValue {
    fn from(member: Member) -> Self {
        Self::infer(member)
    }
}
