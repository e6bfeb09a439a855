// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{malformed, FlowError, MarshalError, MissingUidSnafu, UnknownFieldSnafu};
use crate::json;
use crate::marshal::Marshalable;
use crate::schema::{DomainType, FieldSpec};
use crate::value::{TypedValue, Value};
use crate::xml::{self, Element};
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use std::fmt::{self, Display, Formatter};
use tracing::{event, Level};

/// A Platform resource: a type and the values of its fields.
///
/// The set of fields is fixed by the type's schema, in schema order. A field that has never been
/// set, or was cleared, is null and is left out of encoded documents.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainObject {
    ty: DomainType,
    fields: IndexMap<&'static str, Option<TypedValue>>,
}

impl DomainObject {
    pub fn new(ty: DomainType) -> Self {
        Self {
            ty,
            fields: ty.fields().map(|declared| (declared.name, None)).collect(),
        }
    }

    /// Build an object from `(field, value)` pairs, tagging each value with its declared type.
    pub fn with_fields<'a, V: Into<Value>>(
        ty: DomainType,
        fields: impl IntoIterator<Item = (&'a str, V)>,
    ) -> Result<Self, FlowError> {
        let mut object = Self::new(ty);
        for (name, value) in fields {
            object.set(name, value)?;
        }
        Ok(object)
    }

    pub fn ty(&self) -> DomainType {
        self.ty
    }

    fn declared(&self, name: &str) -> Result<&'static FieldSpec, FlowError> {
        self.ty.field(name).ok_or_else(|| {
            UnknownFieldSnafu {
                ty: self.ty,
                field: name,
            }
            .build()
        })
    }

    /// The value of a field, or `None` if it is null.
    pub fn get_field(&self, name: &str) -> Result<Option<&TypedValue>, FlowError> {
        let declared = self.declared(name)?;
        Ok(self.fields.get(declared.name).and_then(Option::as_ref))
    }

    /// Store a tagged value, or null, in a field.
    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<Option<TypedValue>>,
    ) -> Result<&mut Self, FlowError> {
        let declared = self.declared(name)?;
        self.fields.insert(declared.name, value.into());
        Ok(self)
    }

    /// Store a value in a field under the field's declared type.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self, FlowError> {
        let declared = self.declared(name)?;
        self.set_field(declared.name, TypedValue::new(declared.tag, value))
    }

    pub fn clear_field(&mut self, name: &str) -> Result<&mut Self, FlowError> {
        self.set_field(name, None::<TypedValue>)
    }

    /// Shorthand for the untagged value of a field; `None` for null and unknown fields alike.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .get(name)
            .and_then(Option::as_ref)
            .map(TypedValue::value)
    }

    /// The non-null fields, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &TypedValue)> + '_ {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|value| (*name, value)))
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    /// The identifier used to address this object remotely, once it has been created.
    ///
    /// Drops are addressed within their flow, as `{flowId}/{id}`.
    pub fn uid(&self) -> Option<String> {
        let id = self.id()?;
        if self.ty.has_compound_path() {
            let flow_id = self.get("flowId").and_then(Value::as_str)?;
            Some(format!("{}/{}", flow_id, id))
        } else {
            Some(id.to_string())
        }
    }

    /// The path of the collection this object is created in.
    pub fn collection_path(&self) -> Result<String, FlowError> {
        if self.ty.has_compound_path() {
            let flow_id = self
                .get("flowId")
                .and_then(Value::as_str)
                .ok_or_else(|| MissingUidSnafu { ty: DomainType::Flow }.build())?;
            Ok(format!("/{}/{}", self.ty.name(), flow_id))
        } else {
            Ok(format!("/{}", self.ty.name()))
        }
    }

    /// The path of this object itself.
    pub fn resource_path(&self) -> Result<String, FlowError> {
        let uid = self
            .uid()
            .ok_or_else(|| MissingUidSnafu { ty: self.ty }.build())?;
        Ok(format!("/{}/{}", self.ty.name(), uid))
    }

    /// Copy every non-null field of `other` into this object.
    pub fn merge(&mut self, other: DomainObject) -> Result<(), FlowError> {
        if other.ty != self.ty {
            return Err(malformed(self.ty.name(), format!("cannot merge a {}", other.ty)).into());
        }
        for (name, value) in other.fields {
            if value.is_some() {
                self.fields.insert(name, value);
            }
        }
        Ok(())
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<TypedValue>> {
        let slot = self.fields.get_mut(name);
        if slot.is_none() {
            event!(
                Level::DEBUG,
                "dropping unknown field {:?} of {}",
                name,
                self.ty
            );
        }
        slot
    }
}

impl Marshalable for DomainObject {
    fn type_tag(&self) -> &str {
        self.ty.name()
    }

    fn to_json(&self) -> Result<Json, MarshalError> {
        let fields = self
            .fields()
            .map(|(name, value)| Ok((name.to_string(), json::to_json(value)?)))
            .collect::<Result<Map<_, _>, MarshalError>>()?;
        Ok(json::envelope(self.type_tag(), Json::Object(fields)))
    }

    fn load_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        let ty = self.ty;
        let fields = value
            .as_object()
            .ok_or_else(|| malformed(ty.name(), "expected an object of fields"))?;
        for (name, value) in fields {
            if let Some(slot) = self.slot(name) {
                *slot = if value.is_null() {
                    None
                } else {
                    Some(json::from_json(value, None)?)
                };
            }
        }
        Ok(())
    }

    fn to_xml(&self) -> Result<Element, MarshalError> {
        let mut element = Element::typed(self.type_tag(), self.type_tag());
        for (name, value) in self.fields() {
            element.push(xml::labelled(name, value)?);
        }
        Ok(element)
    }

    fn load_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        if let Some(tag) = element.attribute(xml::TYPE_ATTR) {
            if tag != self.type_tag() {
                return Err(malformed(self.type_tag(), format!("element is a {}", tag)));
            }
        }
        for child in element.elements() {
            if let Some(slot) = self.slot(&child.name) {
                *slot = Some(xml::from_xml(child, None)?);
            }
        }
        Ok(())
    }
}

impl Display for DomainObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.uid() {
            Some(uid) => write!(f, "{} {}", self.ty, uid),
            None => write!(f, "new {}", self.ty),
        }
    }
}
