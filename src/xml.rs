// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The XML marshaler.
//!
//! Every typed value becomes an element carrying its tag in a `type` attribute. The element's name
//! is the field or key the value is stored under, `item` for members of a sequence, and for a
//! document root the resolved type name (`items` for anonymous collections). Scalars are written
//! as text content, collections as child elements, and resources and members write themselves.
//!
//! Documents are parsed into a small [Element] tree which lives only for the duration of one
//! decode call.

use crate::error::{malformed, unmarshalable, MarshalError, XmlSyntaxSnafu};
use crate::marshal::{check, parse_primitive, primitive_text, Marshalable, Marshaler, MIME_XML};
use crate::member::Member;
use crate::object::DomainObject;
use crate::registry::{self, CollectionKind, Kind, PrimitiveKind};
use crate::value::{TypedValue, Value};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;

/// Attribute holding the type tag of an element.
pub const TYPE_ATTR: &str = "type";

/// Name of the root element of an anonymous collection.
pub const ITEMS: &str = "items";

/// Name of an element holding a member of a sequence, or an anonymous scalar.
pub const ITEM: &str = "item";

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An element carrying `tag` in its `type` attribute.
    pub fn typed(name: impl Into<String>, tag: &str) -> Self {
        Self::new(name).with_attribute(TYPE_ATTR, tag)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// The first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    /// All direct text children, concatenated.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Text content of the named child, if there is such a child.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text)
    }
}

fn syntax(err: impl ToString) -> MarshalError {
    XmlSyntaxSnafu {
        message: err.to_string(),
    }
    .build()
}

fn utf8(bytes: &[u8]) -> Result<String, MarshalError> {
    std::str::from_utf8(bytes).map(str::to_string).map_err(syntax)
}

fn open(start: &BytesStart) -> Result<Element, MarshalError> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(syntax)?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value().map_err(syntax)?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

/// Parse a document into its root element.
pub fn parse(text: &str) -> Result<Element, MarshalError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event = reader.read_event().map_err(syntax)?;
        let finished = match event {
            Event::Start(start) => {
                stack.push(open(&start)?);
                None
            }
            Event::Empty(start) => Some(open(&start)?),
            Event::End(_) => Some(stack.pop().ok_or_else(|| syntax("unbalanced end tag"))?),
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(text.unescape().map_err(syntax)?.into_owned());
                }
                None
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(utf8(&data.into_inner())?);
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some(element) = finished {
            match stack.last_mut() {
                Some(parent) => parent.push(element),
                None if root.is_none() => root = Some(element),
                None => return Err(syntax("more than one root element")),
            }
        }
    }

    if !stack.is_empty() {
        return Err(syntax("unexpected end of document"));
    }
    root.ok_or_else(|| syntax("document has no root element"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), MarshalError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(syntax);
    }
    writer.write_event(Event::Start(start)).map_err(syntax)?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(syntax)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(syntax)
}

/// Serialize an element as a complete UTF-8 document.
pub fn write(element: &Element) -> Result<String, MarshalError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(syntax)?;
    write_element(&mut writer, element)?;
    String::from_utf8(writer.into_inner()).map_err(syntax)
}

fn is_name(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !label.to_ascii_lowercase().starts_with("xml")
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Encode a value as a document root.
pub fn to_xml(value: &TypedValue) -> Result<Element, MarshalError> {
    let label = match value.value() {
        Value::Object(object) => object.type_tag(),
        Value::Member(member) => member.type_tag(),
        Value::List(_) | Value::Map(_) => ITEMS,
        _ => ITEM,
    };
    labelled(label, value)
}

/// Encode a value stored under `label`: the typed element, renamed to the label.
pub fn labelled(label: &str, value: &TypedValue) -> Result<Element, MarshalError> {
    if !is_name(label) {
        return Err(unmarshalable(label, "not usable as an XML element name"));
    }
    let mut element = typed(value)?;
    element.name = label.to_string();
    Ok(element)
}

fn typed(value: &TypedValue) -> Result<Element, MarshalError> {
    check(value)?;
    let tag = value.tag();
    match value.value() {
        Value::Object(object) => object.to_xml(),
        Value::Member(member) => member.to_xml(),
        Value::Map(entries) => {
            let mut element = Element::typed(ITEMS, tag);
            for (key, entry) in entries {
                element.push(labelled(key, entry)?);
            }
            Ok(element)
        }
        Value::List(items) => {
            let mut element = Element::typed(ITEMS, tag);
            for item in items {
                element.push(labelled(ITEM, item)?);
            }
            Ok(element)
        }
        // No envelope in XML: the inner value becomes the only child.
        Value::Tagged(inner) => {
            let mut element = Element::typed(ITEM, tag);
            element.push(to_xml(inner)?);
            Ok(element)
        }
        scalar => Ok(Element::typed(ITEM, tag).with_text(primitive_text(scalar)?)),
    }
}

/// Decode an element, taking its type from `hint`, its `type` attribute, or its shape.
pub fn from_xml(element: &Element, hint: Option<&str>) -> Result<TypedValue, MarshalError> {
    let tag = match hint.or_else(|| element.attribute(TYPE_ATTR)) {
        Some(tag) => tag,
        None if element.has_elements() => CollectionKind::Map.tag(),
        None => PrimitiveKind::String.tag(),
    };

    match registry::resolve(tag) {
        Kind::Object(ty) => {
            let mut object = DomainObject::new(ty);
            object.load_xml(element)?;
            Ok(TypedValue::from(object))
        }
        Kind::Member(kind) => {
            let mut member = Member::empty(kind);
            member.load_xml(element)?;
            Ok(TypedValue::from(member))
        }
        Kind::Collection(kind) if kind.is_associative() => {
            Ok(TypedValue::new(tag, decode_entries(tag, element)?))
        }
        Kind::Collection(_) => Ok(TypedValue::new(tag, decode_items(tag, element)?)),
        Kind::Primitive(kind) => Ok(TypedValue::new(tag, parse_primitive(kind, &element.text())?)),
        // Shape alone decides: `item` children are a sequence, other children a map. A map of an
        // unknown type whose only keys are `item` therefore reads back as a list.
        Kind::Unknown => {
            let value = if !element.has_elements() {
                Value::String(element.text())
            } else if element.elements().all(|child| child.name == ITEM) {
                Value::List(decode_items(tag, element)?)
            } else {
                Value::Map(decode_entries(tag, element)?)
            };
            Ok(TypedValue::new(tag, value))
        }
    }
}

fn expect_children(tag: &str, element: &Element) -> Result<(), MarshalError> {
    if !element.has_elements() && !element.text().trim().is_empty() {
        return Err(malformed(tag, "expected child elements, found text"));
    }
    Ok(())
}

/// Decode children, in document order, into a sequence.
fn decode_items(tag: &str, element: &Element) -> Result<Vec<TypedValue>, MarshalError> {
    expect_children(tag, element)?;
    element
        .elements()
        .map(|child| from_xml(child, None))
        .collect()
}

/// Decode children into an associative structure.
///
/// Repeated siblings are a multi-valued field: the first repeat turns the entry into a list of
/// both values and later repeats append to it.
fn decode_entries(tag: &str, element: &Element) -> Result<IndexMap<String, TypedValue>, MarshalError> {
    expect_children(tag, element)?;
    let mut entries: IndexMap<String, TypedValue> = IndexMap::new();
    let mut repeated = HashSet::new();
    for child in element.elements() {
        let value = from_xml(child, None)?;
        let key = child.name.clone();
        match entries.get_mut(&key) {
            None => {
                entries.insert(key, value);
            }
            Some(existing) if repeated.contains(&key) => {
                if let Value::List(items) = existing.value_mut() {
                    items.push(value);
                }
            }
            Some(existing) => {
                let first = existing.clone();
                *existing = TypedValue::list(vec![first, value]);
                repeated.insert(key);
            }
        }
    }
    Ok(entries)
}

/// Reads and writes XML documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct XmlMarshaler;

impl Marshaler for XmlMarshaler {
    fn content_type(&self) -> &'static str {
        MIME_XML
    }

    fn to_string(&self, value: &TypedValue) -> Result<String, MarshalError> {
        write(&to_xml(value)?)
    }

    fn from_string(&self, text: &str, hint: Option<&str>) -> Result<TypedValue, MarshalError> {
        from_xml(&parse(text)?, hint)
    }
}
