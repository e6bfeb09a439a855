// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Structured field values with a wire shape of their own.
//!
//! Unlike resources, members are not described by a field table: each one lays itself out by
//! hand in both formats, because the shapes are irregular (permissions put an `access` flag next
//! to each list of identities, constraints live in attributes, and so on).

use crate::error::{malformed, MarshalError, UnresolvableTypeSnafu};
use crate::json;
use crate::marshal::{parse_primitive, Marshalable};
use crate::registry::PrimitiveKind;
use crate::xml::{Element, TYPE_ATTR};
use indexmap::IndexSet;
use serde_json::{json, Map, Value as Json};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Permissions,
    ApplicationTemplate,
    FlowTemplate,
    TrackTemplate,
    DropTemplate,
    Constraints,
    Constraint,
}

impl MemberKind {
    pub const ALL: &'static [MemberKind] = &[
        MemberKind::Permissions,
        MemberKind::ApplicationTemplate,
        MemberKind::FlowTemplate,
        MemberKind::TrackTemplate,
        MemberKind::DropTemplate,
        MemberKind::Constraints,
        MemberKind::Constraint,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            MemberKind::Permissions => "permissions",
            MemberKind::ApplicationTemplate => "applicationTemplate",
            MemberKind::FlowTemplate => "flowTemplate",
            MemberKind::TrackTemplate => "trackTemplate",
            MemberKind::DropTemplate => "dropTemplate",
            MemberKind::Constraints => "constraints",
            MemberKind::Constraint => "constraint",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }
}

/// The layout of one member type in both wire formats.
///
/// `write_*` produce the inner value of the member, without the envelope or the `type`
/// attribute, so that members nested inside other members can reuse them.
trait Layout: Default {
    const KIND: MemberKind;

    fn write_json(&self) -> Json;
    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError>;
    fn write_xml(&self, element: &mut Element);
    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError>;

    fn from_json(value: &Json) -> Result<Self, MarshalError> {
        let mut member = Self::default();
        member.read_json(value)?;
        Ok(member)
    }

    fn from_xml(element: &Element) -> Result<Self, MarshalError> {
        let mut member = Self::default();
        member.read_xml(element)?;
        Ok(member)
    }

    fn xml_named(&self, name: &str) -> Element {
        let mut element = Element::new(name);
        self.write_xml(&mut element);
        element
    }
}

macro_rules! marshalable {
    ($($member:ident),* $(,)?) => {
        $(
            impl Marshalable for $member {
                fn type_tag(&self) -> &str {
                    <$member as Layout>::KIND.tag()
                }

                fn to_json(&self) -> Result<Json, MarshalError> {
                    Ok(json::envelope(self.type_tag(), self.write_json()))
                }

                fn load_json(&mut self, value: &Json) -> Result<(), MarshalError> {
                    self.read_json(value)
                }

                fn to_xml(&self) -> Result<Element, MarshalError> {
                    let mut element = Element::typed(self.type_tag(), self.type_tag());
                    self.write_xml(&mut element);
                    Ok(element)
                }

                fn load_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
                    self.read_xml(element)
                }
            }
        )*
    };
}

fn fields<'a>(kind: MemberKind, value: &'a Json) -> Result<&'a Map<String, Json>, MarshalError> {
    value
        .as_object()
        .ok_or_else(|| malformed(kind.tag(), "expected an object"))
}

fn items<'a>(kind: MemberKind, value: Option<&'a Json>) -> Result<&'a [Json], MarshalError> {
    match value {
        None | Some(Json::Null) => Ok(&[]),
        Some(Json::Array(items)) => Ok(items),
        Some(_) => Err(malformed(kind.tag(), "expected an array")),
    }
}

/// A string, bare or inside an envelope of a textual type.
fn text(kind: MemberKind, value: &Json) -> Result<String, MarshalError> {
    let inner = json::split_envelope(value).map_or(value, |(_, inner)| inner);
    inner
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(kind.tag(), format!("expected a string, found {}", value)))
}

fn optional_text(kind: MemberKind, value: Option<&Json>) -> Result<Option<String>, MarshalError> {
    match value {
        None | Some(Json::Null) => Ok(None),
        Some(value) => text(kind, value).map(Some),
    }
}

fn flag(kind: MemberKind, value: Option<&Json>) -> Result<bool, MarshalError> {
    match value {
        None | Some(Json::Null) => Ok(false),
        Some(Json::Bool(b)) => Ok(*b),
        Some(other) => Err(malformed(kind.tag(), format!("expected a boolean, found {}", other))),
    }
}

fn xml_flag(element: &Element, name: &str) -> Result<bool, MarshalError> {
    match element.attribute(name) {
        None => Ok(false),
        Some(text) => Ok(parse_primitive(PrimitiveKind::Boolean, text)?
            .as_bool()
            .unwrap_or_default()),
    }
}

fn text_element(name: &str, text: &str) -> Element {
    Element::typed(name, PrimitiveKind::String.tag()).with_text(text)
}

/// One role's access list.
///
/// With `access` set the list names who may act; without it, it names who may not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessList {
    pub ids: IndexSet<String>,
    pub access: bool,
}

impl AccessList {
    pub fn new(ids: &[&str], access: bool) -> Self {
        Self {
            ids: ids.iter().map(|id| id.to_string()).collect(),
            access,
        }
    }

    /// Whether the identity `id` is granted this role.
    pub fn allows(&self, id: &str) -> bool {
        self.ids.contains(id) == self.access
    }

    fn write_json(&self) -> Json {
        json!({ "access": self.access, "ids": self.ids.iter().collect::<Vec<_>>() })
    }

    fn read_json(value: &Json) -> Result<Self, MarshalError> {
        let kind = MemberKind::Permissions;
        let object = fields(kind, value)?;
        Ok(Self {
            access: flag(kind, object.get("access"))?,
            ids: items(kind, object.get("ids"))?
                .iter()
                .map(|id| text(kind, id))
                .collect::<Result<_, _>>()?,
        })
    }

    fn write_xml(&self, name: &str) -> Element {
        let mut element =
            Element::new(name).with_attribute("access", if self.access { "true" } else { "false" });
        for id in &self.ids {
            element.push(Element::new(PrimitiveKind::Id.tag()).with_text(id.as_str()));
        }
        element
    }

    fn read_xml(element: &Element) -> Result<Self, MarshalError> {
        Ok(Self {
            access: xml_flag(element, "access")?,
            ids: element.elements().map(Element::text).collect(),
        })
    }
}

/// Who may read, write and delete a resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Permissions {
    pub readers: AccessList,
    pub writers: AccessList,
    pub deleters: AccessList,
}

const ROLES: [&str; 3] = ["readers", "writers", "deleters"];

impl Permissions {
    pub fn new(
        readers: &[&str],
        writers: &[&str],
        deleters: &[&str],
        read_access: bool,
        write_access: bool,
        delete_access: bool,
    ) -> Self {
        Self {
            readers: AccessList::new(readers, read_access),
            writers: AccessList::new(writers, write_access),
            deleters: AccessList::new(deleters, delete_access),
        }
    }

    fn roles(&self) -> [(&'static str, &AccessList); 3] {
        [
            (ROLES[0], &self.readers),
            (ROLES[1], &self.writers),
            (ROLES[2], &self.deleters),
        ]
    }

    fn role_mut(&mut self, role: &str) -> Option<&mut AccessList> {
        match role {
            "readers" => Some(&mut self.readers),
            "writers" => Some(&mut self.writers),
            "deleters" => Some(&mut self.deleters),
            _ => None,
        }
    }
}

impl Layout for Permissions {
    const KIND: MemberKind = MemberKind::Permissions;

    fn write_json(&self) -> Json {
        Json::Object(
            self.roles()
                .iter()
                .map(|(role, list)| (role.to_string(), list.write_json()))
                .collect(),
        )
    }

    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        for (role, list) in fields(Self::KIND, value)? {
            if let Some(slot) = self.role_mut(role) {
                *slot = AccessList::read_json(list)?;
            }
        }
        Ok(())
    }

    fn write_xml(&self, element: &mut Element) {
        for (role, list) in self.roles().iter() {
            element.push(list.write_xml(role));
        }
    }

    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        for child in element.elements() {
            if let Some(slot) = self.role_mut(&child.name) {
                *slot = AccessList::read_xml(child)?;
            }
        }
        Ok(())
    }
}

/// A rule one element of a drop must satisfy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    /// Type tag the element's value must have.
    pub value_type: String,
    pub required: bool,
}

impl Constraint {
    pub fn new(name: impl Into<String>, value_type: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            required,
        }
    }
}

impl Layout for Constraint {
    const KIND: MemberKind = MemberKind::Constraint;

    fn write_json(&self) -> Json {
        json!({
            "name": self.name,
            "valueType": self.value_type,
            "required": self.required,
        })
    }

    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        let object = fields(Self::KIND, value)?;
        self.name = optional_text(Self::KIND, object.get("name"))?.unwrap_or_default();
        self.value_type = optional_text(Self::KIND, object.get("valueType"))?.unwrap_or_default();
        self.required = flag(Self::KIND, object.get("required"))?;
        Ok(())
    }

    fn write_xml(&self, element: &mut Element) {
        element.set_attribute("name", self.name.as_str());
        element.set_attribute("valueType", self.value_type.as_str());
        element.set_attribute("required", if self.required { "true" } else { "false" });
    }

    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        self.name = element.attribute("name").unwrap_or_default().to_string();
        self.value_type = element
            .attribute("valueType")
            .unwrap_or_default()
            .to_string();
        self.required = xml_flag(element, "required")?;
        Ok(())
    }
}

/// An ordered list of constraints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraints(pub Vec<Constraint>);

impl Layout for Constraints {
    const KIND: MemberKind = MemberKind::Constraints;

    fn write_json(&self) -> Json {
        Json::Array(self.0.iter().map(Constraint::write_json).collect())
    }

    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        self.0 = items(Self::KIND, Some(value))?
            .iter()
            .map(Constraint::from_json)
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn write_xml(&self, element: &mut Element) {
        for constraint in &self.0 {
            element.push(constraint.xml_named(Constraint::KIND.tag()));
        }
    }

    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        self.0 = element
            .elements()
            .filter(|child| child.name == Constraint::KIND.tag())
            .map(Constraint::from_xml)
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

/// The shape of the drops a flow accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropTemplate {
    pub constraints: Constraints,
}

impl Layout for DropTemplate {
    const KIND: MemberKind = MemberKind::DropTemplate;

    fn write_json(&self) -> Json {
        json!({ "constraints": self.constraints.write_json() })
    }

    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        let object = fields(Self::KIND, value)?;
        if let Some(constraints) = object.get("constraints") {
            self.constraints.read_json(constraints)?;
        }
        Ok(())
    }

    fn write_xml(&self, element: &mut Element) {
        element.push(self.constraints.xml_named(Constraints::KIND.tag()));
    }

    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        if let Some(constraints) = element.child(Constraints::KIND.tag()) {
            self.constraints.read_xml(constraints)?;
        }
        Ok(())
    }
}

/// A flow to be created along with an application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlowTemplate {
    pub name: String,
    pub description: Option<String>,
    pub drop_template: Option<DropTemplate>,
}

impl Layout for FlowTemplate {
    const KIND: MemberKind = MemberKind::FlowTemplate;

    fn write_json(&self) -> Json {
        let mut object = Map::new();
        object.insert("name".into(), Json::from(self.name.as_str()));
        if let Some(description) = &self.description {
            object.insert("description".into(), Json::from(description.as_str()));
        }
        if let Some(template) = &self.drop_template {
            object.insert("dropTemplate".into(), template.write_json());
        }
        Json::Object(object)
    }

    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        let object = fields(Self::KIND, value)?;
        self.name = optional_text(Self::KIND, object.get("name"))?.unwrap_or_default();
        self.description = optional_text(Self::KIND, object.get("description"))?;
        self.drop_template = match object.get("dropTemplate") {
            None | Some(Json::Null) => None,
            Some(template) => Some(DropTemplate::from_json(template)?),
        };
        Ok(())
    }

    fn write_xml(&self, element: &mut Element) {
        element.set_attribute("name", self.name.as_str());
        if let Some(description) = &self.description {
            element.push(text_element("description", description));
        }
        if let Some(template) = &self.drop_template {
            element.push(template.xml_named(DropTemplate::KIND.tag()));
        }
    }

    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        self.name = element.attribute("name").unwrap_or_default().to_string();
        self.description = element.child_text("description");
        self.drop_template = element
            .child(DropTemplate::KIND.tag())
            .map(DropTemplate::from_xml)
            .transpose()?;
        Ok(())
    }
}

/// A track to be created along with an application, between two of its flows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackTemplate {
    pub from: String,
    pub to: String,
    pub filter_string: Option<String>,
    pub transform_function: Option<String>,
}

impl TrackTemplate {
    fn optional(&self) -> [(&'static str, &Option<String>); 2] {
        [
            ("filterString", &self.filter_string),
            ("transformFunction", &self.transform_function),
        ]
    }
}

impl Layout for TrackTemplate {
    const KIND: MemberKind = MemberKind::TrackTemplate;

    fn write_json(&self) -> Json {
        let mut object = Map::new();
        object.insert("from".into(), Json::from(self.from.as_str()));
        object.insert("to".into(), Json::from(self.to.as_str()));
        for (key, value) in self.optional().iter() {
            if let Some(value) = value {
                object.insert(key.to_string(), Json::from(value.as_str()));
            }
        }
        Json::Object(object)
    }

    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        let object = fields(Self::KIND, value)?;
        self.from = optional_text(Self::KIND, object.get("from"))?.unwrap_or_default();
        self.to = optional_text(Self::KIND, object.get("to"))?.unwrap_or_default();
        self.filter_string = optional_text(Self::KIND, object.get("filterString"))?;
        self.transform_function = optional_text(Self::KIND, object.get("transformFunction"))?;
        Ok(())
    }

    fn write_xml(&self, element: &mut Element) {
        element.push(text_element("from", &self.from));
        element.push(text_element("to", &self.to));
        for (key, value) in self.optional().iter() {
            if let Some(value) = value {
                element.push(text_element(key, value));
            }
        }
    }

    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        self.from = element.child_text("from").unwrap_or_default();
        self.to = element.child_text("to").unwrap_or_default();
        self.filter_string = element.child_text("filterString");
        self.transform_function = element.child_text("transformFunction");
        Ok(())
    }
}

/// The flows and tracks an application is set up with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationTemplate {
    pub flows: Vec<FlowTemplate>,
    pub tracks: Vec<TrackTemplate>,
}

impl Layout for ApplicationTemplate {
    const KIND: MemberKind = MemberKind::ApplicationTemplate;

    fn write_json(&self) -> Json {
        json!({
            "flows": self.flows.iter().map(FlowTemplate::write_json).collect::<Vec<_>>(),
            "tracks": self.tracks.iter().map(TrackTemplate::write_json).collect::<Vec<_>>(),
        })
    }

    fn read_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        let object = fields(Self::KIND, value)?;
        self.flows = items(Self::KIND, object.get("flows"))?
            .iter()
            .map(FlowTemplate::from_json)
            .collect::<Result<_, _>>()?;
        self.tracks = items(Self::KIND, object.get("tracks"))?
            .iter()
            .map(TrackTemplate::from_json)
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn write_xml(&self, element: &mut Element) {
        let mut flows = Element::new("flows");
        for flow in &self.flows {
            flows.push(flow.xml_named(FlowTemplate::KIND.tag()));
        }
        let mut tracks = Element::new("tracks");
        for track in &self.tracks {
            tracks.push(track.xml_named(TrackTemplate::KIND.tag()));
        }
        element.push(flows);
        element.push(tracks);
    }

    fn read_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        if let Some(flows) = element.child("flows") {
            self.flows = flows
                .elements()
                .map(FlowTemplate::from_xml)
                .collect::<Result<_, _>>()?;
        }
        if let Some(tracks) = element.child("tracks") {
            self.tracks = tracks
                .elements()
                .map(TrackTemplate::from_xml)
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }
}

marshalable!(
    Permissions,
    Constraint,
    Constraints,
    DropTemplate,
    FlowTemplate,
    TrackTemplate,
    ApplicationTemplate,
);

/// Any member value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    Permissions(Permissions),
    ApplicationTemplate(ApplicationTemplate),
    FlowTemplate(FlowTemplate),
    TrackTemplate(TrackTemplate),
    DropTemplate(DropTemplate),
    Constraints(Constraints),
    Constraint(Constraint),
}

macro_rules! dispatch {
    ($self:expr, $member:ident => $body:expr) => {
        match $self {
            Member::Permissions($member) => $body,
            Member::ApplicationTemplate($member) => $body,
            Member::FlowTemplate($member) => $body,
            Member::TrackTemplate($member) => $body,
            Member::DropTemplate($member) => $body,
            Member::Constraints($member) => $body,
            Member::Constraint($member) => $body,
        }
    };
}

impl Member {
    /// An empty member of the given kind, ready to be loaded.
    pub fn empty(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Permissions => Member::Permissions(Default::default()),
            MemberKind::ApplicationTemplate => Member::ApplicationTemplate(Default::default()),
            MemberKind::FlowTemplate => Member::FlowTemplate(Default::default()),
            MemberKind::TrackTemplate => Member::TrackTemplate(Default::default()),
            MemberKind::DropTemplate => Member::DropTemplate(Default::default()),
            MemberKind::Constraints => Member::Constraints(Default::default()),
            MemberKind::Constraint => Member::Constraint(Default::default()),
        }
    }

    /// An empty member named by its type tag.
    pub fn from_tag(tag: &str) -> Result<Self, MarshalError> {
        MemberKind::from_tag(tag)
            .map(Self::empty)
            .ok_or_else(|| UnresolvableTypeSnafu { tag }.build())
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Permissions(_) => MemberKind::Permissions,
            Member::ApplicationTemplate(_) => MemberKind::ApplicationTemplate,
            Member::FlowTemplate(_) => MemberKind::FlowTemplate,
            Member::TrackTemplate(_) => MemberKind::TrackTemplate,
            Member::DropTemplate(_) => MemberKind::DropTemplate,
            Member::Constraints(_) => MemberKind::Constraints,
            Member::Constraint(_) => MemberKind::Constraint,
        }
    }
}

impl Marshalable for Member {
    fn type_tag(&self) -> &str {
        self.kind().tag()
    }

    fn to_json(&self) -> Result<Json, MarshalError> {
        dispatch!(self, member => member.to_json())
    }

    fn load_json(&mut self, value: &Json) -> Result<(), MarshalError> {
        dispatch!(self, member => member.load_json(value))
    }

    fn to_xml(&self) -> Result<Element, MarshalError> {
        dispatch!(self, member => member.to_xml())
    }

    fn load_xml(&mut self, element: &Element) -> Result<(), MarshalError> {
        // A member element always says what it is; refuse to load one kind as another.
        if let Some(tag) = element.attribute(TYPE_ATTR) {
            if tag != self.type_tag() {
                return Err(malformed(
                    self.type_tag(),
                    format!("element is a {}", tag),
                ));
            }
        }
        dispatch!(self, member => member.load_xml(element))
    }
}

macro_rules! member_from {
    ($($member:ident),* $(,)?) => {
        $(
            impl From<$member> for Member {
                fn from(member: $member) -> Self {
                    Member::$member(member)
                }
            }
        )*
    };
}

member_from!(
    Permissions,
    ApplicationTemplate,
    FlowTemplate,
    TrackTemplate,
    DropTemplate,
    Constraints,
    Constraint,
);
