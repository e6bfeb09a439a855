// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Field schemas for the Platform's resource types.
//!
//! Each [DomainType] owns a static list of [FieldSpec]s. The four default fields come first and are
//! shared by every type; the rest are specific to the type. Adding a resource type means adding a
//! variant and a table here, nothing else.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A named field and the type tag its values are declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub tag: &'static str,
}

const fn field(name: &'static str, tag: &'static str) -> FieldSpec {
    FieldSpec { name, tag }
}

pub const DEFAULT_FIELDS: &[FieldSpec] = &[
    field("id", "id"),
    field("creator", "map"),
    field("creationDate", "date"),
    field("lastEditDate", "date"),
];

const APPLICATION_FIELDS: &[FieldSpec] = &[
    field("name", "string"),
    field("displayName", "string"),
    field("description", "string"),
    field("email", "email"),
    field("url", "url"),
    field("icon", "url"),
    field("isDiscoverable", "boolean"),
    field("isInviteOnly", "boolean"),
    field("applicationTemplate", "applicationTemplate"),
    field("permissions", "permissions"),
];

const FLOW_FIELDS: &[FieldSpec] = &[
    field("name", "string"),
    field("path", "path"),
    field("description", "string"),
    field("filter", "string"),
    field("location", "map"),
    field("local", "boolean"),
    field("template", "flowTemplate"),
    field("permissions", "permissions"),
    field("dropPermissions", "permissions"),
];

const COMMENT_FIELDS: &[FieldSpec] = &[
    field("title", "string"),
    field("description", "string"),
    field("text", "string"),
    field("flowId", "id"),
    field("dropId", "id"),
    field("parentId", "id"),
    field("topParentId", "id"),
];

const DROP_FIELDS: &[FieldSpec] = &[
    field("flowId", "id"),
    field("path", "path"),
    field("elems", "map"),
];

const FILE_FIELDS: &[FieldSpec] = &[
    field("name", "string"),
    field("mimeType", "string"),
    field("contents", "bytes"),
];

const GROUP_FIELDS: &[FieldSpec] = &[
    field("name", "string"),
    field("displayName", "string"),
    field("identities", "set"),
    field("identityId", "id"),
    field("permissions", "permissions"),
    field("identityPermissions", "permissions"),
];

const IDENTITY_FIELDS: &[FieldSpec] = &[
    field("firstName", "string"),
    field("lastName", "string"),
    field("alias", "string"),
    field("avatar", "url"),
    field("groupIds", "set"),
    field("userId", "id"),
    field("appIds", "set"),
    field("permissions", "permissions"),
];

const TRACK_FIELDS: &[FieldSpec] = &[
    field("from", "path"),
    field("to", "path"),
    field("filterString", "string"),
    field("transformFunction", "string"),
    field("permissions", "permissions"),
];

const USER_FIELDS: &[FieldSpec] = &[
    field("email", "email"),
    field("password", "string"),
    field("defaultIdentity", "identity"),
    field("permissions", "permissions"),
];

/// The fixed catalog of Platform resource types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainType {
    Application,
    Flow,
    Comment,
    Drop,
    File,
    Group,
    Identity,
    Track,
    User,
}

impl DomainType {
    pub const ALL: &'static [DomainType] = &[
        DomainType::Application,
        DomainType::Flow,
        DomainType::Comment,
        DomainType::Drop,
        DomainType::File,
        DomainType::Group,
        DomainType::Identity,
        DomainType::Track,
        DomainType::User,
    ];

    /// The type tag, which is also the resource name in URLs.
    pub fn name(self) -> &'static str {
        match self {
            DomainType::Application => "application",
            DomainType::Flow => "flow",
            DomainType::Comment => "comment",
            DomainType::Drop => "drop",
            DomainType::File => "file",
            DomainType::Group => "group",
            DomainType::Identity => "identity",
            DomainType::Track => "track",
            DomainType::User => "user",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.name() == name)
    }

    /// Fields declared by this type in addition to the defaults.
    pub fn own_fields(self) -> &'static [FieldSpec] {
        match self {
            DomainType::Application => APPLICATION_FIELDS,
            DomainType::Flow => FLOW_FIELDS,
            DomainType::Comment => COMMENT_FIELDS,
            DomainType::Drop => DROP_FIELDS,
            DomainType::File => FILE_FIELDS,
            DomainType::Group => GROUP_FIELDS,
            DomainType::Identity => IDENTITY_FIELDS,
            DomainType::Track => TRACK_FIELDS,
            DomainType::User => USER_FIELDS,
        }
    }

    /// All fields of this type, defaults first.
    pub fn fields(self) -> impl Iterator<Item = &'static FieldSpec> {
        DEFAULT_FIELDS.iter().chain(self.own_fields())
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().find(|declared| declared.name == name)
    }

    /// Whether this type's resources are nested under a parent in URLs.
    ///
    /// Drops live under the flow that holds them, so their uid is `{flowId}/{id}`.
    pub fn has_compound_path(self) -> bool {
        matches!(self, DomainType::Drop)
    }
}

impl Display for DomainType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
