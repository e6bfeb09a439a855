// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Typed marshaling for the Flow Platform API.
//!
//! Every value exchanged with the Platform carries a type tag, and the tag decides how the value
//! is written on the wire. Native JSON values (booleans, numbers, strings) appear bare; every other
//! value is wrapped in a `{"type": ..., "value": ...}` envelope. In XML, the tag is the `type`
//! attribute of the element holding the value. The [registry] maps tags to the kinds of values
//! they denote, and the [schema] lists the fields of each Platform resource type.
//!
//! [TypedValue] is the in-memory form of a tagged value. It can hold primitives, collections,
//! resources ([DomainObject]) and structured members ([Member]) such as permission sets and
//! templates. The [JSON](json::JsonMarshaler) and [XML](xml::XmlMarshaler) marshalers share the
//! [Marshaler] interface, so code that talks to the Platform can switch formats with a single
//! [Format] value.
//!
//! The [client] module provides a `surf` client which signs requests, unwraps the Platform's
//! response envelope, and turns error responses into [FlowError]s via the
//! [parse_error_body](client::parse_error_body) middleware.

pub mod client;
pub mod config;
pub mod error;
pub mod json;
pub mod marshal;
pub mod member;
pub mod object;
pub mod registry;
pub mod schema;
pub mod value;
pub mod xml;

pub use client::Client;
pub use config::ClientOptions;
pub use error::*;
pub use marshal::{Format, Marshalable, Marshaler};
pub use member::*;
pub use object::DomainObject;
pub use registry::Kind;
pub use schema::DomainType;
pub use value::{TypedValue, Value};
