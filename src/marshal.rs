// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The contract shared by the JSON and XML marshalers.

use crate::error::{malformed, unmarshalable, MarshalError};
use crate::json::JsonMarshaler;
use crate::registry::PrimitiveKind;
use crate::value::{TypedValue, Value};
use crate::xml::{Element, XmlMarshaler};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A value that knows its own wire shape in both formats.
///
/// The marshalers hand any value with this capability over to it instead of applying their
/// generic structural rules. Loading happens in place on an empty instance, so that a decoder
/// holding only a type tag can build the instance first and populate it second.
pub trait Marshalable {
    /// The tag written next to the value.
    fn type_tag(&self) -> &str;

    /// The full `{"type": ..., "value": ...}` envelope.
    fn to_json(&self) -> Result<serde_json::Value, MarshalError>;

    /// Populate from the inner value of an envelope.
    fn load_json(&mut self, value: &serde_json::Value) -> Result<(), MarshalError>;

    /// An element named after the type tag, carrying it in a `type` attribute.
    fn to_xml(&self) -> Result<Element, MarshalError>;

    /// Populate from an element produced by [to_xml](Marshalable::to_xml), whatever its name.
    fn load_xml(&mut self, element: &Element) -> Result<(), MarshalError>;
}

/// A wire format: turns values into documents and back.
pub trait Marshaler: Send + Sync {
    /// The MIME type of documents in this format.
    fn content_type(&self) -> &'static str;

    fn to_string(&self, value: &TypedValue) -> Result<String, MarshalError>;

    /// Decode a document. With a `hint`, the document is read as a value of that type.
    fn from_string(&self, text: &str, hint: Option<&str>) -> Result<TypedValue, MarshalError>;
}

static JSON: JsonMarshaler = JsonMarshaler;
static XML: XmlMarshaler = XmlMarshaler;

pub const MIME_JSON: &str = "application/json";
pub const MIME_XML: &str = "text/xml";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Xml,
}

impl Default for Format {
    fn default() -> Self {
        Format::Json
    }
}

impl Format {
    pub fn marshaler(self) -> &'static dyn Marshaler {
        match self {
            Format::Json => &JSON,
            Format::Xml => &XML,
        }
    }

    pub fn content_type(self) -> &'static str {
        self.marshaler().content_type()
    }

    /// The format of a document with the given MIME type, ignoring parameters like `charset`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        match essence {
            "application/json" => Some(Format::Json),
            "text/xml" | "application/xml" => Some(Format::Xml),
            _ => None,
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Xml => write!(f, "xml"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            other => Err(format!("unknown format {}", other)),
        }
    }
}

/// Refuse a value whose shape does not fit its tag.
///
/// Without this, a string tagged `integer` would be written out fine and come back as a string.
pub(crate) fn check(value: &TypedValue) -> Result<(), MarshalError> {
    if value.value().fits(value.kind()) {
        Ok(())
    } else {
        Err(unmarshalable(
            value.value(),
            format!("value does not fit type {:?}", value.tag()),
        ))
    }
}

/// Canonical text of a scalar, as written in XML.
pub(crate) fn primitive_text(value: &Value) -> Result<String, MarshalError> {
    match value {
        Value::Boolean(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) if f.is_finite() => Ok(f.to_string()),
        Value::Float(f) => Err(unmarshalable(f, "non-finite floats have no wire form")),
        Value::String(s) => Ok(s.clone()),
        Value::Bytes(bytes) => Ok(STANDARD.encode(bytes)),
        Value::Date(date) => Ok(date.timestamp_millis().to_string()),
        other => Err(unmarshalable(other, "not a primitive")),
    }
}

/// Coerce text to a scalar of the given kind.
pub(crate) fn parse_primitive(kind: PrimitiveKind, text: &str) -> Result<Value, MarshalError> {
    let tag = kind.tag();
    match kind {
        PrimitiveKind::Boolean => match text.trim() {
            "true" | "1" => Ok(Value::Boolean(true)),
            "false" | "0" => Ok(Value::Boolean(false)),
            other => Err(malformed(tag, format!("{:?} is not a boolean", other))),
        },
        PrimitiveKind::Integer => text
            .trim()
            .parse()
            .map(Value::Integer)
            .map_err(|err| malformed(tag, format!("{:?}: {}", text, err))),
        PrimitiveKind::Float => text
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|err| malformed(tag, format!("{:?}: {}", text, err))),
        PrimitiveKind::Bytes => STANDARD
            .decode(text.trim())
            .map(Value::Bytes)
            .map_err(|err| malformed(tag, err.to_string())),
        PrimitiveKind::Date => {
            let millis: i64 = text
                .trim()
                .parse()
                .map_err(|err| malformed(tag, format!("{:?}: {}", text, err)))?;
            date_from_millis(millis)
        }
        PrimitiveKind::String
        | PrimitiveKind::Id
        | PrimitiveKind::Path
        | PrimitiveKind::Url
        | PrimitiveKind::Email => Ok(Value::String(text.to_string())),
    }
}

pub(crate) fn date_from_millis(millis: i64) -> Result<Value, MarshalError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(Value::Date)
        .ok_or_else(|| malformed(PrimitiveKind::Date.tag(), format!("{} is out of range", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_text() {
        assert_eq!(primitive_text(&Value::Boolean(true)).unwrap(), "true");
        assert_eq!(primitive_text(&Value::Boolean(false)).unwrap(), "false");
        assert_eq!(primitive_text(&Value::Integer(-12)).unwrap(), "-12");
        assert_eq!(primitive_text(&Value::Float(2.5)).unwrap(), "2.5");
        assert_eq!(primitive_text(&Value::Bytes(b"hi".to_vec())).unwrap(), "aGk=");
        assert!(primitive_text(&Value::Float(f64::NAN)).is_err());
        assert!(primitive_text(&Value::List(vec![])).is_err());
    }

    #[test]
    fn coercion_follows_kind() {
        assert_eq!(
            parse_primitive(PrimitiveKind::Float, "3").unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            parse_primitive(PrimitiveKind::Integer, " 42 ").unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            parse_primitive(PrimitiveKind::Path, " /a ").unwrap(),
            Value::String(" /a ".into())
        );
        assert!(matches!(
            parse_primitive(PrimitiveKind::Boolean, "yes"),
            Err(MarshalError::MalformedEnvelope { .. })
        ));
        assert!(parse_primitive(PrimitiveKind::Integer, "1.5").is_err());
    }

    #[test]
    fn check_rejects_mismatched_tags() {
        assert!(check(&TypedValue::new("integer", "12")).is_err());
        assert!(check(&TypedValue::new("map", Vec::<TypedValue>::new())).is_err());
        assert!(check(&TypedValue::new("set", Vec::<TypedValue>::new())).is_ok());
        assert!(check(&TypedValue::new("whatever", 1i64)).is_ok());
    }

    #[test]
    fn formats_by_content_type() {
        assert_eq!(
            Format::from_content_type("application/json; charset=utf-8"),
            Some(Format::Json)
        );
        assert_eq!(Format::from_content_type("text/xml"), Some(Format::Xml));
        assert_eq!(Format::from_content_type("text/html"), None);
        assert_eq!(Format::Xml.content_type(), MIME_XML);
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
    }
}
