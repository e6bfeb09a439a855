// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The JSON marshaler.
//!
//! JSON-native scalars (booleans, integers, floats and strings) are written bare. Everything else
//! is wrapped in a typed envelope, `{"type": <tag>, "value": <encoded>}`, so that a reader can tell
//! a path from a string or a set from a list.

use crate::error::{malformed, unmarshalable, JsonSyntaxSnafu, MarshalError};
use crate::marshal::{check, date_from_millis, Marshalable, Marshaler, MIME_JSON};
use crate::member::Member;
use crate::object::DomainObject;
use crate::registry::{self, CollectionKind, Kind, PrimitiveKind};
use crate::value::{TypedValue, Value};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};
use snafu::ResultExt;

pub const TYPE_KEY: &str = "type";
pub const VALUE_KEY: &str = "value";

/// Wrap an encoded value in a typed envelope.
pub fn envelope(tag: &str, value: Json) -> Json {
    let mut object = Map::new();
    object.insert(TYPE_KEY.to_string(), Json::String(tag.to_string()));
    object.insert(VALUE_KEY.to_string(), value);
    Json::Object(object)
}

/// Split a typed envelope into its tag and inner value.
///
/// Only an object with exactly a string `type` and a `value` counts as an envelope; anything else
/// is an ordinary map that happens to use one of those keys.
pub fn split_envelope(value: &Json) -> Option<(&str, &Json)> {
    let object = value.as_object()?;
    if object.len() != 2 {
        return None;
    }
    let tag = object.get(TYPE_KEY)?.as_str()?;
    let inner = object.get(VALUE_KEY)?;
    Some((tag, inner))
}

/// Encode a typed value.
pub fn to_json(value: &TypedValue) -> Result<Json, MarshalError> {
    check(value)?;
    match value.value() {
        Value::Object(object) => object.to_json(),
        Value::Member(member) => member.to_json(),
        inner if registry::is_native(value.tag()) => encode_inner(inner),
        inner => Ok(envelope(value.tag(), encode_inner(inner)?)),
    }
}

fn encode_inner(value: &Value) -> Result<Json, MarshalError> {
    Ok(match value {
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| unmarshalable(f, "non-finite floats have no JSON form"))?,
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::String(STANDARD.encode(bytes)),
        Value::Date(date) => Json::from(date.timestamp_millis()),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect::<Result<_, _>>()?),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(key, entry)| Ok((key.clone(), to_json(entry)?)))
                .collect::<Result<Map<_, _>, MarshalError>>()?,
        ),
        Value::Object(object) => object.to_json()?,
        Value::Member(member) => member.to_json()?,
        // Always enveloped, so the inner tag survives even for a native one.
        Value::Tagged(inner) => match inner.value() {
            Value::Object(_) | Value::Member(_) => to_json(inner)?,
            value => {
                check(inner)?;
                envelope(inner.tag(), encode_inner(value)?)
            }
        },
    })
}

/// Decode a JSON value.
///
/// The type comes from `hint` if one is given, otherwise from the value's envelope. A value with
/// neither is taken for what it looks like: a boolean, an integer, a float, a string, a list or a
/// map. With a hint, `value` is read as the inner value of that type, unless it is an envelope
/// for that very type. An envelope of another type is refused when the hint names a resource or
/// member, since neither has `type` and `value` fields of its own.
pub fn from_json(value: &Json, hint: Option<&str>) -> Result<TypedValue, MarshalError> {
    match (hint, split_envelope(value)) {
        (Some(hint), Some((tag, inner))) if tag == hint => decode_tagged(tag, inner),
        (Some(hint), Some((tag, _)))
            if matches!(registry::resolve(hint), Kind::Object(_) | Kind::Member(_)) =>
        {
            Err(malformed(hint, format!("found a {} envelope", tag)))
        }
        (Some(hint), _) => decode_tagged(hint, value),
        (None, Some((tag, inner))) => decode_tagged(tag, inner),
        (None, None) => infer(value),
    }
}

fn decode_tagged(tag: &str, inner: &Json) -> Result<TypedValue, MarshalError> {
    match registry::resolve(tag) {
        Kind::Object(ty) => {
            let mut object = DomainObject::new(ty);
            object.load_json(inner)?;
            Ok(TypedValue::from(object))
        }
        Kind::Member(kind) => {
            let mut member = Member::empty(kind);
            member.load_json(inner)?;
            Ok(TypedValue::from(member))
        }
        Kind::Collection(kind) if kind.is_associative() => {
            let object = inner
                .as_object()
                .ok_or_else(|| malformed(tag, "expected an object"))?;
            Ok(TypedValue::new(tag, decode_entries(object)?))
        }
        Kind::Collection(_) => {
            let items = inner
                .as_array()
                .ok_or_else(|| malformed(tag, "expected an array"))?;
            Ok(TypedValue::new(tag, decode_items(items)?))
        }
        Kind::Primitive(kind) => Ok(TypedValue::new(tag, decode_primitive(kind, inner)?)),
        // Types added by the Platform after this client was written.
        Kind::Unknown => {
            let value = match split_envelope(inner) {
                Some(_) => Value::Tagged(Box::new(from_json(inner, None)?)),
                None => infer(inner)?.into_value(),
            };
            Ok(TypedValue::new(tag, value))
        }
    }
}

fn decode_entries(object: &Map<String, Json>) -> Result<IndexMap<String, TypedValue>, MarshalError> {
    object
        .iter()
        .filter(|(_, entry)| !entry.is_null())
        .map(|(key, entry)| Ok((key.clone(), from_json(entry, None)?)))
        .collect()
}

fn decode_items(items: &[Json]) -> Result<Vec<TypedValue>, MarshalError> {
    items.iter().map(|item| from_json(item, None)).collect()
}

/// Decode a value that carries no type information.
fn infer(value: &Json) -> Result<TypedValue, MarshalError> {
    match value {
        Json::Null => Err(malformed("null", "a bare null has no value")),
        Json::Bool(b) => Ok(TypedValue::boolean(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(TypedValue::integer(i)),
            None => n
                .as_f64()
                .map(TypedValue::float)
                .ok_or_else(|| malformed(PrimitiveKind::Float.tag(), n.to_string())),
        },
        Json::String(s) => Ok(TypedValue::string(s.as_str())),
        Json::Array(items) => Ok(TypedValue::new(
            CollectionKind::List.tag(),
            decode_items(items)?,
        )),
        Json::Object(object) => Ok(TypedValue::new(
            CollectionKind::Map.tag(),
            decode_entries(object)?,
        )),
    }
}

fn decode_primitive(kind: PrimitiveKind, inner: &Json) -> Result<Value, MarshalError> {
    let tag = kind.tag();
    let mismatch = || malformed(tag, format!("unexpected {}", inner));
    match kind {
        PrimitiveKind::Boolean => inner.as_bool().map(Value::Boolean).ok_or_else(mismatch),
        PrimitiveKind::Integer => inner.as_i64().map(Value::Integer).ok_or_else(mismatch),
        PrimitiveKind::Float => inner.as_f64().map(Value::Float).ok_or_else(mismatch),
        PrimitiveKind::Bytes => {
            let text = inner.as_str().ok_or_else(mismatch)?;
            STANDARD
                .decode(text)
                .map(Value::Bytes)
                .map_err(|err| malformed(tag, err.to_string()))
        }
        PrimitiveKind::Date => date_from_millis(inner.as_i64().ok_or_else(mismatch)?),
        PrimitiveKind::String
        | PrimitiveKind::Id
        | PrimitiveKind::Path
        | PrimitiveKind::Url
        | PrimitiveKind::Email => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(mismatch),
    }
}

/// Parse JSON text without interpreting it.
pub fn parse(text: &str) -> Result<Json, MarshalError> {
    serde_json::from_str(text).context(JsonSyntaxSnafu)
}

/// Reads and writes JSON documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMarshaler;

impl Marshaler for JsonMarshaler {
    fn content_type(&self) -> &'static str {
        MIME_JSON
    }

    fn to_string(&self, value: &TypedValue) -> Result<String, MarshalError> {
        serde_json::to_string(&to_json(value)?).context(JsonSyntaxSnafu)
    }

    fn from_string(&self, text: &str, hint: Option<&str>) -> Result<TypedValue, MarshalError> {
        from_json(&parse(text)?, hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DomainType;
    use serde_json::json;

    #[test]
    fn flow_document() {
        let mut flow = DomainObject::new(DomainType::Flow);
        flow.set("name", "bucket1").unwrap();
        flow.set("path", "/test/bucket1").unwrap();

        let text = JsonMarshaler.to_string(&flow.clone().into()).unwrap();
        assert_eq!(
            text,
            r#"{"type":"flow","value":{"name":"bucket1","path":{"type":"path","value":"/test/bucket1"}}}"#
        );

        let back = JsonMarshaler.from_string(&text, None).unwrap();
        assert_eq!(back.value().as_object(), Some(&flow));
    }

    #[test]
    fn native_scalars_are_bare() {
        assert_eq!(to_json(&TypedValue::integer(3)).unwrap(), json!(3));
        assert_eq!(to_json(&TypedValue::string("x")).unwrap(), json!("x"));
        assert_eq!(
            to_json(&TypedValue::id("4f2a")).unwrap(),
            json!({"type": "id", "value": "4f2a"})
        );
        assert_eq!(
            to_json(&TypedValue::bytes(b"hi".to_vec())).unwrap(),
            json!({"type": "bytes", "value": "aGk="})
        );
    }

    #[test]
    fn collections_keep_shape() {
        let value = TypedValue::set(vec![
            TypedValue::string("a"),
            TypedValue::path("/b"),
            TypedValue::float(0.25),
        ]);
        let encoded = to_json(&value).unwrap();
        assert_eq!(
            encoded,
            json!({"type": "set", "value": ["a", {"type": "path", "value": "/b"}, 0.25]})
        );
        assert_eq!(from_json(&encoded, None).unwrap(), value);
    }

    #[test]
    fn untyped_values_are_inferred() {
        let value = from_json(&json!({"a": [1, 2.5, true], "b": null}), None).unwrap();
        assert_eq!(
            value,
            TypedValue::map(vec![(
                "a",
                TypedValue::list(vec![
                    TypedValue::integer(1),
                    TypedValue::float(2.5),
                    TypedValue::boolean(true),
                ])
            )])
        );
        assert!(matches!(
            from_json(&Json::Null, None),
            Err(MarshalError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn hints_name_the_inner_type() {
        let hinted = from_json(&json!("/x/y"), Some("path")).unwrap();
        assert_eq!(hinted, TypedValue::path("/x/y"));

        // An envelope for the hinted type is unwrapped rather than read as a map.
        let enveloped = from_json(&json!({"type": "path", "value": "/x/y"}), Some("path")).unwrap();
        assert_eq!(enveloped, hinted);

        let flow = from_json(&json!({"name": "n"}), Some("flow")).unwrap();
        assert_eq!(
            flow.value().as_object().unwrap().get("name"),
            Some(&Value::from("n"))
        );
    }

    #[test]
    fn hint_disagreeing_with_envelope() {
        let drop = json!({"type": "drop", "value": {"id": {"type": "id", "value": "d1"}, "flowId": {"type": "id", "value": "f1"}}});
        for hint in ["flow", "permissions"] {
            assert!(
                matches!(
                    from_json(&drop, Some(hint)),
                    Err(MarshalError::MalformedEnvelope { ref tag, .. }) if tag == hint
                ),
                "hint {}",
                hint
            );
        }
        // Other hints still read the envelope as plain content.
        let map = from_json(&drop, Some("map")).unwrap();
        assert_eq!(map.value().as_map().unwrap()["type"], TypedValue::string("drop"));
    }

    #[test]
    fn unknown_tags_pass_through() {
        let value = from_json(&json!({"type": "hologram", "value": {"glow": 3}}), None).unwrap();
        assert_eq!(value.tag(), "hologram");
        assert_eq!(
            value.value().as_map().unwrap()["glow"],
            TypedValue::integer(3)
        );
        // And they go back out the way they came in.
        assert_eq!(
            to_json(&value).unwrap(),
            json!({"type": "hologram", "value": {"glow": 3}})
        );
    }

    #[test]
    fn unknown_tags_keep_inner_envelopes() {
        for wire in [
            json!({"type": "hologram", "value": {"type": "flow", "value": {"name": "n"}}}),
            json!({"type": "hologram", "value": {"type": "path", "value": "/p"}}),
            json!({"type": "hologram", "value": {"type": "string", "value": "s"}}),
            json!({"type": "hologram", "value": {"type": "set", "value": [{"type": "id", "value": "x"}]}}),
            json!({"type": "hologram", "value": {"type": "mirage", "value": 1}}),
        ] {
            let value = from_json(&wire, None).unwrap();
            assert_eq!(value.tag(), "hologram");
            assert!(value.value().as_tagged().is_some(), "{}", wire);
            assert_eq!(to_json(&value).unwrap(), wire);
        }

        let value = from_json(
            &json!({"type": "hologram", "value": {"type": "flow", "value": {"name": "n"}}}),
            None,
        )
        .unwrap();
        let inner = value.value().as_tagged().unwrap();
        assert_eq!(
            inner.value().as_object().unwrap().get("name"),
            Some(&Value::from("n"))
        );
    }

    #[test]
    fn malformed_envelopes() {
        for bad in [
            json!({"type": "map", "value": [1]}),
            json!({"type": "list", "value": {"a": 1}}),
            json!({"type": "integer", "value": "twelve"}),
            json!({"type": "date", "value": "yesterday"}),
            json!({"type": "bytes", "value": "!!!"}),
            json!({"type": "flow", "value": 3}),
        ] {
            assert!(
                matches!(from_json(&bad, None), Err(MarshalError::MalformedEnvelope { .. })),
                "{} should be malformed",
                bad
            );
        }
    }

    #[test]
    fn non_finite_floats_are_unmarshalable() {
        assert!(matches!(
            to_json(&TypedValue::float(f64::INFINITY)),
            Err(MarshalError::UnmarshalableValue { .. })
        ));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(
            JsonMarshaler.from_string("{\"type\":", None),
            Err(MarshalError::JsonSyntax { .. })
        ));
    }
}
