// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use chrono::{TimeZone, Utc};
use flow_net::*;

fn bucket(n: usize) -> DomainObject {
    DomainObject::with_fields(
        DomainType::Flow,
        vec![
            ("name", format!("flow_rust_client_example_bucket_{}", n)),
            ("path", format!("/test/flow_rust_client_example_bucket_{}", n)),
        ],
    )
    .unwrap()
}

fn examples() -> Vec<DomainObject> {
    let identity =
        DomainObject::with_fields(DomainType::Identity, vec![("alias", "foobarbaz")]).unwrap();

    let mut user = DomainObject::with_fields(
        DomainType::User,
        vec![("email", "foobarbaz@example.com"), ("password", "p4ssw0rd")],
    )
    .unwrap();
    user.set("defaultIdentity", identity.clone()).unwrap();

    let mut application = DomainObject::with_fields(
        DomainType::Application,
        vec![
            ("name", "flow_rust_client_example_application"),
            ("email", "jeff@flow.net"),
        ],
    )
    .unwrap();
    application.set("url", "http://flow.net").unwrap();

    let comment =
        DomainObject::with_fields(DomainType::Comment, vec![("text", "Lorem ipsum dolor sit amet")])
            .unwrap();

    let mut drop = DomainObject::new(DomainType::Drop);
    drop.set_field(
        "elems",
        TypedValue::map(vec![
            ("foo", TypedValue::string("Lorem ipsum")),
            ("bar", TypedValue::integer(12)),
        ]),
    )
    .unwrap();

    let mut examples = vec![identity, user, application];
    examples.extend((1..=5).map(bucket));
    examples.push(comment);
    examples.push(drop);
    examples
}

#[test]
fn example_objects_survive_both_formats() {
    for format in [Format::Json, Format::Xml] {
        let marshaler = format.marshaler();
        for object in examples() {
            let value = TypedValue::from(object.clone());
            let text = marshaler.to_string(&value).unwrap();
            let back = marshaler.from_string(&text, None).unwrap();
            assert_eq!(back, value, "{} round trip of {}", format, text);

            // A hint naming the same type reads the same document.
            let hinted = marshaler
                .from_string(&text, Some(object.ty().name()))
                .unwrap();
            assert_eq!(hinted, value);
        }
    }
}

#[test]
fn drop_elements_keep_their_types() {
    let drop = examples().pop().unwrap();
    let text = Format::Json
        .marshaler()
        .to_string(&TypedValue::from(drop))
        .unwrap();
    assert_eq!(
        text,
        r#"{"type":"drop","value":{"elems":{"type":"map","value":{"foo":"Lorem ipsum","bar":12}}}}"#
    );

    let element = Format::Xml
        .marshaler()
        .from_string(
            r#"<drop type="drop"><elems type="map"><foo type="string">Lorem ipsum</foo><bar type="integer">12</bar></elems></drop>"#,
            None,
        )
        .unwrap();
    let elems = element
        .value()
        .as_object()
        .unwrap()
        .get("elems")
        .and_then(Value::as_map)
        .unwrap()
        .clone();
    assert_eq!(elems["foo"], TypedValue::string("Lorem ipsum"));
    assert_eq!(elems["bar"], TypedValue::integer(12));
}

#[test]
fn primitives_keep_their_tags() {
    let date = Utc.timestamp_millis_opt(1_300_000_000_123).unwrap();
    let values = vec![
        TypedValue::boolean(false),
        TypedValue::integer(-42),
        TypedValue::float(2.5),
        TypedValue::string(""),
        TypedValue::string("a < b & c"),
        TypedValue::id("4d0a9f2e1b2c3d4e5f6a7b8c"),
        TypedValue::path("/test/bucket1"),
        TypedValue::url("http://flow.net/?a=1&b=2"),
        TypedValue::email("jeff@flow.net"),
        TypedValue::bytes(vec![0u8, 1, 2, 254, 255]),
        TypedValue::date(date),
    ];
    for format in [Format::Json, Format::Xml] {
        let marshaler = format.marshaler();
        for value in &values {
            let text = marshaler.to_string(value).unwrap();
            assert_eq!(
                &marshaler.from_string(&text, None).unwrap(),
                value,
                "{} {}",
                format,
                text
            );
        }
    }
}

#[test]
fn collections_keep_their_shape() {
    let nested = TypedValue::sorted_map(vec![
        ("a", TypedValue::set(vec![TypedValue::id("x"), TypedValue::id("y")])),
        (
            "b",
            TypedValue::list(vec![
                TypedValue::map(vec![("k", TypedValue::boolean(true))]),
                TypedValue::list(Vec::new()),
            ]),
        ),
    ]);
    for format in [Format::Json, Format::Xml] {
        let marshaler = format.marshaler();
        let text = marshaler.to_string(&nested).unwrap();
        assert_eq!(marshaler.from_string(&text, None).unwrap(), nested, "{}", text);
    }
}

#[test]
fn unknown_tags_are_tolerated() {
    let value = Format::Json
        .marshaler()
        .from_string(r#"{"type":"hologram","value":{"depth":3}}"#, None)
        .unwrap();
    assert_eq!(value.tag(), "hologram");
    assert_eq!(value.kind(), Kind::Unknown);
    assert_eq!(
        value.value().as_map().unwrap()["depth"],
        TypedValue::integer(3)
    );

    let value = Format::Xml
        .marshaler()
        .from_string(r#"<thing type="hologram">shiny</thing>"#, None)
        .unwrap();
    assert_eq!(value.tag(), "hologram");
    assert_eq!(value.value().as_str(), Some("shiny"));
}

#[test]
fn newer_fields_are_dropped() {
    let value = Format::Json
        .marshaler()
        .from_string(
            r#"{"type":"comment","value":{"text":"hi","reactions":{"type":"list","value":[]}}}"#,
            None,
        )
        .unwrap();
    let comment = value.value().as_object().unwrap();
    assert_eq!(comment.get("text").and_then(Value::as_str), Some("hi"));
    assert_eq!(comment.fields().count(), 1);
}

#[test]
fn permissions_on_a_flow() {
    let mut flow = bucket(1);
    flow.set(
        "permissions",
        Member::Permissions(Permissions::new(
            &["000000000000000000000001"],
            &[],
            &["000000000000000000000002"],
            true,
            false,
            false,
        )),
    )
    .unwrap();
    let value = TypedValue::from(flow);
    for format in [Format::Json, Format::Xml] {
        let marshaler = format.marshaler();
        let text = marshaler.to_string(&value).unwrap();
        let back = marshaler.from_string(&text, None).unwrap();
        assert_eq!(back, value, "{}", text);
        let permissions = back
            .value()
            .as_object()
            .unwrap()
            .get("permissions")
            .and_then(Value::as_member)
            .cloned();
        match permissions {
            Some(Member::Permissions(permissions)) => {
                assert!(permissions.readers.allows("000000000000000000000001"));
                assert!(!permissions.readers.allows("000000000000000000000002"));
                assert!(!permissions.deleters.allows("000000000000000000000002"));
                assert!(permissions.writers.allows("000000000000000000000002"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn malformed_documents_are_rejected() {
    let json = Format::Json.marshaler();
    assert!(matches!(
        json.from_string("null", None),
        Err(MarshalError::MalformedEnvelope { .. })
    ));
    assert!(matches!(
        json.from_string(r#"{"type":"integer","value":"twelve"}"#, None),
        Err(MarshalError::MalformedEnvelope { .. })
    ));
    assert!(matches!(
        json.from_string("{", None),
        Err(MarshalError::JsonSyntax { .. })
    ));
    assert!(matches!(
        json.to_string(&TypedValue::new("integer", "twelve")),
        Err(MarshalError::UnmarshalableValue { .. })
    ));

    let xml = Format::Xml.marshaler();
    assert!(matches!(
        xml.from_string("<flow type=\"flow\">", None),
        Err(MarshalError::XmlSyntax { .. })
    ));
    assert!(matches!(
        xml.from_string(r#"<n type="date">yesterday</n>"#, None),
        Err(MarshalError::MalformedEnvelope { .. })
    ));
}

#[test]
fn hints_must_agree_with_the_document() {
    let mut drop = DomainObject::new(DomainType::Drop);
    drop.set("path", "/test/bucket1").unwrap();
    let value = TypedValue::from(drop);
    for format in [Format::Json, Format::Xml] {
        let marshaler = format.marshaler();
        let text = marshaler.to_string(&value).unwrap();
        for hint in ["flow", "permissions"] {
            assert!(
                matches!(
                    marshaler.from_string(&text, Some(hint)),
                    Err(MarshalError::MalformedEnvelope { .. })
                ),
                "{} read as {}",
                format,
                hint
            );
        }
        assert_eq!(marshaler.from_string(&text, Some("drop")).unwrap(), value);
    }
}

#[test]
fn unknown_wrappers_keep_inner_types() {
    let json = Format::Json.marshaler();
    for text in [
        r#"{"type":"hologram","value":{"type":"path","value":"/test/bucket1"}}"#,
        r#"{"type":"hologram","value":{"type":"comment","value":{"text":"hi"}}}"#,
    ] {
        let value = json.from_string(text, None).unwrap();
        assert_eq!(value.tag(), "hologram");
        assert!(value.value().as_tagged().is_some());
        assert_eq!(json.to_string(&value).unwrap(), text);
    }
}
