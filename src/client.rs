// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! HTTP transport for the Platform API.
//!
//! The [Client] signs requests, sends them with `surf`, and unwraps the response envelope the
//! Platform puts around every payload. Payloads are encoded and decoded with the marshaler
//! selected by [ClientOptions::format].

use crate::config::ClientOptions;
use crate::error::{
    client_error, malformed, ApiError, ClientError, ConfigSnafu, FlowError, JsonSyntaxSnafu,
    MarshalError, PlatformSnafu,
};
use crate::json;
use crate::marshal::{Format, Marshaler};
use crate::object::DomainObject;
use crate::schema::DomainType;
use crate::value::{TypedValue, Value};
use crate::xml::{self, Element};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::prelude::*;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value as Json;
use sha1::{Digest, Sha1};
use snafu::ResultExt;
use std::convert::TryFrom;
use surf::http::Method;
use surf::{middleware::Next, Request, Response, StatusCode, Url};
use tracing::{event, Level};

/// The decoded envelope of a Platform response.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub ok: bool,
    /// Status reported inside the envelope, which may differ from the HTTP status.
    pub status: Option<u16>,
    pub errors: Vec<String>,
    pub body: Option<TypedValue>,
}

impl Reply {
    fn bare(body: TypedValue) -> Self {
        Self {
            ok: true,
            status: None,
            errors: Vec::new(),
            body: Some(body),
        }
    }

    /// The payload of a successful reply, or a [FlowError::Platform] for a failed one.
    pub fn into_body(self, status: StatusCode) -> Result<Option<TypedValue>, FlowError> {
        if self.ok {
            return Ok(self.body);
        }
        let status = self
            .status
            .and_then(|code| StatusCode::try_from(code).ok())
            .unwrap_or(status);
        event!(
            Level::WARN,
            "platform reported failure ({}): {}",
            status,
            self.errors.join("; ")
        );
        PlatformSnafu {
            status,
            errors: self.errors,
        }
        .fail()
    }
}

#[derive(Debug, Deserialize)]
struct Head {
    #[serde(default = "succeeded")]
    ok: bool,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    errors: Vec<Json>,
}

fn succeeded() -> bool {
    true
}

fn error_text(error: Json) -> String {
    match error {
        Json::String(message) => message,
        other => other.to_string(),
    }
}

fn json_reply(text: &str) -> Result<Reply, MarshalError> {
    let mut document = json::parse(text)?;
    let head = match document
        .as_object_mut()
        .and_then(|fields| fields.remove("head"))
    {
        Some(head) => head,
        // A bare payload with no envelope.
        None => return Ok(Reply::bare(json::from_json(&document, None)?)),
    };
    let head: Head = serde_json::from_value(head).context(JsonSyntaxSnafu)?;
    let body = match document.get("body") {
        None | Some(Json::Null) => None,
        Some(body) => Some(json::from_json(body, None)?),
    };
    Ok(Reply {
        ok: head.ok,
        status: head.status,
        errors: head.errors.into_iter().map(error_text).collect(),
        body,
    })
}

fn xml_reply(text: &str) -> Result<Reply, MarshalError> {
    let root = xml::parse(text)?;
    if root.name != "response" {
        return Ok(Reply::bare(xml::from_xml(&root, None)?));
    }
    let head = root
        .child("head")
        .ok_or_else(|| malformed("response", "missing head"))?;
    let ok = match head.child_text("ok").as_deref().map(str::trim) {
        None | Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        Some(other) => {
            return Err(malformed(
                "response",
                format!("invalid ok flag {:?}", other),
            ))
        }
    };
    let status = head
        .child_text("status")
        .and_then(|status| status.trim().parse().ok());
    let errors = head
        .child("errors")
        .map(|errors| errors.elements().map(Element::text).collect())
        .unwrap_or_default();
    let body = root
        .child("body")
        .and_then(|body| body.elements().next())
        .map(|payload| xml::from_xml(payload, None))
        .transpose()?;
    Ok(Reply {
        ok,
        status,
        errors,
        body,
    })
}

/// Decode the envelope of a response document.
///
/// Documents without an envelope are accepted as a successful reply carrying the whole document.
pub fn parse_reply(format: Format, text: &str) -> Result<Reply, MarshalError> {
    match format {
        Format::Json => json_reply(text),
        Format::Xml => xml_reply(text),
    }
}

pub async fn response_to_result(mut res: Response) -> surf::Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.body_string().await?;
    let format = res
        .content_type()
        .and_then(|mime| Format::from_content_type(mime.essence()));
    let err = match format.map(|format| parse_reply(format, &text)) {
        Some(Ok(reply)) if !reply.errors.is_empty() => FlowError::Platform {
            status,
            errors: reply.errors,
        },
        _ if text.trim().is_empty() => {
            FlowError::catch_all(status, status.canonical_reason().to_string())
        }
        _ => FlowError::catch_all(status, text),
    };
    Err(client_error::<FlowError>(err))
}

/// Client middleware which turns responses with non-success statuses into errors.
///
/// Successful responses are passed through unchanged. Otherwise the error list of the response
/// envelope, if there is one, becomes a [FlowError::Platform] lifted into a [surf::Error]; any
/// other body becomes a [FlowError::Transport]. Either can be recovered with
/// [ApiError::from_client_error].
///
/// If the request fails without producing a response at all, the [surf::Error] from the failed
/// request is passed through.
pub fn parse_error_body(
    req: Request,
    client: surf::Client,
    next: Next<'_>,
) -> BoxFuture<surf::Result<Response>> {
    Box::pin(
        next.run(req, client)
            .and_then(|res| async { response_to_result(res).await }),
    )
}

fn transport<T>(result: surf::Result<T>) -> Result<T, FlowError> {
    result.context(ClientError)
}

/// A signed connection to the Platform.
#[derive(Clone)]
pub struct Client {
    options: ClientOptions,
    http: surf::Client,
}

impl Client {
    pub fn new(options: ClientOptions) -> Result<Self, FlowError> {
        options.validate()?;
        let config = surf::Config::new().set_timeout(Some(options.timeout()));
        let http = surf::Client::try_from(config)
            .map_err(|err| {
                ConfigSnafu {
                    message: err.to_string(),
                }
                .build()
            })?
            .with(parse_error_body);
        Ok(Self { options, http })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Act on behalf of another identity in subsequent requests.
    pub fn set_global_actor(&mut self, actor: impl Into<String>) -> &mut Self {
        self.options.actor = Some(actor.into());
        self
    }

    pub fn set_global_params(&mut self, params: IndexMap<String, String>) -> &mut Self {
        self.options.params = params;
        self
    }

    pub fn set_global_headers(
        &mut self,
        headers: IndexMap<String, String>,
    ) -> Result<&mut Self, FlowError> {
        let previous = std::mem::replace(&mut self.options.headers, headers);
        if let Err(err) = self.options.validate() {
            self.options.headers = previous;
            return Err(err);
        }
        Ok(self)
    }

    pub fn marshaler(&self) -> &'static dyn Marshaler {
        self.options.format.marshaler()
    }

    pub fn marshal(&self, value: &TypedValue) -> Result<String, FlowError> {
        Ok(self.marshaler().to_string(value)?)
    }

    pub fn unmarshal(&self, text: &str, hint: Option<&str>) -> Result<TypedValue, FlowError> {
        Ok(self.marshaler().from_string(text, hint)?)
    }

    /// The authentication headers for a request made at `timestamp` (milliseconds since the
    /// epoch).
    ///
    /// The signature is the hex SHA-1 digest of the lowercased `name:value` pairs, concatenated in
    /// order, followed by the secret.
    pub fn credentials(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut credentials = vec![
            ("X-Actor", self.options.actor.clone().unwrap_or_default()),
            ("X-Key", self.options.key.clone()),
            ("X-Timestamp", timestamp.to_string()),
        ];
        let signed = credentials
            .iter()
            .map(|(name, value)| format!("{}:{}", name.to_lowercase(), value))
            .join("");
        let mut hasher = Sha1::new();
        hasher.update(signed.as_bytes());
        hasher.update(self.options.secret.as_bytes());
        credentials.push(("X-Signature", hex::encode(hasher.finalize())));
        credentials
    }

    fn url(&self, base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, FlowError> {
        let mut url = Url::parse(&format!("{}{}", base, path)).map_err(|err| {
            ConfigSnafu {
                message: format!("invalid URL {}{}: {}", base, path, err),
            }
            .build()
        })?;
        let mut query: IndexMap<&str, &str> = params.iter().copied().collect();
        for (key, value) in &self.options.params {
            query.entry(key.as_str()).or_insert(value.as_str());
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Build a signed request for an API path.
    ///
    /// `params` take precedence over the global parameters of the same name.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<Request, FlowError> {
        let url = self.url(&self.options.base_url(), path, params)?;
        let content_type = self.options.format.content_type();
        let mut req = Request::new(method, url);
        req.insert_header("Accept", content_type);
        req.insert_header("User-Agent", self.options.user_agent.as_str());
        if let Some(body) = body {
            req.set_body(body);
            req.insert_header("Content-Type", content_type);
        }
        for (name, value) in &self.options.headers {
            req.insert_header(name.as_str(), value.as_str());
        }
        for (name, value) in self.credentials(Utc::now().timestamp_millis()) {
            req.insert_header(name, value);
        }
        Ok(req)
    }

    async fn send(&self, req: Request) -> Result<Option<TypedValue>, FlowError> {
        let method = req.method();
        let url = req.url().clone();
        event!(Level::INFO, "{} {}", method, url);
        let mut res = transport(self.http.send(req).await)?;
        let status = res.status();
        event!(Level::INFO, "{} {} -> {}", method, url, status);
        let text = transport(res.body_string().await)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let format = match res.content_type() {
            Some(mime) => Format::from_content_type(mime.essence()).ok_or_else(|| {
                FlowError::catch_all(
                    StatusCode::UnsupportedMediaType,
                    format!("unsupported content type {}", mime),
                )
            })?,
            None => self.options.format,
        };
        parse_reply(format, &text)?.into_body(status)
    }

    fn encode(&self, body: &TypedValue) -> Result<String, FlowError> {
        self.marshal(body)
    }

    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<TypedValue>, FlowError> {
        self.send(self.request(Method::Get, path, params, None)?)
            .await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &TypedValue,
        params: &[(&str, &str)],
    ) -> Result<Option<TypedValue>, FlowError> {
        let body = self.encode(body)?;
        self.send(self.request(Method::Post, path, params, Some(body))?)
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        body: &TypedValue,
        params: &[(&str, &str)],
    ) -> Result<Option<TypedValue>, FlowError> {
        let body = self.encode(body)?;
        self.send(self.request(Method::Put, path, params, Some(body))?)
            .await
    }

    pub async fn delete(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<TypedValue>, FlowError> {
        self.send(self.request(Method::Delete, path, params, None)?)
            .await
    }

    /// The address of an OAuth endpoint, for use in a browser redirect.
    ///
    /// Global parameters are only added when `params` is given.
    pub fn oauth_uri(&self, path: &str, params: Option<&[(&str, &str)]>) -> Result<Url, FlowError> {
        let base = format!("{}/oauth", self.options.base_url());
        match params {
            Some(params) => self.url(&base, path, params),
            None => Url::parse(&format!("{}{}", base, path)).map_err(|err| {
                ConfigSnafu {
                    message: format!("invalid URL {}{}: {}", base, path, err),
                }
                .build()
            }),
        }
    }

    /// The address of a file stored on the file host.
    pub fn file_uri(&self, path: &str) -> Result<Url, FlowError> {
        let base = format!("http://{}:{}", self.options.file_host, self.options.port);
        self.url(&base, path, &[])
    }

    /// Create `object` on the Platform and copy the stored fields (id, creation date, ...) back
    /// into it.
    pub async fn create(&self, object: &mut DomainObject) -> Result<(), FlowError> {
        let path = object.collection_path()?;
        event!(Level::INFO, "creating {}", object);
        let reply = self
            .post(&path, &TypedValue::from(object.clone()), &[])
            .await?;
        object.merge(expect_object(reply, object.ty())?)
    }

    pub async fn update(&self, object: &mut DomainObject) -> Result<(), FlowError> {
        let path = object.resource_path()?;
        event!(Level::INFO, "updating {}", object);
        let reply = self
            .put(&path, &TypedValue::from(object.clone()), &[])
            .await?;
        if reply.is_some() {
            object.merge(expect_object(reply, object.ty())?)?;
        }
        Ok(())
    }

    pub async fn delete_object(&self, object: &DomainObject) -> Result<(), FlowError> {
        let path = object.resource_path()?;
        event!(Level::INFO, "deleting {}", object);
        self.delete(&path, &[]).await?;
        Ok(())
    }

    /// Fetch one object by id. Drops are identified as `{flowId}/{dropId}`.
    pub async fn find_by_id(&self, ty: DomainType, id: &str) -> Result<DomainObject, FlowError> {
        let reply = self.get(&format!("/{}/{}", ty.name(), id), &[]).await?;
        expect_object(reply, ty)
    }

    /// List objects of a type, filtered by query parameters.
    pub async fn find(
        &self,
        ty: DomainType,
        params: &[(&str, &str)],
    ) -> Result<Vec<DomainObject>, FlowError> {
        let reply = self.get(&format!("/{}", ty.name()), params).await?;
        expect_objects(reply, ty)
    }

    /// List the drops of a flow.
    pub async fn find_drops(
        &self,
        flow_id: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<DomainObject>, FlowError> {
        let ty = DomainType::Drop;
        let reply = self
            .get(&format!("/{}/{}", ty.name(), flow_id), params)
            .await?;
        expect_objects(reply, ty)
    }
}

fn expect_object(reply: Option<TypedValue>, ty: DomainType) -> Result<DomainObject, FlowError> {
    match reply.map(TypedValue::into_value) {
        Some(Value::Object(object)) if object.ty() == ty => Ok(*object),
        Some(other) => Err(malformed(
            ty.name(),
            format!("expected a {} in the response, got {}", ty, other.inferred_tag()),
        )
        .into()),
        None => Err(malformed(ty.name(), "response has no body").into()),
    }
}

fn expect_objects(reply: Option<TypedValue>, ty: DomainType) -> Result<Vec<DomainObject>, FlowError> {
    match reply.map(TypedValue::into_value) {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => items
            .into_iter()
            .map(|item| expect_object(Some(item), ty))
            .collect(),
        Some(other) => Err(malformed(
            ty.name(),
            format!("expected a list of {} in the response, got {}", ty, other.inferred_tag()),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surf::http::mime;

    fn client(format: Format) -> Client {
        Client::new(
            ClientOptions::new("key", "secret")
                .actor("000000000000000000000001")
                .format(format)
                .param("hints", "0"),
        )
        .unwrap()
    }

    #[test]
    fn credentials_are_signed() {
        let client = client(Format::Json);
        let credentials = client.credentials(1_300_000_000_000);
        let names: Vec<_> = credentials.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["X-Actor", "X-Key", "X-Timestamp", "X-Signature"]);

        let mut hasher = Sha1::new();
        hasher.update(
            "x-actor:000000000000000000000001x-key:keyx-timestamp:1300000000000secret".as_bytes(),
        );
        assert_eq!(credentials[3].1, hex::encode(hasher.finalize()));
        assert_eq!(credentials[3].1.len(), 40);

        // A different secret gives a different signature.
        let other = Client::new(ClientOptions::new("key", "other")).unwrap();
        assert_ne!(other.credentials(1_300_000_000_000)[3].1, credentials[3].1);
    }

    #[test]
    fn request_headers_and_query() {
        let client = client(Format::Xml);
        let req = client
            .request(
                Method::Get,
                "/flow",
                &[("hints", "1"), ("limit", "10")],
                None,
            )
            .unwrap();
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.url().path(), "/flow");
        assert_eq!(req.url().host_str(), Some("api.flow.net"));
        let query: Vec<_> = req.url().query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("hints".to_string(), "1".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
        assert_eq!(req.header("Accept").unwrap().as_str(), "text/xml");
        assert_eq!(
            req.header("User-Agent").unwrap().as_str(),
            "flow-rust-client_0.1"
        );
        assert_eq!(
            req.header("X-Actor").unwrap().as_str(),
            "000000000000000000000001"
        );
        assert!(req.header("X-Signature").is_some());
        assert!(req.header("Content-Type").is_none());

        let req = client
            .request(Method::Post, "/flow", &[], Some("<flow/>".into()))
            .unwrap();
        assert_eq!(req.header("Content-Type").unwrap().as_str(), "text/xml");
        assert_eq!(req.url().query(), Some("hints=0"));
    }

    #[test]
    fn global_state() {
        let mut client = client(Format::Json);
        client.set_global_actor("000000000000000000000002");
        assert_eq!(client.credentials(0)[0].1, "000000000000000000000002");

        let mut headers = IndexMap::new();
        headers.insert("X-Trace".to_string(), "abc".to_string());
        client.set_global_headers(headers).unwrap();
        let req = client.request(Method::Get, "/user", &[], None).unwrap();
        assert_eq!(req.header("X-Trace").unwrap().as_str(), "abc");

        let mut bad = IndexMap::new();
        bad.insert("Bad Header:".to_string(), "x".to_string());
        assert!(client.set_global_headers(bad).is_err());
        assert_eq!(client.options().headers["X-Trace"], "abc");

        client.set_global_params(IndexMap::new());
        let req = client.request(Method::Get, "/user", &[], None).unwrap();
        assert_eq!(req.url().query(), None);
    }

    #[test]
    fn configured_format_marshals() {
        let value = TypedValue::path("/test/bucket1");
        let json = client(Format::Json);
        let text = json.marshal(&value).unwrap();
        assert_eq!(text, r#"{"type":"path","value":"/test/bucket1"}"#);
        assert_eq!(json.unmarshal(&text, None).unwrap(), value);

        let xml = client(Format::Xml);
        let text = xml.marshal(&value).unwrap();
        assert!(text.contains(r#"<item type="path">/test/bucket1</item>"#));
        assert_eq!(xml.unmarshal(&text, None).unwrap(), value);
        assert_eq!(
            xml.unmarshal("<item>/b</item>", Some("path")).unwrap(),
            TypedValue::path("/b")
        );
    }

    #[test]
    fn oauth_and_file_uris() {
        let client = client(Format::Json);
        assert_eq!(
            client.oauth_uri("/authorize", None).unwrap().as_str(),
            "http://api.flow.net/oauth/authorize"
        );
        let uri = client
            .oauth_uri("/authorize", Some(&[("client_id", "c1")]))
            .unwrap();
        assert_eq!(uri.query(), Some("client_id=c1&hints=0"));
        let file = client.file_uri("/f1/d1/photo.jpg").unwrap();
        assert_eq!(file.host_str(), Some("file.flow.net"));
        assert_eq!(file.path(), "/f1/d1/photo.jpg");
    }

    #[test]
    fn json_replies() {
        let reply = parse_reply(
            Format::Json,
            r#"{"head": {"ok": true, "status": 200},
                "body": {"type": "flow", "value": {"id": {"type": "id", "value": "f1"}, "name": "bucket1"}}}"#,
        )
        .unwrap();
        assert!(reply.ok);
        assert_eq!(reply.status, Some(200));
        let flow = expect_object(reply.body, DomainType::Flow).unwrap();
        assert_eq!(flow.id(), Some("f1"));

        let reply = parse_reply(
            Format::Json,
            r#"{"head": {"ok": false, "status": 400, "errors": ["name is required", {"field": "path"}]}, "body": null}"#,
        )
        .unwrap();
        assert_eq!(
            reply.errors,
            vec!["name is required".to_string(), r#"{"field":"path"}"#.to_string()]
        );
        match reply.into_body(StatusCode::Ok) {
            Err(FlowError::Platform { status, errors }) => {
                assert_eq!(status, StatusCode::BadRequest);
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }

        // No envelope: the document is the payload.
        let reply = parse_reply(Format::Json, "[1, 2]").unwrap();
        assert_eq!(
            reply.into_body(StatusCode::Ok).unwrap(),
            Some(TypedValue::list(vec![
                TypedValue::integer(1),
                TypedValue::integer(2)
            ]))
        );
    }

    #[test]
    fn xml_replies() {
        let reply = parse_reply(
            Format::Xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><response><head><ok>true</ok><status>200</status></head><body><items type="list"><flow type="flow"><id type="id">f1</id></flow><flow type="flow"><id type="id">f2</id></flow></items></body></response>"#,
        )
        .unwrap();
        let flows = expect_objects(reply.body, DomainType::Flow).unwrap();
        assert_eq!(
            flows.iter().map(|flow| flow.id().unwrap()).collect::<Vec<_>>(),
            ["f1", "f2"]
        );

        let reply = parse_reply(
            Format::Xml,
            "<response><head><ok>false</ok><status>404</status><errors><error>no such flow</error></errors></head><body/></response>",
        )
        .unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.errors, vec!["no such flow".to_string()]);
        assert_eq!(reply.body, None);

        assert!(parse_reply(Format::Xml, "<response><body/></response>").is_err());
    }

    #[test]
    fn wrong_payloads_are_rejected() {
        let comment = TypedValue::from(DomainObject::new(DomainType::Comment));
        assert!(matches!(
            expect_object(Some(comment), DomainType::Flow),
            Err(FlowError::Marshal { .. })
        ));
        assert!(expect_object(None, DomainType::Flow).is_err());
        assert!(expect_objects(Some(TypedValue::string("x")), DomainType::Flow).is_err());
        assert!(expect_objects(None, DomainType::Flow).unwrap().is_empty());
    }

    #[async_std::test]
    async fn error_responses_become_platform_errors() {
        let mut res = surf::http::Response::new(StatusCode::NotFound);
        res.set_body(r#"{"head": {"ok": false, "status": 404, "errors": ["no such flow"]}}"#);
        res.set_content_type(mime::JSON);
        let err = match response_to_result(res.into()).await {
            Err(err) => FlowError::from_client_error(err),
            Ok(_) => panic!("error status passed through"),
        };
        match err {
            FlowError::Platform { status, errors } => {
                assert_eq!(status, StatusCode::NotFound);
                assert_eq!(errors, vec!["no such flow".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut res = surf::http::Response::new(StatusCode::BadGateway);
        res.set_body("upstream unavailable");
        let err = FlowError::from_client_error(response_to_result(res.into()).await.unwrap_err());
        assert!(matches!(err, FlowError::Transport { status: StatusCode::BadGateway, .. }));

        let res = surf::http::Response::new(StatusCode::Ok);
        assert!(response_to_result(res.into()).await.is_ok());
    }
}
