// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the flow-net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{ConfigSnafu, FlowError};
use crate::marshal::Format;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "api.flow.net";
pub const DEFAULT_FILE_HOST: &str = "file.flow.net";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_USER_AGENT: &str = "flow-rust-client_0.1";

/// Settings for a [Client](crate::client::Client).
///
/// Options can be built in code or deserialized from any serde format. Only `key` and `secret`
/// are required; everything else has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ClientOptions {
    pub key: String,
    pub secret: String,
    /// Identity requests are made on behalf of.
    pub actor: Option<String>,
    pub host: String,
    pub file_host: String,
    pub port: u16,
    /// Query parameters added to every request.
    pub params: IndexMap<String, String>,
    /// Headers added to every request.
    pub headers: IndexMap<String, String>,
    pub format: Format,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            actor: None,
            host: DEFAULT_HOST.to_string(),
            file_host: DEFAULT_FILE_HOST.to_string(),
            port: DEFAULT_PORT,
            params: IndexMap::new(),
            headers: IndexMap::new(),
            format: Format::Json,
            timeout_secs: 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            ..Default::default()
        }
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the options can be used to sign requests.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.key.is_empty() || self.secret.is_empty() {
            return ConfigSnafu {
                message: "key and secret are required",
            }
            .fail();
        }
        let printable = |text: &str| text.bytes().all(|b| b.is_ascii_graphic() || b == b' ');
        if let Some((name, _)) = self.headers.iter().find(|(name, value)| {
            name.is_empty() || name.contains(':') || !printable(name) || !printable(value)
        }) {
            return ConfigSnafu {
                message: format!("invalid header {:?}", name),
            }
            .fail();
        }
        if self.host.is_empty() {
            return ConfigSnafu {
                message: "host must not be empty",
            }
            .fail();
        }
        Ok(())
    }

    /// The base URL of the API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ClientOptions::new("k", "s");
        assert_eq!(options.base_url(), "http://api.flow.net:80");
        assert_eq!(options.format, Format::Json);
        assert_eq!(options.timeout(), Duration::from_secs(60));
        options.validate().unwrap();
    }

    #[test]
    fn key_and_secret_are_required() {
        assert!(matches!(
            ClientOptions::default().validate(),
            Err(FlowError::Config { .. })
        ));
        assert!(ClientOptions::new("k", "").validate().is_err());
        assert!(ClientOptions::new("k", "s")
            .header("Bad:Name", "v")
            .validate()
            .is_err());
        assert!(ClientOptions::new("k", "s")
            .header("X-Note", "caf\u{e9}")
            .validate()
            .is_err());
    }

    #[test]
    fn deserialize_partial() {
        let options: ClientOptions = serde_json::from_str(
            r#"{"key": "k", "secret": "s", "actor": "000000000000000000000001", "format": "xml", "params": {"hints": "0"}}"#,
        )
        .unwrap();
        assert_eq!(options.actor.as_deref(), Some("000000000000000000000001"));
        assert_eq!(options.format, Format::Xml);
        assert_eq!(options.params["hints"], "0");
        assert_eq!(options.host, DEFAULT_HOST);
        assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
    }
}
