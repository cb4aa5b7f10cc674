//! Async Zimbra SOAP client (JSON flavour).
//!
//! Each request POSTs a SOAP envelope to the service URL. Only the three
//! requests the converter needs are supported: AuthRequest,
//! GetFilterRulesRequest and ModifyFilterRulesRequest.
use serde_json::{json, Value};
use std::time::Duration;

use crate::record::schema::{FilterRule, FilterRules, OneOrMany};

const ACCOUNT_NS: &str = "urn:zimbraAccount";
const MAIL_NS: &str = "urn:zimbraMail";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL '{0}'")]
    Url(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Server fault {code}: {reason}")]
    Fault { code: String, reason: String },
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Not connected")]
    NotConnected,
}

pub struct ZimbraClient {
    http: reqwest::Client,
    url: reqwest::Url,
    token: Option<String>,
}

impl ZimbraClient {
    /// A client for the SOAP service at `url` (`http://` or `https://`).
    /// Every request gives up after `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, Error> {
        let url = reqwest::Url::parse(url).map_err(|_| Error::Url(url.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::Url(url.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url,
            token: None,
        })
    }

    /// Authenticate and keep the returned token for later requests.
    pub async fn connect(&mut self, username: &str, password: &str) -> Result<(), Error> {
        let request = json!({
            "_jsns": ACCOUNT_NS,
            "account": {"by": "name", "_content": username},
            "password": {"_content": password},
        });
        let response = self.call("AuthRequest", request, None).await?;
        let token = text_content(&response["authToken"])
            .ok_or_else(|| Error::Protocol("AuthResponse without authToken".to_string()))?;
        tracing::info!("authenticated as {username}");
        self.token = Some(token);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.token = None;
    }

    /// Fetch the account's incoming filter rules.
    pub async fn get_rules(&self) -> Result<Vec<FilterRule>, Error> {
        let token = self.token.as_deref().ok_or(Error::NotConnected)?;
        let response = self
            .call("GetFilterRulesRequest", json!({"_jsns": MAIL_NS}), Some(token))
            .await?;
        rules_from_response(&response)
    }

    /// Replace the account's incoming filter rules.
    pub async fn modify_rules(&self, rules: &[FilterRule]) -> Result<(), Error> {
        let token = self.token.as_deref().ok_or(Error::NotConnected)?;
        let wrapper = FilterRules {
            filter_rule: OneOrMany::from_vec(rules.to_vec()),
        };
        let request = json!({"_jsns": MAIL_NS, "filterRules": [wrapper]});
        self.call("ModifyFilterRulesRequest", request, Some(token))
            .await?;
        tracing::info!("uploaded {} rule(s)", rules.len());
        Ok(())
    }

    /// POST one request and return the body of its `<name>Response`.
    async fn call(&self, name: &str, request: Value, token: Option<&str>) -> Result<Value, Error> {
        tracing::debug!("> {name} to {}", self.url);
        let response = self
            .http
            .post(self.url.clone())
            .json(&envelope(name, request, token))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("< {status}");
        // Faults arrive as JSON with a 500 status.
        let reply: Value = match response.json().await {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => return Err(Error::Status(status.as_u16())),
            Err(e) => return Err(e.into()),
        };
        response_body(&reply, name)
    }
}

fn envelope(name: &str, request: Value, token: Option<&str>) -> Value {
    let mut context = json!({"_jsns": "urn:zimbra", "format": {"type": "js"}});
    if let Some(token) = token {
        context["authToken"] = json!({ "_content": token });
    }
    let mut body = serde_json::Map::new();
    body.insert(name.to_string(), request);
    json!({
        "Header": {"context": context},
        "Body": body,
    })
}

/// Pick `<name>Response` out of the reply envelope, turning faults into errors.
fn response_body(reply: &Value, name: &str) -> Result<Value, Error> {
    let body = &reply["Body"];
    if let Some(fault) = body.get("Fault") {
        let code = fault["Detail"]["Error"]["Code"]
            .as_str()
            .or_else(|| fault["Code"]["Value"].as_str())
            .unwrap_or("unknown")
            .to_string();
        let reason = text_content(&fault["Reason"]["Text"]).unwrap_or_default();
        return Err(Error::Fault { code, reason });
    }

    let key = format!("{}Response", name.trim_end_matches("Request"));
    body.get(&key)
        .cloned()
        .ok_or_else(|| Error::Protocol(format!("reply without {key}")))
}

fn rules_from_response(response: &Value) -> Result<Vec<FilterRule>, Error> {
    let Some(wrappers) = response.get("filterRules") else {
        return Ok(Vec::new());
    };
    let wrappers: OneOrMany<FilterRules> = serde_json::from_value(wrappers.clone())?;
    Ok(wrappers
        .into_vec()
        .into_iter()
        .flat_map(|w| w.filter_rule.map(OneOrMany::into_vec).unwrap_or_default())
        .collect())
}

/// Zimbra's JSON text nodes: a bare string, `{"_content": ...}`, or a list of
/// either.
fn text_content(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("_content").and_then(text_content),
        Value::Array(items) => items.first().and_then(text_content),
        _ => None,
    }
}
