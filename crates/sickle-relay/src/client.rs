//! Outbound clients for the feed server and the forum monitor.

use crate::error::RelayError;
use crate::payload::Envelope;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

fn loopback(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

/// Client for the feed server's control endpoints.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl FeedClient {
    /// Client for a feed server on the loopback interface.
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self::with_base_url(loopback(port), timeout)
    }

    /// Client for a feed server at an arbitrary base URL.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// `PUT /ping`; succeeds on any 2xx reply.
    pub async fn ping(&self) -> Result<(), RelayError> {
        let response = self
            .http
            .put(format!("{}/ping", self.base_url))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// `PUT /internal` asking the feed server to stop.
    pub async fn shutdown(&self) -> Result<Envelope, RelayError> {
        let response = self
            .http
            .put(format!("{}/internal", self.base_url))
            .timeout(self.timeout)
            .json(&json!({ "shutdown": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::Status(response.status().as_u16()));
        }
        response
            .json::<Envelope>()
            .await
            .map_err(|e| RelayError::InvalidReply(e.to_string()))
    }
}

/// Body of a forum monitor `/request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForumRequest {
    /// Target bot inside the monitor.
    pub bot: String,
    /// Command for that bot.
    pub cmd: String,
    /// Remaining arguments.
    pub args: Vec<String>,
    /// Id of the Discord user asking.
    pub key: u64,
}

impl ForumRequest {
    /// Builds a request from command arguments, `["<bot>.<cmd>", args...]`.
    ///
    /// A first argument that is not exactly `bot.cmd` asks the monitor's core
    /// bot for help. Returns `None` when there are no arguments.
    pub fn from_args(args: &[String], key: u64) -> Option<Self> {
        let (first, rest) = args.split_first()?;
        let (bot, cmd) = match first.split('.').collect::<Vec<_>>().as_slice() {
            [bot, cmd] => (bot.to_string(), cmd.to_string()),
            _ => ("Core".to_string(), "help".to_string()),
        };
        Some(Self {
            bot,
            cmd,
            args: rest.to_vec(),
            key,
        })
    }
}

/// Reply of the forum monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct ForumReply {
    /// `0` on success.
    pub status: i64,
    /// Text to show, if the monitor sent one.
    pub msg: Option<Value>,
}

impl ForumReply {
    /// Parses the reply body; it must be an object with an integer `status`.
    pub fn from_value(body: Value) -> Result<Self, RelayError> {
        let status = body
            .get("status")
            .and_then(Value::as_i64)
            .ok_or_else(|| RelayError::InvalidReply(body.to_string()))?;
        Ok(Self {
            status,
            msg: body.get("msg").cloned(),
        })
    }

    /// Text to post back to the channel.
    pub fn text(&self) -> String {
        match &self.msg {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None if self.status == 0 => "Done".to_string(),
            None => "Failed".to_string(),
        }
    }
}

/// Client for the forum monitor bot.
#[derive(Debug, Clone)]
pub struct ForumClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ForumClient {
    /// Client for a forum monitor on the loopback interface.
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self::with_base_url(loopback(port), timeout)
    }

    /// Client for a forum monitor at an arbitrary base URL.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// `PUT /request` and validate the reply envelope.
    pub async fn request(&self, request: &ForumRequest) -> Result<ForumReply, RelayError> {
        debug!(bot = %request.bot, cmd = %request.cmd, "Sending forum monitor request");
        let response = self
            .http
            .put(format!("{}/request", self.base_url))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::Status(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RelayError::InvalidReply(e.to_string()))?;
        ForumReply::from_value(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_request_from_args() {
        let req = ForumRequest::from_args(&args(&["feed.status", "a", "b"]), 7).unwrap();
        assert_eq!((req.bot.as_str(), req.cmd.as_str()), ("feed", "status"));
        assert_eq!(req.args, args(&["a", "b"]));
        assert_eq!(req.key, 7);

        let fallback = ForumRequest::from_args(&args(&["a.b.c"]), 7).unwrap();
        assert_eq!((fallback.bot.as_str(), fallback.cmd.as_str()), ("Core", "help"));
        assert!(ForumRequest::from_args(&[], 7).is_none());
    }

    #[test]
    fn test_reply_text() {
        let ok = ForumReply::from_value(json!({"status": 0})).unwrap();
        assert_eq!(ok.text(), "Done");
        let failed = ForumReply::from_value(json!({"status": -1})).unwrap();
        assert_eq!(failed.text(), "Failed");
        let msg = ForumReply::from_value(json!({"status": 1, "msg": "hi"})).unwrap();
        assert_eq!(msg.text(), "hi");
        let list = ForumReply::from_value(json!({"status": 0, "msg": [1, 2]})).unwrap();
        assert_eq!(list.text(), "[1,2]");
    }

    #[test]
    fn test_reply_requires_status() {
        assert!(matches!(
            ForumReply::from_value(json!({"msg": "no status"})),
            Err(RelayError::InvalidReply(_))
        ));
        assert!(ForumReply::from_value(json!(null)).is_err());
    }
}
