//! Jolokia HTTP bridge to the application service.
//!
//! Every request is a `GET` against the Jolokia REST agent:
//! - `exec/<mbean>/startApplication/<name>/`
//! - `exec/<mbean>/stopApplication/<name>/`
//! - `read/<mbean>/ApplicationTree/`
//!
//! Component names are escaped with Jolokia's `!` rules before they are
//! placed in the path.
//!
//! Jolokia reports operation failures inside an HTTP 200 body, so the
//! `status` field of the JSON response decides success.

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::config::ControlConfig;
use crate::control::file::parse_tree_payload;
use crate::control::{ControlSurface, TreeSource};
use crate::error::{Action, RemoteFailure, RemoteOperationError, TreeSourceError};
use crate::tree::AppSnapshot;

const START_OPERATION: &str = "startApplication";
const STOP_OPERATION: &str = "stopApplication";
const TREE_ATTRIBUTE: &str = "ApplicationTree";

/// Control surface and tree source backed by a Jolokia agent.
#[derive(Debug, Clone)]
pub struct JolokiaClient {
    http: reqwest::Client,
    base_url: String,
    mbean: String,
}

/// The parts of a Jolokia response body we care about.
#[derive(Debug, Deserialize)]
struct JolokiaResponse {
    status: u16,
    #[serde(default)]
    error: Option<String>,
}

impl JolokiaClient {
    pub fn new(config: &ControlConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("appforest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mbean: config.mbean.clone(),
        })
    }

    pub fn start_url(&self, name: &str) -> String {
        self.exec_url(START_OPERATION, name)
    }

    pub fn stop_url(&self, name: &str) -> String {
        self.exec_url(STOP_OPERATION, name)
    }

    pub fn tree_url(&self) -> String {
        format!("{}/jolokia/read/{}/{}/", self.base_url, self.mbean, TREE_ATTRIBUTE)
    }

    fn exec_url(&self, operation: &str, name: &str) -> String {
        format!(
            "{}/jolokia/exec/{}/{}/{}/",
            self.base_url,
            self.mbean,
            operation,
            escape_path_segment(name)
        )
    }

    async fn exec(&self, action: Action, name: &str) -> Result<(), RemoteOperationError> {
        let url = match action {
            Action::Install => self.start_url(name),
            Action::Uninstall => self.stop_url(name),
        };
        let fail = |reason: RemoteFailure| RemoteOperationError::new(name, action, reason);

        tracing::debug!(%url, "issuing {action} request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| fail(classify_transport_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| fail(classify_transport_error(&e)))?;

        if !status.is_success() {
            return Err(fail(RemoteFailure::Rejected {
                status: status.as_u16(),
                message: body,
            }));
        }

        check_exec_body(&body).map_err(fail)
    }
}

/// Escape a value for a Jolokia GET path: `!` becomes `!!`, `/` becomes `!/`
/// and `"` becomes `!"`.
fn escape_path_segment(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '!' | '/' | '"') {
            escaped.push('!');
        }
        escaped.push(ch);
    }
    escaped
}

fn classify_transport_error(error: &reqwest::Error) -> RemoteFailure {
    if error.is_timeout() {
        RemoteFailure::Timeout
    } else {
        RemoteFailure::Transport(error.to_string())
    }
}

/// Interpret the JSON body of an `exec` request.
fn check_exec_body(body: &str) -> Result<(), RemoteFailure> {
    let response: JolokiaResponse =
        serde_json::from_str(body).map_err(|e| RemoteFailure::Malformed(e.to_string()))?;
    if response.status == 200 {
        Ok(())
    } else {
        Err(RemoteFailure::Rejected {
            status: response.status,
            message: response.error.unwrap_or_default(),
        })
    }
}

impl ControlSurface for JolokiaClient {
    async fn start(&self, name: &str) -> Result<(), RemoteOperationError> {
        self.exec(Action::Install, name).await
    }

    async fn stop(&self, name: &str) -> Result<(), RemoteOperationError> {
        self.exec(Action::Uninstall, name).await
    }
}

impl TreeSource for JolokiaClient {
    async fn fetch_tree(&self) -> Result<Vec<AppSnapshot>, TreeSourceError> {
        let url = self.tree_url();
        tracing::debug!(%url, "fetching application tree");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TreeSourceError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TreeSourceError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(TreeSourceError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_tree_payload(&body)
    }
}
