//! clickhouse-backup HTTP API adapter
//!
//! Talks to the REST API exposed by `clickhouse-backup server`:
//!
//! - `POST /backup/create?name=<name>`
//! - `GET  /backup/status?name=<name>` (newline-delimited JSON, one record per command)
//! - `POST /backup/upload/<name>?name=<name>`

use super::{BackupStatus, BackupTarget, TargetError, TargetSettings};
use crate::config::ConfigError;
use crate::utils::context::RunContext;
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use tracing::debug;

/// Registry identifier for this adapter
pub const KIND: &str = "clickhouse";

const CREATE_PATH: &[&str] = &["backup", "create"];
const STATUS_PATH: &[&str] = &["backup", "status"];

/// One line of the `/backup/status` response
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StatusRecord {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub finish: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Adapter for the clickhouse-backup API
pub struct ClickhouseTarget {
    base: Url,
    client: Client,
}

impl ClickhouseTarget {
    /// Create a new adapter for the API at `settings.endpoint`
    pub fn new(settings: &TargetSettings) -> Result<Self, ConfigError> {
        if settings.endpoint.cannot_be_a_base() {
            return Err(ConfigError::InvalidEndpoint(format!(
                "{} cannot be used as a base URL",
                settings.endpoint
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("backup-scheduler/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| {
                ConfigError::ValidationError(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base: settings.endpoint.clone(),
            client,
        })
    }

    /// Registry constructor
    pub fn boxed(settings: &TargetSettings) -> Result<Box<dyn BackupTarget>, ConfigError> {
        Ok(Box::new(Self::new(settings)?))
    }

    /// Build an endpoint URL by appending `segments` to the base path
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base can always hold path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Make a request against the API, failing on anything other than 200
    /// `operation` names the request for errors and logs, e.g. "backup creating"
    fn request(
        &self,
        ctx: &RunContext,
        method: Method,
        url: Url,
        operation: &'static str,
        name: &str,
    ) -> Result<Response, TargetError> {
        if ctx.is_cancelled() {
            return Err(TargetError::Cancelled { operation });
        }

        let mut request = self.client.request(method, url).query(&[("name", name)]);
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }

        let response = request.send().map_err(|e| {
            if ctx.is_cancelled() {
                TargetError::Cancelled { operation }
            } else {
                TargetError::Transport {
                    operation,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().map_err(|e| TargetError::Decode {
                operation,
                message: format!("failed to read error body: {}", e),
            })?;

            return Err(TargetError::Http {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        debug!("clickhouse {} request success", operation);

        Ok(response)
    }
}

impl BackupTarget for ClickhouseTarget {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn create(&self, ctx: &RunContext, name: &str) -> Result<(), TargetError> {
        let url = self.endpoint(CREATE_PATH);
        self.request(ctx, Method::POST, url, "backup creating", name)?;
        Ok(())
    }

    fn status(&self, ctx: &RunContext, name: &str) -> Result<BackupStatus, TargetError> {
        let url = self.endpoint(STATUS_PATH);
        let response = self.request(ctx, Method::GET, url, "backups status", name)?;

        latest_status(status_records(BufReader::new(response)), name)
    }

    fn upload(&self, ctx: &RunContext, name: &str) -> Result<(), TargetError> {
        let url = self.endpoint(&["backup", "upload", name]);

        self.request(ctx, Method::POST, url, "backup uploading", name)?;
        Ok(())
    }
}

/// Lazily decode a newline-delimited JSON status body, skipping blank lines
pub fn status_records<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<StatusRecord, TargetError>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(
            serde_json::from_str::<StatusRecord>(&line).map_err(|e| TargetError::Decode {
                operation: "backups status",
                message: format!("failed to unmarshal status record: {}", e),
            }),
        ),
        Err(e) => Some(Err(TargetError::Decode {
            operation: "backups status",
            message: format!("failed to read response body: {}", e),
        })),
    })
}

/// Status of the last `create <name>` record
///
/// Returns `TargetError::NotFound` when no record matches or the matching
/// record carries an empty status.
pub fn latest_status<I>(records: I, name: &str) -> Result<BackupStatus, TargetError>
where
    I: IntoIterator<Item = Result<StatusRecord, TargetError>>,
{
    let command = format!("create {}", name);
    let mut status = None;

    for record in records {
        let record = record?;
        if record.command == command {
            status = Some(record.status);
        }
    }

    match status {
        Some(status) if !status.is_empty() => Ok(BackupStatus::new(status)),
        _ => Err(TargetError::NotFound {
            name: name.to_string(),
        }),
    }
}
