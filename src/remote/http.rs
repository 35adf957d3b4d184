use super::wire::{self, ACTION_GET_ALL, ACTION_GET_STUDENTS, ACTION_TEST, Envelope};
use super::{AttendanceService, ConnectionStatus, Connectivity, Dispatch};
use crate::errors::{AppError, AppResult};
use crate::models::{AttendanceEvent, EventFilter, Student};
use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// reqwest-backed gateway to the spreadsheet web-app.
pub struct HttpGateway {
    endpoint: Option<String>,
    offset: FixedOffset,
    request_timeout: Duration,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(endpoint: Option<String>, offset: FixedOffset, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: endpoint
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            offset,
            request_timeout,
            client,
        }
    }

    /// Reject anything that is not an absolute http(s) URL.
    pub fn validate_endpoint(url: &str) -> AppResult<reqwest::Url> {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| AppError::InvalidEndpoint(format!("{url}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
            _ => Err(AppError::InvalidEndpoint(url.to_string())),
        }
    }

    fn base(&self) -> AppResult<&str> {
        self.endpoint.as_deref().ok_or(AppError::RemoteNotConfigured)
    }

    /// GET `?action=<action>` and decode the envelope rows.
    async fn read_action(&self, action: &str) -> AppResult<Vec<serde_json::Value>> {
        let base = self.base()?;
        let resp = self
            .client
            .get(base)
            .query(&[("action", action)])
            .send()
            .await?
            .error_for_status()?;
        let body = resp.text().await?;
        Envelope::parse(&body)?.into_rows()
    }
}

#[async_trait]
impl AttendanceService for HttpGateway {
    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    #[instrument(skip(self, event), fields(id = %event.id, student = %event.student_id))]
    async fn submit(&self, event: &AttendanceEvent) -> AppResult<Dispatch> {
        let base = self.base()?;
        // The body of this answer is deliberately ignored.
        self.client
            .post(base)
            .form(&wire::submit_form(event))
            .send()
            .await?;
        debug!("submit dispatched");
        Ok(Dispatch::now())
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self, filter: &EventFilter) -> AppResult<Vec<AttendanceEvent>> {
        let rows = self.read_action(ACTION_GET_ALL).await?;
        let events: Vec<AttendanceEvent> = wire::expand_rows(&rows, &self.offset)
            .into_iter()
            .filter(|ev| filter.matches(ev, &self.offset))
            .collect();
        debug!(rows = rows.len(), events = events.len(), "remote attendance fetched");
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn fetch_students(&self) -> AppResult<Vec<Student>> {
        let rows = self.read_action(ACTION_GET_STUDENTS).await?;
        Ok(wire::parse_students(&rows))
    }

    async fn probe(&self, timeout: Duration) -> ConnectionStatus {
        let Some(base) = self.endpoint.as_deref() else {
            return ConnectionStatus::new(Connectivity::NotConfigured);
        };
        let millis = Utc::now().timestamp_millis().to_string();
        let request = self
            .client
            .get(base)
            .query(&[("action", ACTION_TEST), ("timestamp", millis.as_str())])
            .send();

        let state = match tokio::time::timeout(timeout, request).await {
            Ok(Ok(_)) => Connectivity::Reachable,
            Ok(Err(e)) if e.is_timeout() => Connectivity::TimedOut,
            Ok(Err(e)) => {
                warn!(error = %e, "connectivity probe failed");
                Connectivity::Unreachable
            }
            Err(_) => Connectivity::TimedOut,
        };
        ConnectionStatus::new(state)
    }

    #[instrument(skip(self))]
    async fn trigger(&self, action: &str) -> AppResult<Dispatch> {
        let base = self.base()?;
        let now = Utc::now().to_rfc3339();
        self.client
            .get(base)
            .query(&[
                ("action", action),
                ("timestamp", now.as_str()),
                ("trigger_source", "web_interface"),
            ])
            .send()
            .await?;
        Ok(Dispatch::now())
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("endpoint", &self.endpoint)
            .field("offset", &self.offset)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
