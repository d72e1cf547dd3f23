//! Sign-in and directory audit logs.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::graph::{quote, GraphClient, ODataQuery, MAX_PAGE_SIZE};
use crate::types::{DirectoryAudit, GraphSignIn, SignIn};

pub const DEFAULT_SIGN_IN_DAYS: i64 = 7;
pub const DEFAULT_AUDIT_DAYS: i64 = 30;

/// Graph keeps sign-in and audit records for at most this many days.
pub const MAX_RETENTION_DAYS: i64 = 365;

/// Inclusive `[now - days, now]` window rendered as OData timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: String,
    pub end: String,
}

impl Window {
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Result<Self> {
        if !(1..=MAX_RETENTION_DAYS).contains(&days) {
            return Err(Error::validation(format!(
                "days must be between 1 and {}",
                MAX_RETENTION_DAYS
            )));
        }
        let start = end - Duration::days(days);
        Ok(Self {
            start: start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end: end.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    fn filter(&self, field: &str) -> String {
        format!("{field} ge {} and {field} le {}", self.start, self.end)
    }
}

pub struct LogService {
    client: Arc<GraphClient>,
}

impl LogService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    /// Sign-ins by the user within the last `days` days, newest first.
    #[instrument(skip(self))]
    pub async fn get_user_sign_ins(&self, user_id: &str, days: i64) -> Result<Vec<SignIn>> {
        let window = Window::ending_at(Utc::now(), days)?;
        let filter = format!(
            "{} and userId eq {}",
            window.filter("createdDateTime"),
            quote(user_id)
        );
        info!("Fetching sign-ins from {} to {}", window.start, window.end);

        let odata = ODataQuery::new()
            .filter(filter)
            .orderby("createdDateTime desc")
            .top(MAX_PAGE_SIZE)
            .eventual_consistency();
        let raw: Vec<GraphSignIn> = self
            .client
            .list("auditLogs/signIns", &odata, None)
            .await?;

        info!("Found {} sign-in record(s)", raw.len());
        Ok(raw.into_iter().map(SignIn::from).collect())
    }

    /// Directory audit events initiated by the user within the last `days` days.
    #[instrument(skip(self))]
    pub async fn get_user_audit_logs(&self, user_id: &str, days: i64) -> Result<Vec<DirectoryAudit>> {
        let window = Window::ending_at(Utc::now(), days)?;
        let filter = format!(
            "initiatedBy/user/id eq {} and {}",
            quote(user_id),
            window.filter("activityDateTime")
        );

        let odata = ODataQuery::new()
            .filter(filter)
            .orderby("activityDateTime desc")
            .top(MAX_PAGE_SIZE)
            .eventual_consistency();
        let audits: Vec<DirectoryAudit> = self
            .client
            .list("auditLogs/directoryAudits", &odata, None)
            .await?;

        info!("Found {} audit record(s)", audits.len());
        Ok(audits)
    }
}
