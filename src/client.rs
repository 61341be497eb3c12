//! Blocking Jira Cloud REST client implementing [`IssueTracker`].
//!
//! Responses are decoded into typed payloads here; anything that does not
//! fit becomes `Error::MalformedResponse` before it reaches the core.

use chrono::{DateTime, Local, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::RemoteSettings;
use crate::error::{Error, Result};
use crate::models::{RawTransition, RecentIssue, StatusInfo};
use crate::tracker::IssueTracker;

/// Issues assigned to the caller that are still open, or were closed in the
/// last week, leaving out parked work.
pub const RECENT_ISSUES_JQL: &str = "assignee = currentUser() AND (status != Closed OR updated >= -7d) AND status NOT IN (Deferred, \"On Hold\") ORDER BY updated DESC";

const WORKLOG_STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[derive(Debug, Clone)]
enum Auth {
    Basic { email: String, token: String },
    Bearer(String),
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    client: Client,
    auth: Auth,
}

// ==================== Payloads ====================

#[derive(Debug, Default, Deserialize)]
struct CategoryPayload {
    #[serde(default)]
    key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPayload {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status_category: Option<CategoryPayload>,
}

impl StatusPayload {
    fn into_status(self, context: &str) -> Result<StatusInfo> {
        if self.id.is_empty() {
            return Err(Error::MalformedResponse(format!("no status id in {}", context)));
        }
        Ok(StatusInfo {
            id: self.id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            category: self.status_category.map(|c| c.key).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IssueStatusPayload {
    #[serde(default)]
    fields: IssueStatusFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueStatusFields {
    #[serde(default)]
    status: Option<StatusPayload>,
}

#[derive(Debug, Deserialize)]
struct TransitionsPayload {
    #[serde(default)]
    transitions: Vec<TransitionPayload>,
}

#[derive(Debug, Deserialize)]
struct TransitionPayload {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    to: StatusPayload,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(default)]
    fields: SummaryFields,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryFields {
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    issues: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
struct SearchIssue {
    key: String,
    #[serde(default)]
    fields: SearchFields,
}

#[derive(Debug, Default, Deserialize)]
struct SearchFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    status: Option<NamedPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct NamedPayload {
    #[serde(default)]
    name: String,
}

/// Jira's error body: general messages plus per-field errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteErrors {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl RemoteErrors {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The first general message, else the first field error as
    /// `field - message`.
    pub fn first_message(&self) -> Option<String> {
        if let Some(msg) = self.error_messages.first() {
            return Some(msg.clone());
        }
        self.errors
            .iter()
            .next()
            .map(|(field, msg)| format!("{} - {}", field, msg))
    }
}

// ==================== Decoding ====================

fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::MalformedResponse(format!("{}: {}", context, e)))
}

pub fn decode_status(body: &str) -> Result<StatusInfo> {
    let payload: IssueStatusPayload = decode(body, "issue status")?;
    payload
        .fields
        .status
        .unwrap_or_default()
        .into_status("issue status")
}

pub fn decode_transitions(body: &str) -> Result<Vec<RawTransition>> {
    let payload: TransitionsPayload = decode(body, "transitions")?;
    payload
        .transitions
        .into_iter()
        .map(|t| {
            Ok(RawTransition {
                target: t.to.into_status(&format!("transition {}", t.id))?,
                id: t.id,
                name: t.name,
            })
        })
        .collect()
}

pub fn decode_summary(body: &str) -> Result<String> {
    let payload: SummaryPayload = decode(body, "issue summary")?;
    payload
        .fields
        .summary
        .ok_or_else(|| Error::MalformedResponse("no summary in issue".to_string()))
}

pub fn decode_recent_issues(body: &str) -> Result<Vec<RecentIssue>> {
    let payload: SearchPayload = decode(body, "issue search")?;
    Ok(payload
        .issues
        .into_iter()
        .map(|issue| RecentIssue {
            key: issue.key,
            summary: issue.fields.summary,
            status: issue.fields.status.map(|s| s.name).unwrap_or_default(),
        })
        .collect())
}

/// Worklog request body with the comment wrapped in a one-paragraph
/// Atlassian document.
pub fn worklog_body(time_spent: &str, comment: &str, started: DateTime<Utc>) -> Value {
    json!({
        "timeSpent": time_spent,
        "comment": {
            "type": "doc",
            "version": 1,
            "content": [
                {
                    "type": "paragraph",
                    "content": [
                        { "text": comment, "type": "text" }
                    ]
                }
            ]
        },
        "started": started.with_timezone(&Local).format(WORKLOG_STARTED_FORMAT).to_string(),
    })
}

// ==================== Client ====================

impl JiraClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        let auth = match &settings.email {
            Some(email) => Auth::Basic {
                email: email.clone(),
                token: settings.api_token.clone(),
            },
            None => Auth::Bearer(settings.api_token.clone()),
        };

        Ok(JiraClient {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
            auth,
        })
    }

    /// URL for a REST path under the base URL. Each segment is
    /// percent-encoded, so an issue key can never reach another endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let invalid = || Error::Config(format!("Invalid Jira base URL: {}", self.base_url));

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn issue_endpoint(&self, issue_key: &str, tail: Option<&str>) -> Result<Url> {
        let mut segments = vec!["rest", "api", "3", "issue", issue_key];
        segments.extend(tail);
        self.endpoint(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Jira request");

        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.auth {
            Auth::Basic { email, token } => builder.basic_auth(email, Some(token)),
            Auth::Bearer(token) => builder.bearer_auth(token),
        }
    }

    /// Send and read the body, mapping HTTP failures onto the error kinds.
    fn send(&self, builder: RequestBuilder) -> Result<String> {
        let response: Response = builder.send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(%status, bytes = body.len(), "Jira response");

        if status.is_success() {
            return Ok(body);
        }

        let message = RemoteErrors::parse(&body)
            .and_then(|e| e.first_message())
            .unwrap_or_else(|| format!("HTTP {}", status));

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(Error::Unavailable(message))
        } else {
            Err(Error::Rejected(message))
        }
    }

    fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<String> {
        self.send(self.request(Method::GET, url).query(query))
    }

    /// POST a JSON body. A successful status can still carry error messages
    /// in the body, which count as a rejection.
    fn post(&self, url: Url, body: &Value) -> Result<()> {
        let response = self.send(self.request(Method::POST, url).json(body))?;
        if response.trim().is_empty() {
            return Ok(());
        }
        if let Some(msg) = RemoteErrors::parse(&response).and_then(|e| e.first_message()) {
            return Err(Error::Rejected(msg));
        }
        Ok(())
    }
}

impl IssueTracker for JiraClient {
    fn fetch_status(&self, issue_key: &str) -> Result<StatusInfo> {
        let body = self.get(self.issue_endpoint(issue_key, None)?, &[("fields", "status")])?;
        decode_status(&body).inspect_err(|e| {
            warn!(issue = issue_key, error = %e, "Could not decode issue status");
        })
    }

    fn fetch_transitions(&self, issue_key: &str) -> Result<Vec<RawTransition>> {
        let body = self.get(self.issue_endpoint(issue_key, Some("transitions"))?, &[])?;
        decode_transitions(&body).inspect_err(|e| {
            warn!(issue = issue_key, error = %e, "Could not decode transitions");
        })
    }

    fn execute_transition(&self, issue_key: &str, transition_id: &str) -> Result<()> {
        let body = json!({ "transition": { "id": transition_id } });
        self.post(self.issue_endpoint(issue_key, Some("transitions"))?, &body)
    }

    fn submit_worklog(
        &self,
        issue_key: &str,
        time_spent: &str,
        comment: &str,
        started: DateTime<Utc>,
    ) -> Result<()> {
        let body = worklog_body(time_spent, comment, started);
        self.post(self.issue_endpoint(issue_key, Some("worklog"))?, &body)
    }

    fn fetch_summary(&self, issue_key: &str) -> Result<String> {
        let body = self.get(self.issue_endpoint(issue_key, None)?, &[("fields", "summary")])?;
        decode_summary(&body)
    }

    fn recent_issues(&self, max_results: usize) -> Result<Vec<RecentIssue>> {
        let max = max_results.to_string();
        let body = self.get(
            self.endpoint(&["rest", "api", "3", "search", "jql"])?,
            &[
                ("jql", RECENT_ISSUES_JQL),
                ("maxResults", max.as_str()),
                ("fields", "key,summary,status"),
            ],
        )?;
        decode_recent_issues(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;
    use std::time::Duration;

    fn settings(base_url: &str, email: Option<&str>) -> RemoteSettings {
        RemoteSettings {
            base_url: base_url.to_string(),
            api_token: "test-token".to_string(),
            email: email.map(str::to_string),
            timeout: Duration::from_secs(5),
        }
    }

    const STATUS_BODY: &str = r#"{
        "fields": {
            "status": {
                "id": "3",
                "name": "In Progress",
                "description": "Being worked on",
                "statusCategory": { "id": 4, "key": "indeterminate", "name": "In Progress" }
            }
        }
    }"#;

    const TRANSITIONS_BODY: &str = r#"{
        "transitions": [
            {
                "id": "11",
                "name": "To Do",
                "to": { "id": "1", "name": "To Do", "statusCategory": { "key": "new" } }
            },
            {
                "id": "31",
                "name": "Done",
                "to": { "id": "5", "name": "Done", "description": "", "statusCategory": { "key": "done" } }
            }
        ]
    }"#;

    // ==================== Decoding ====================

    #[test]
    fn test_decode_status() {
        let status = decode_status(STATUS_BODY).unwrap();
        assert_eq!(status.id, "3");
        assert_eq!(status.name, "In Progress");
        assert_eq!(status.description, "Being worked on");
        assert_eq!(status.category, "indeterminate");
    }

    #[test]
    fn test_decode_status_without_id_is_malformed() {
        let result = decode_status(r#"{"fields": {}}"#);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));

        let result = decode_status(r#"{"fields": {"status": {"name": "Open"}}}"#);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_decode_status_not_json() {
        assert!(matches!(
            decode_status("<html>Gateway timeout</html>"),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_decode_transitions() {
        let transitions = decode_transitions(TRANSITIONS_BODY).unwrap();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].id, "11");
        assert_eq!(transitions[0].target.category, "new");
        assert_eq!(transitions[1].target.name, "Done");
    }

    #[test]
    fn test_decode_transitions_rejects_partial_target() {
        let body = r#"{"transitions": [{"id": "11", "name": "Broken", "to": {"name": "Nowhere"}}]}"#;
        assert!(matches!(
            decode_transitions(body),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_decode_recent_issues() {
        let body = r#"{"issues": [
            {"key": "PROJ-1", "fields": {"summary": "Fix login", "status": {"name": "In Progress"}}},
            {"key": "PROJ-2", "fields": {"summary": "Write docs"}}
        ]}"#;
        let issues = decode_recent_issues(body).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].status, "In Progress");
        assert_eq!(issues[1].status, "");
    }

    #[test]
    fn test_remote_errors_prefer_general_messages() {
        let errors = RemoteErrors::parse(
            r#"{"errorMessages": ["Issue does not exist"], "errors": {"resolution": "required"}}"#,
        )
        .unwrap();
        assert_eq!(errors.first_message().as_deref(), Some("Issue does not exist"));
    }

    #[test]
    fn test_remote_errors_fall_back_to_field_errors() {
        let errors =
            RemoteErrors::parse(r#"{"errorMessages": [], "errors": {"timeSpent": "Invalid time duration"}}"#)
                .unwrap();
        assert_eq!(
            errors.first_message().as_deref(),
            Some("timeSpent - Invalid time duration")
        );
    }

    #[test]
    fn test_remote_errors_empty() {
        let errors = RemoteErrors::parse("{}").unwrap();
        assert_eq!(errors.first_message(), None);
    }

    #[test]
    fn test_worklog_body_shape() {
        let started = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let body = worklog_body("1h 30m", "Code review", started);

        assert_eq!(body["timeSpent"], "1h 30m");
        assert_eq!(body["comment"]["type"], "doc");
        assert_eq!(body["comment"]["content"][0]["type"], "paragraph");
        assert_eq!(body["comment"]["content"][0]["content"][0]["text"], "Code review");

        let started_text = body["started"].as_str().unwrap();
        let parsed = DateTime::parse_from_str(started_text, WORKLOG_STARTED_FORMAT).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), started);
    }

    // ==================== HTTP ====================

    #[test]
    fn test_fetch_status_uses_bearer_without_email() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/rest/api/3/issue/TEST-123")
            .match_query(Matcher::UrlEncoded("fields".into(), "status".into()))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(STATUS_BODY)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        let status = client.fetch_status("TEST-123").unwrap();

        mock.assert();
        assert_eq!(status.category, "indeterminate");
    }

    #[test]
    fn test_basic_auth_with_email() {
        let mut server = mockito::Server::new();
        // base64("dev@example.com:test-token")
        let mock = server
            .mock("GET", "/rest/api/3/issue/TEST-123/transitions")
            .match_header(
                "authorization",
                "Basic ZGV2QGV4YW1wbGUuY29tOnRlc3QtdG9rZW4=",
            )
            .with_status(200)
            .with_body(TRANSITIONS_BODY)
            .create();

        let client = JiraClient::new(&settings(&server.url(), Some("dev@example.com"))).unwrap();
        let transitions = client.fetch_transitions("TEST-123").unwrap();

        mock.assert();
        assert_eq!(transitions.len(), 2);
    }

    #[test]
    fn test_not_found_is_rejection_with_message() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/api/3/issue/INVALID-123")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"errorMessages": ["Issue does not exist or you do not have permission to see it."], "errors": {}}"#)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        let err = client.fetch_summary("INVALID-123").unwrap_err();
        assert!(err.is_rejection());
        assert!(err.to_string().contains("Issue does not exist"));
    }

    #[test]
    fn test_unauthorized_without_body() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/api/3/issue/TEST-123")
            .match_query(Matcher::Any)
            .with_status(401)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        let err = client.fetch_status("TEST-123").unwrap_err();
        assert!(err.is_rejection());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_server_error_is_unavailable() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/api/3/issue/TEST-123")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        let result = client.fetch_status("TEST-123");
        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[test]
    fn test_connection_refused_is_unavailable() {
        // Port 9 (discard) on localhost is almost never listening
        let client = JiraClient::new(&settings("http://127.0.0.1:9", None)).unwrap();
        let result = client.fetch_status("TEST-123");
        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[test]
    fn test_execute_transition_posts_id() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/api/3/issue/TEST-123/transitions")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"transition": {"id": "31"}})))
            .with_status(204)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        client.execute_transition("TEST-123", "31").unwrap();
        mock.assert();
    }

    #[test]
    fn test_execute_transition_field_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/rest/api/3/issue/TEST-123/transitions")
            .with_status(400)
            .with_body(r#"{"errorMessages": [], "errors": {"resolution": "Resolution is required."}}"#)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        let err = client.execute_transition("TEST-123", "31").unwrap_err();
        assert_eq!(err.to_string(), "resolution - Resolution is required.");
    }

    #[test]
    fn test_success_status_with_error_body_is_rejection() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/rest/api/3/issue/TEST-123/transitions")
            .with_status(200)
            .with_body(r#"{"errorMessages": ["Workflow is locked"]}"#)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        let err = client.execute_transition("TEST-123", "31").unwrap_err();
        assert_eq!(err.to_string(), "Workflow is locked");
    }

    #[test]
    fn test_submit_worklog() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/api/3/issue/TEST-123/worklog")
            .match_body(Matcher::PartialJson(json!({
                "timeSpent": "45m",
                "comment": {"type": "doc", "version": 1}
            })))
            .with_status(201)
            .with_body(r#"{"id": "10010", "timeSpent": "45m"}"#)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        client
            .submit_worklog("TEST-123", "45m", "Pairing", Utc::now())
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_recent_issues_sends_jql() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("jql".into(), RECENT_ISSUES_JQL.into()),
                Matcher::UrlEncoded("maxResults".into(), "20".into()),
                Matcher::UrlEncoded("fields".into(), "key,summary,status".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"issues": [{"key": "PROJ-1", "fields": {"summary": "Fix login", "status": {"name": "To Do"}}}]}"#)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        let issues = client.recent_issues(20).unwrap();

        mock.assert();
        assert_eq!(issues[0].key, "PROJ-1");
        assert_eq!(issues[0].summary, "Fix login");
    }

    #[test]
    fn test_fetch_summary() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/api/3/issue/TEST-123")
            .match_query(Matcher::UrlEncoded("fields".into(), "summary".into()))
            .with_status(200)
            .with_body(r#"{"key": "TEST-123", "fields": {"summary": "Test Issue"}}"#)
            .create();

        let client = JiraClient::new(&settings(&server.url(), None)).unwrap();
        assert_eq!(client.fetch_summary("TEST-123").unwrap(), "Test Issue");
    }

    #[test]
    fn test_issue_key_is_encoded_as_one_segment() {
        let client = JiraClient::new(&settings("https://example.atlassian.net", None)).unwrap();
        let url = client.issue_endpoint("A/B?c#d", Some("worklog")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.atlassian.net/rest/api/3/issue/A%2FB%3Fc%23d/worklog"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = JiraClient::new(&settings("https://jira.example.com/jira", None)).unwrap();
        let url = client.endpoint(&["rest", "api", "3", "search", "jql"]).unwrap();
        assert_eq!(url.as_str(), "https://jira.example.com/jira/rest/api/3/search/jql");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let client = JiraClient::new(&settings("not a url", None)).unwrap();
        let err = client.fetch_status("TEST-123").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
