// API client module: a small blocking HTTP client for the Infermedica
// diagnostic API. Calls are synchronous; the interview never has more than
// one request in flight.

use crate::config::Credentials;
use crate::model::{Age, Evidence, Patient, Sex, Triage};
use crate::service::{DiagnosisResponse, DiagnosticService, ParseResponse, Session};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.infermedica.com/v3";

/// Holds a reqwest blocking client, the base URL of the API and the
/// application credentials sent with every request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    show_progress: bool,
    dev_mode: bool,
}

#[derive(Serialize, Debug)]
pub struct ParseRequest<'a> {
    pub text: &'a str,
    pub age: Age,
    pub sex: Sex,
    pub context: &'a [String],
    pub include_tokens: bool,
}

#[derive(Serialize, Debug)]
pub struct DiagnosisExtras {
    pub disable_groups: bool,
}

#[derive(Serialize, Debug)]
pub struct DiagnosisRequest<'a> {
    pub sex: Sex,
    pub age: Age,
    pub evidence: &'a [Evidence],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<DiagnosisExtras>,
}

/// One entry of the `/concepts` listing.
#[derive(Deserialize, Debug)]
pub struct Concept {
    pub id: String,
    pub name: String,
}

impl ApiClient {
    /// Create an ApiClient whose base URL comes from `INFERMEDICA_API_URL`,
    /// falling back to the public v3 endpoint.
    pub fn from_env(credentials: Credentials) -> Result<Self> {
        let base_url =
            std::env::var("INFERMEDICA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(base_url, credentials)
    }

    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            show_progress: true,
            dev_mode: false,
        })
    }

    /// Toggle the spinner shown while waiting for the API.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Mark requests as development traffic so they are not billed.
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers identifying the application and the interview.
    pub fn headers(&self, session: &Session) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut insert = |name: &'static str, value: &str| -> Result<()> {
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {name}"))?;
            headers.insert(HeaderName::from_static(name), value);
            Ok(())
        };
        insert("app-id", &self.credentials.app_id)?;
        insert("app-key", &self.credentials.app_key)?;
        insert("interview-id", &session.case_id)?;
        if let Some(model) = &session.model {
            insert("model", model)?;
        }
        if self.dev_mode {
            insert("dev-mode", "true")?;
        }
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request, showing a spinner meanwhile, and decode the JSON
    /// reply. Failures are reported with the server response body.
    fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
        let spinner = self.show_progress.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
            spinner.set_message("Thinking...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        let res = req.send();
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let res: Response = res.with_context(|| format!("Failed to send {what} request"))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("{} failed: {} - {}", what, status, txt);
        }
        res.json().with_context(|| format!("Parsing {what} response json"))
    }
}

impl DiagnosticService for ApiClient {
    fn parse(
        &self,
        session: &Session,
        patient: &Patient,
        text: &str,
        context: &[String],
    ) -> Result<ParseResponse> {
        let body = ParseRequest {
            text,
            age: patient.age,
            sex: patient.sex,
            context,
            include_tokens: true,
        };
        debug!(case_id = %session.case_id, context = context.len(), "POST /parse");
        let req = self.client.post(self.url("parse")).headers(self.headers(session)?).json(&body);
        self.send("parse", req)
    }

    fn diagnosis(
        &self,
        session: &Session,
        patient: &Patient,
        evidence: &[Evidence],
    ) -> Result<DiagnosisResponse> {
        let body = DiagnosisRequest {
            sex: patient.sex,
            age: patient.age,
            evidence,
            extras: Some(DiagnosisExtras { disable_groups: true }),
        };
        debug!(case_id = %session.case_id, evidence = evidence.len(), "POST /diagnosis");
        let req = self
            .client
            .post(self.url("diagnosis"))
            .headers(self.headers(session)?)
            .json(&body);
        self.send("diagnosis", req)
    }

    fn triage(
        &self,
        session: &Session,
        patient: &Patient,
        evidence: &[Evidence],
    ) -> Result<Triage> {
        let body = DiagnosisRequest {
            sex: patient.sex,
            age: patient.age,
            evidence,
            extras: None,
        };
        debug!(case_id = %session.case_id, evidence = evidence.len(), "POST /triage");
        let req = self.client.post(self.url("triage")).headers(self.headers(session)?).json(&body);
        self.send("triage", req)
    }

    fn concept_names(
        &self,
        session: &Session,
        patient: &Patient,
    ) -> Result<HashMap<String, String>> {
        debug!(case_id = %session.case_id, "GET /concepts");
        let age = patient.age.years().to_string();
        let req = self
            .client
            .get(self.url("concepts"))
            .headers(self.headers(session)?)
            .query(&[("age.value", age.as_str())]);
        let concepts: Vec<Concept> = self.send("concepts", req)?;
        Ok(concepts.into_iter().map(|c| (c.id, c.name)).collect())
    }
}
