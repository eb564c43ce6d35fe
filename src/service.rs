// The narrow interface the interview needs from the diagnostic service.
// `api::ApiClient` implements it over HTTP; tests use in-memory fakes.

use crate::model::{Condition, Decision, Evidence, Mention, Patient, Question, QuestionItem, Triage};
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-run settings threaded through every call to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Sent as `Interview-Id` so the service can group our calls.
    pub case_id: String,
    /// Non-standard model/language, e.g. `infermedica-es`.
    pub model: Option<String>,
}

impl Session {
    pub fn new(model: Option<String>) -> Self {
        Session {
            case_id: Uuid::new_v4().simple().to_string(),
            model,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResponse {
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DiagnosisResponse {
    #[serde(default)]
    pub question: Option<Question>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub should_stop: bool,
}

pub trait DiagnosticService {
    /// Recognise symptoms in free text. `context` holds ids of symptoms
    /// already reported as present, in reporting order.
    fn parse(
        &self,
        session: &Session,
        patient: &Patient,
        text: &str,
        context: &[String],
    ) -> Result<ParseResponse>;

    /// Next question, current conditions and whether to stop asking.
    fn diagnosis(
        &self,
        session: &Session,
        patient: &Patient,
        evidence: &[Evidence],
    ) -> Result<DiagnosisResponse>;

    fn triage(&self, session: &Session, patient: &Patient, evidence: &[Evidence]) -> Result<Triage>;

    /// Display names of the concepts the service knows, keyed by id.
    fn concept_names(
        &self,
        session: &Session,
        patient: &Patient,
    ) -> Result<HashMap<String, String>>;

    /// Evidence recorded for an answered question item.
    fn question_item_to_evidence(&self, item: &QuestionItem, decision: Decision) -> Vec<Evidence> {
        vec![Evidence {
            id: item.id.clone(),
            choice_id: decision,
            initial: false,
            name: Some(item.name.clone()),
        }]
    }
}
