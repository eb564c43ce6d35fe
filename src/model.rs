// Domain types shared by the extractor, the interview loops and the API
// client. Field names follow the diagnostic service's JSON so most types
// derive serde directly.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Youngest patient the diagnostic service accepts.
pub const MIN_AGE: u16 = 18;
/// Oldest patient the diagnostic service accepts.
pub const MAX_AGE: u16 = 130;

/// Normalized value of a yes/no style answer. Also used as the evidence
/// `choice_id`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Present,
    Absent,
    Unknown,
}

impl Decision {
    /// One-character marker used when listing evidence.
    pub fn symbol(self) -> char {
        match self {
            Decision::Present => '+',
            Decision::Absent => '-',
            Decision::Unknown => '?',
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("male"),
            Sex::Female => f.write_str("female"),
        }
    }
}

/// Patient age in years, always within `[MIN_AGE, MAX_AGE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Age(u16);

impl Age {
    /// Returns `None` when `years` is outside the supported range.
    pub fn new(years: u64) -> Option<Age> {
        let years = u16::try_from(years).ok()?;
        (MIN_AGE..=MAX_AGE).contains(&years).then_some(Age(years))
    }

    pub fn years(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The service expects `{"value": 45, "unit": "year"}`.
impl Serialize for Age {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire {
            value: u16,
            unit: &'static str,
        }
        Wire { value: self.0, unit: "year" }.serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patient {
    pub age: Age,
    pub sex: Sex,
}

/// One observation about the patient. `initial` marks evidence that came
/// from the free-text complaints rather than from a question answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub id: String,
    pub choice_id: Decision,
    pub initial: bool,
    /// Display name, when the service told us one. Never sent back.
    pub name: Option<String>,
}

impl Serialize for Evidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            id: &'a str,
            choice_id: Decision,
            #[serde(skip_serializing_if = "Option::is_none")]
            source: Option<&'static str>,
        }
        Wire {
            id: &self.id,
            choice_id: self.choice_id,
            source: self.initial.then_some("initial"),
        }
        .serialize(serializer)
    }
}

/// A symptom recognised by the free-text parser.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub id: String,
    pub name: String,
    pub choice_id: Decision,
}

impl Mention {
    pub fn to_evidence(&self) -> Evidence {
        Evidence {
            id: self.id.clone(),
            choice_id: self.choice_id,
            initial: true,
            name: Some(self.name.clone()),
        }
    }
}

/// Turn parsed complaints into the initial evidence of an interview.
pub fn mentions_to_evidence(mentions: &[Mention]) -> Vec<Evidence> {
    mentions.iter().map(Mention::to_evidence).collect()
}

/// Ids of the mentions reported as present, in reporting order.
pub fn context_from_mentions(mentions: &[Mention]) -> Vec<String> {
    mentions
        .iter()
        .filter(|m| m.choice_id == Decision::Present)
        .map(|m| m.id.clone())
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionItem {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// `single`, `group_single` or `group_multiple`. Only `single` is
    /// supported by the interview.
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub items: Vec<QuestionItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Condition {
    pub id: String,
    pub name: String,
    pub probability: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Triage {
    pub triage_level: String,
    #[serde(default)]
    pub teleconsultation_applicable: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn age_bounds_are_inclusive() {
        assert!(Age::new(17).is_none());
        assert_eq!(Age::new(18).map(Age::years), Some(18));
        assert_eq!(Age::new(130).map(Age::years), Some(130));
        assert!(Age::new(131).is_none());
        assert!(Age::new(u64::MAX).is_none());
    }

    #[test]
    fn evidence_wire_format_marks_initial_source() {
        let initial = Evidence {
            id: "s_21".into(),
            choice_id: Decision::Present,
            initial: true,
            name: Some("Headache".into()),
        };
        let answered = Evidence {
            initial: false,
            choice_id: Decision::Absent,
            ..initial.clone()
        };
        assert_eq!(
            serde_json::to_value(&initial).unwrap(),
            json!({"id": "s_21", "choice_id": "present", "source": "initial"})
        );
        assert_eq!(
            serde_json::to_value(&answered).unwrap(),
            json!({"id": "s_21", "choice_id": "absent"})
        );
    }

    #[test]
    fn context_keeps_only_present_mentions_in_order() {
        let mention = |id: &str, choice_id| Mention {
            id: id.into(),
            name: id.into(),
            choice_id,
        };
        let mentions = vec![
            mention("s_1", Decision::Present),
            mention("s_2", Decision::Absent),
            mention("s_3", Decision::Present),
        ];
        assert_eq!(context_from_mentions(&mentions), vec!["s_1", "s_3"]);
        assert!(mentions_to_evidence(&mentions).iter().all(|e| e.initial));
    }

    #[test]
    fn age_serialises_with_unit() {
        let age = Age::new(45).unwrap();
        assert_eq!(serde_json::to_value(age).unwrap(), json!({"value": 45, "unit": "year"}));
    }
}
