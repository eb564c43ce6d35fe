// Plain-text reports printed once the interview is over.

use crate::model::{Condition, Decision, Evidence, Mention, Triage};
use std::collections::HashMap;
use std::fmt::Write;

/// `+Headache`, `-Fever`, `?Cough`.
pub fn mention_as_text(choice: Decision, name: &str) -> String {
    format!("{}{}", choice.symbol(), name)
}

/// The line printed after each understood complaint.
pub fn noting_line(mentions: &[Mention]) -> String {
    let noted: Vec<String> = mentions
        .iter()
        .map(|m| mention_as_text(m.choice_id, &m.name))
        .collect();
    format!("Noting: {}", noted.join(", "))
}

fn evidence_name<'a>(piece: &'a Evidence, naming: &'a HashMap<String, String>) -> &'a str {
    piece
        .name
        .as_deref()
        .or_else(|| naming.get(&piece.id).map(String::as_str))
        .unwrap_or(&piece.id)
}

fn summarise_some_evidence(
    out: &mut String,
    evidence: &[&Evidence],
    naming: &HashMap<String, String>,
    header: &str,
) {
    let _ = writeln!(out, "{header}:");
    for (idx, piece) in evidence.iter().enumerate() {
        let text = mention_as_text(piece.choice_id, evidence_name(piece, naming));
        let _ = writeln!(out, "{:2}. {}", idx + 1, text);
    }
    out.push('\n');
}

/// Reported complaints first, then answers to questions.
pub fn summarise_all_evidence(evidence: &[Evidence], naming: &HashMap<String, String>) -> String {
    let (reported, answered): (Vec<&Evidence>, Vec<&Evidence>) =
        evidence.iter().partition(|e| e.initial);
    let mut out = String::new();
    summarise_some_evidence(&mut out, &reported, naming, "Patient complaints");
    summarise_some_evidence(&mut out, &answered, naming, "Patient answers");
    out
}

pub fn summarise_diagnoses(diagnoses: &[Condition]) -> String {
    let mut out = String::from("Diagnoses:\n");
    for (idx, diag) in diagnoses.iter().enumerate() {
        let _ = writeln!(out, "{:2}. {:.2} {}", idx + 1, diag.probability, diag.name);
    }
    out.push('\n');
    out
}

pub fn summarise_triage(triage: &Triage) -> String {
    let mut out = format!("Triage level: {}\n", triage.triage_level);
    if let Some(applicable) = triage.teleconsultation_applicable {
        let _ = writeln!(out, "Teleconsultation applicable: {applicable}");
    }
    out.push('\n');
    out
}
