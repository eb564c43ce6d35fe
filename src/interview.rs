// Conversation flows that talk to the diagnostic service: collecting the
// initial complaints and the question/answer interview that follows.

use crate::extract::{extract_decision, ANSWER_NORM};
use crate::model::{
    context_from_mentions, Condition, Decision, Evidence, Mention, Patient, Question, Triage,
};
use crate::prompt::{ask_until, Console};
use crate::service::{DiagnosticService, Session};
use crate::summary::noting_line;
use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info};

/// Interview failures that re-asking cannot fix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterviewError {
    #[error("question type `{0}` is not supported")]
    UnsupportedQuestionType(String),

    #[error("inconsistent service response: {0}")]
    Inconsistent(String),

    #[error("the interview has already stopped")]
    AlreadyStopped,
}

/// Ask for free-text complaints until the user gives an empty reply after
/// at least one symptom has been understood.
pub fn read_complaints<S>(
    service: &S,
    console: &mut dyn Console,
    session: &Session,
    patient: &Patient,
) -> Result<Vec<Mention>>
where
    S: DiagnosticService + ?Sized,
{
    let mut mentions: Vec<Mention> = Vec::new();
    let mut context: Vec<String> = Vec::new();
    loop {
        let text = console.ask("Describe your complaints")?;
        if text.is_empty() {
            if !mentions.is_empty() {
                return Ok(mentions);
            }
            continue;
        }
        let portion = service.parse(session, patient, &text, &context)?.mentions;
        debug!(found = portion.len(), context = context.len(), "parsed complaint");
        if portion.is_empty() {
            console.say("I couldn't recognise any symptoms in that. Please rephrase.")?;
            continue;
        }
        console.say(&noting_line(&portion))?;
        context.extend(context_from_mentions(&portion));
        mentions.extend(portion);
    }
}

/// Everything learnt once the service decides to stop asking.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub evidence: Vec<Evidence>,
    pub diagnoses: Vec<Condition>,
    pub triage: Triage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterviewState {
    Asking,
    Stopped(Outcome),
}

/// Question/answer loop. The service alone decides when it ends; every
/// step re-sends the whole evidence history. Once stopped it stays stopped.
pub struct Interview<'a, S: ?Sized> {
    service: &'a S,
    console: &'a mut dyn Console,
    session: &'a Session,
    patient: Patient,
    evidence: Vec<Evidence>,
    state: InterviewState,
}

impl<'a, S: DiagnosticService + ?Sized> Interview<'a, S> {
    pub fn new(
        service: &'a S,
        console: &'a mut dyn Console,
        session: &'a Session,
        patient: Patient,
        evidence: Vec<Evidence>,
    ) -> Self {
        Interview {
            service,
            console,
            session,
            patient,
            evidence,
            state: InterviewState::Asking,
        }
    }

    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    /// One round trip to the service, plus one question to the user if the
    /// service wants to continue. Fails without calling the service once the
    /// interview has stopped.
    pub fn step(&mut self) -> Result<&InterviewState> {
        if let InterviewState::Stopped(_) = self.state {
            return Err(InterviewError::AlreadyStopped.into());
        }
        debug!(
            case_id = %self.session.case_id,
            evidence = self.evidence.len(),
            "requesting diagnosis"
        );
        let resp = self.service.diagnosis(self.session, &self.patient, &self.evidence)?;
        if resp.should_stop {
            let triage = self.service.triage(self.session, &self.patient, &self.evidence)?;
            info!(
                triage = %triage.triage_level,
                evidence = self.evidence.len(),
                "interview finished"
            );
            self.state = InterviewState::Stopped(Outcome {
                evidence: self.evidence.clone(),
                diagnoses: resp.conditions,
                triage,
            });
            return Ok(&self.state);
        }
        let question = resp.question.ok_or_else(|| {
            InterviewError::Inconsistent("no question and no stop signal".into())
        })?;
        let new_evidence = self.ask_question(&question)?;
        self.evidence.extend(new_evidence);
        Ok(&self.state)
    }

    fn ask_question(&mut self, question: &Question) -> Result<Vec<Evidence>> {
        if question.kind != "single" {
            return Err(InterviewError::UnsupportedQuestionType(question.kind.clone()).into());
        }
        let [item] = question.items.as_slice() else {
            return Err(InterviewError::Inconsistent(format!(
                "single question with {} items",
                question.items.len()
            ))
            .into());
        };
        let decision = read_single_question_answer(&mut *self.console, &question.text)?;
        Ok(match decision {
            Some(decision) => self.service.question_item_to_evidence(item, decision),
            None => Vec::new(),
        })
    }

    /// Step until the service says stop.
    pub fn run(mut self) -> Result<Outcome> {
        info!(
            case_id = %self.session.case_id,
            evidence = self.evidence.len(),
            "interview started"
        );
        loop {
            if let InterviewState::Stopped(outcome) = self.step()? {
                return Ok(outcome.clone());
            }
        }
    }
}

/// `None` when the user skips the question with an empty reply.
pub fn read_single_question_answer(
    console: &mut dyn Console,
    question_text: &str,
) -> Result<Option<Decision>> {
    ask_until(console, question_text, |answer| {
        if answer.is_empty() {
            Ok(None)
        } else {
            extract_decision(answer, ANSWER_NORM).map(Some)
        }
    })
}

/// Run the interview to completion starting from `evidence`.
pub fn conduct_interview<S>(
    service: &S,
    console: &mut dyn Console,
    session: &Session,
    patient: Patient,
    evidence: Vec<Evidence>,
) -> Result<Outcome>
where
    S: DiagnosticService + ?Sized,
{
    Interview::new(service, console, session, patient, evidence).run()
}
