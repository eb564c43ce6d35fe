use anyhow::Result;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use symptom_chat::interview::{
    conduct_interview, read_complaints, Interview, InterviewError, InterviewState,
};
use symptom_chat::model::{
    Age, Condition, Decision, Evidence, Mention, Patient, Question, QuestionItem, Sex, Triage,
};
use symptom_chat::prompt::ScriptedConsole;
use symptom_chat::service::{DiagnosisResponse, DiagnosticService, ParseResponse, Session};
use symptom_chat::ui::run_chat;

/// Replays canned responses and records what the interview sent.
#[derive(Default)]
struct FakeService {
    parses: RefCell<VecDeque<ParseResponse>>,
    diagnoses: RefCell<VecDeque<DiagnosisResponse>>,
    parse_contexts: RefCell<Vec<Vec<String>>>,
    diagnosis_evidence: RefCell<Vec<Vec<Evidence>>>,
    triage_calls: RefCell<usize>,
}

impl FakeService {
    fn with_diagnoses(diagnoses: Vec<DiagnosisResponse>) -> Self {
        FakeService {
            diagnoses: RefCell::new(diagnoses.into()),
            ..Default::default()
        }
    }
}

impl DiagnosticService for FakeService {
    fn parse(
        &self,
        _session: &Session,
        _patient: &Patient,
        _text: &str,
        context: &[String],
    ) -> Result<ParseResponse> {
        self.parse_contexts.borrow_mut().push(context.to_vec());
        Ok(self.parses.borrow_mut().pop_front().unwrap_or_default())
    }

    fn diagnosis(
        &self,
        _session: &Session,
        _patient: &Patient,
        evidence: &[Evidence],
    ) -> Result<DiagnosisResponse> {
        self.diagnosis_evidence.borrow_mut().push(evidence.to_vec());
        self.diagnoses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("diagnosis called too often"))
    }

    fn triage(
        &self,
        _session: &Session,
        _patient: &Patient,
        _evidence: &[Evidence],
    ) -> Result<Triage> {
        *self.triage_calls.borrow_mut() += 1;
        Ok(Triage {
            triage_level: "consultation".into(),
            teleconsultation_applicable: Some(true),
        })
    }

    fn concept_names(
        &self,
        _session: &Session,
        _patient: &Patient,
    ) -> Result<HashMap<String, String>> {
        Ok(HashMap::from([("s_2".to_string(), "Cough".to_string())]))
    }
}

fn patient() -> Patient {
    Patient {
        age: Age::new(42).unwrap(),
        sex: Sex::Male,
    }
}

fn session() -> Session {
    Session {
        case_id: "case-1".into(),
        model: None,
    }
}

fn single(id: &str, text: &str) -> Question {
    Question {
        kind: "single".into(),
        text: text.into(),
        items: vec![QuestionItem {
            id: id.into(),
            name: id.into(),
        }],
    }
}

fn ask(question: Question) -> DiagnosisResponse {
    DiagnosisResponse {
        question: Some(question),
        conditions: Vec::new(),
        should_stop: false,
    }
}

fn stop() -> DiagnosisResponse {
    DiagnosisResponse {
        question: None,
        conditions: vec![Condition {
            id: "c_1".into(),
            name: "Common cold".into(),
            probability: 0.71,
        }],
        should_stop: true,
    }
}

fn mention(id: &str, name: &str, choice_id: Decision) -> Mention {
    Mention {
        id: id.into(),
        name: name.into(),
        choice_id,
    }
}

fn initial_evidence() -> Vec<Evidence> {
    vec![Evidence {
        id: "s_1".into(),
        choice_id: Decision::Present,
        initial: true,
        name: Some("Headache".into()),
    }]
}

#[test]
fn interview_appends_answers_until_service_stops() {
    let service = FakeService::with_diagnoses(vec![
        ask(single("s_2", "Do you cough?")),
        ask(single("s_3", "Do you have a fever?")),
        stop(),
    ]);
    let mut console = ScriptedConsole::new(["yes", "no"]);

    let outcome =
        conduct_interview(&service, &mut console, &session(), patient(), initial_evidence())
            .unwrap();

    assert_eq!(service.diagnosis_evidence.borrow().len(), 3);
    assert_eq!(*service.triage_calls.borrow(), 1);
    let new: Vec<(&str, Decision, bool)> = outcome.evidence[1..]
        .iter()
        .map(|e| (e.id.as_str(), e.choice_id, e.initial))
        .collect();
    assert_eq!(new, vec![("s_2", Decision::Present, false), ("s_3", Decision::Absent, false)]);
    assert_eq!(outcome.evidence[0], initial_evidence()[0]);
    assert_eq!(outcome.diagnoses[0].name, "Common cold");
    assert_eq!(outcome.triage.triage_level, "consultation");
    assert_eq!(console.prompts, vec!["Do you cough?", "Do you have a fever?"]);
}

#[test]
fn every_call_sees_the_full_history() {
    let service = FakeService::with_diagnoses(vec![ask(single("s_2", "Cough?")), stop()]);
    let mut console = ScriptedConsole::new(["sure"]);
    conduct_interview(&service, &mut console, &session(), patient(), initial_evidence()).unwrap();

    let sent = service.diagnosis_evidence.borrow();
    assert_eq!(sent[0].len(), 1);
    assert_eq!(sent[1].len(), 2);
    assert_eq!(sent[1][..1], sent[0][..]);
}

#[test]
fn empty_answer_adds_nothing_and_keeps_going() {
    let service = FakeService::with_diagnoses(vec![
        ask(single("s_2", "Cough?")),
        ask(single("s_2", "Cough?")),
        stop(),
    ]);
    let mut console = ScriptedConsole::new(["", "don't know"]);
    let outcome =
        conduct_interview(&service, &mut console, &session(), patient(), initial_evidence())
            .unwrap();

    let sent = service.diagnosis_evidence.borrow();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].len(), 1);
    assert_eq!(outcome.evidence.len(), 2);
    assert_eq!(outcome.evidence[1].choice_id, Decision::Unknown);
}

#[test]
fn unparseable_answer_reasks_same_question_without_calling_service() {
    let service = FakeService::with_diagnoses(vec![ask(single("s_2", "Cough?")), stop()]);
    let mut console = ScriptedConsole::new(["hmm", "yes and no", "yup"]);
    let outcome = conduct_interview(&service, &mut console, &session(), patient(), Vec::new())
        .unwrap();

    assert_eq!(service.diagnosis_evidence.borrow().len(), 2);
    assert_eq!(console.prompts, vec!["Cough?"; 3]);
    assert_eq!(outcome.evidence.len(), 1);
    assert_eq!(outcome.evidence[0].choice_id, Decision::Present);
}

#[test]
fn unclear_answer_then_empty_line_adds_nothing() {
    let service = FakeService::with_diagnoses(vec![ask(single("s_2", "Cough?")), stop()]);
    let mut console = ScriptedConsole::new(["maybe", ""]);
    let outcome =
        conduct_interview(&service, &mut console, &session(), patient(), initial_evidence())
            .unwrap();

    assert_eq!(console.prompts, vec!["Cough?"; 2]);
    assert_eq!(outcome.evidence, initial_evidence());
    assert_eq!(service.diagnosis_evidence.borrow().len(), 2);
}

#[test]
fn stopped_interview_stays_stopped() {
    let service = FakeService::with_diagnoses(vec![stop(), stop()]);
    let mut console = ScriptedConsole::new(Vec::<String>::new());
    let session = session();
    let mut interview =
        Interview::new(&service, &mut console, &session, patient(), initial_evidence());

    let outcome = match interview.step().unwrap() {
        InterviewState::Stopped(outcome) => outcome.clone(),
        InterviewState::Asking => panic!("expected the interview to stop"),
    };
    assert_eq!(outcome.evidence, initial_evidence());

    let err = interview.step().unwrap_err();
    assert_eq!(err.downcast_ref::<InterviewError>(), Some(&InterviewError::AlreadyStopped));
    assert_eq!(interview.state(), &InterviewState::Stopped(outcome));
    drop(interview);

    assert_eq!(service.diagnosis_evidence.borrow().len(), 1);
    assert_eq!(*service.triage_calls.borrow(), 1);
}

#[test]
fn group_questions_are_rejected() {
    let mut question = single("s_2", "Which of these?");
    question.kind = "group_multiple".into();
    let service = FakeService::with_diagnoses(vec![ask(question)]);
    let mut console = ScriptedConsole::new(["yes"]);

    let err = conduct_interview(&service, &mut console, &session(), patient(), Vec::new())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<InterviewError>(),
        Some(&InterviewError::UnsupportedQuestionType("group_multiple".into()))
    );
    assert!(console.prompts.is_empty());
    assert_eq!(*service.triage_calls.borrow(), 0);
}

#[test]
fn single_question_with_many_items_is_inconsistent() {
    let mut question = single("s_2", "Cough?");
    question.items.push(question.items[0].clone());
    let service = FakeService::with_diagnoses(vec![ask(question)]);
    let mut console = ScriptedConsole::new(["yes"]);

    let err = conduct_interview(&service, &mut console, &session(), patient(), Vec::new())
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<InterviewError>(), Some(InterviewError::Inconsistent(_))));
}

#[test]
fn service_errors_propagate_unchanged() {
    let service = FakeService::default();
    let mut console = ScriptedConsole::new(Vec::<String>::new());
    let err = conduct_interview(&service, &mut console, &session(), patient(), Vec::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "diagnosis called too often");
}

#[test]
fn complaints_stop_on_empty_reply_after_a_mention() {
    let service = FakeService {
        parses: RefCell::new(
            vec![ParseResponse {
                mentions: vec![mention("s_1", "Headache", Decision::Present)],
            }]
            .into(),
        ),
        ..Default::default()
    };
    let mut console = ScriptedConsole::new(["I have a headache", ""]);
    let mentions = read_complaints(&service, &mut console, &session(), &patient()).unwrap();

    assert_eq!(mentions.len(), 1);
    assert_eq!(console.lines, vec!["Noting: +Headache"]);
    assert_eq!(console.remaining(), 0);
}

#[test]
fn complaints_keep_asking_while_nothing_collected() {
    let service = FakeService {
        parses: RefCell::new(
            vec![
                ParseResponse::default(),
                ParseResponse {
                    mentions: vec![
                        mention("s_1", "Headache", Decision::Present),
                        mention("s_2", "Cough", Decision::Absent),
                    ],
                },
                ParseResponse {
                    mentions: vec![mention("s_3", "Fever", Decision::Present)],
                },
            ]
            .into(),
        ),
        ..Default::default()
    };
    let mut console = ScriptedConsole::new(["", "", "blah", "headache, no cough", "fever", ""]);
    let mentions = read_complaints(&service, &mut console, &session(), &patient()).unwrap();

    assert_eq!(mentions.len(), 3);
    assert_eq!(console.prompts.len(), 6);
    assert_eq!(
        *service.parse_contexts.borrow(),
        vec![Vec::<String>::new(), Vec::new(), vec!["s_1".to_string()]]
    );
}

#[test]
fn full_chat_prints_summary() {
    let service = FakeService {
        parses: RefCell::new(
            vec![ParseResponse {
                mentions: vec![mention("s_1", "Headache", Decision::Present)],
            }]
            .into(),
        ),
        diagnoses: RefCell::new(vec![ask(single("s_2", "Do you cough?")), stop()].into()),
        ..Default::default()
    };
    let mut console = ScriptedConsole::new(["45", "woman", "my head hurts", "", "n"]);
    run_chat(&service, &mut console, &session()).unwrap();

    assert_eq!(console.lines[0], "Ok, 45 year old female.");
    let output = console.lines.join("\n");
    assert!(output.contains("Patient complaints:\n 1. +Headache"));
    assert!(output.contains("Patient answers:\n 1. -s_2"));
    assert!(output.contains("Diagnoses:\n 1. 0.71 Common cold"));
    assert!(output.contains("Triage level: consultation\nTeleconsultation applicable: true"));
}
