// Library root
// -----------
// This crate exposes the building blocks of the symptom-checker chat. The
// binary (`main.rs`) wires them to the terminal and the HTTP API.
//
// Module responsibilities:
// - `model`: patient, evidence, question and result types.
// - `extract`: keyword/number extraction from free-text answers.
// - `prompt`: console abstraction and the re-ask-until-valid helpers.
// - `service`: the interface the interview needs from the diagnostic API.
// - `api`: blocking HTTP implementation of that interface.
// - `interview`: complaint collection and the question/answer loop.
// - `summary`: final report formatting.
// - `config`: credential resolution.
// - `ui`: the top-level chat flow and interactive credential prompt.
pub mod api;
pub mod config;
pub mod extract;
pub mod interview;
pub mod model;
pub mod prompt;
pub mod service;
pub mod summary;
pub mod ui;
