// UI layer: the top-level chat flow plus the interactive credential prompt.
// The functions are small and synchronous to make the flow easy to follow.

use crate::config::{default_auth_path, persist_credentials, resolve_credentials, Credentials};
use crate::interview::{conduct_interview, read_complaints};
use crate::model::mentions_to_evidence;
use crate::prompt::{read_age_sex, Console};
use crate::service::{DiagnosticService, Session};
use crate::summary::{summarise_all_evidence, summarise_diagnoses, summarise_triage};
use anyhow::Result;
use dialoguer::{Confirm, Password};
use tracing::{info, warn};

/// Credentials from the command line or the default file, otherwise asked
/// for interactively. Interactively entered credentials may be remembered.
pub fn obtain_credentials(auth_or_path: Option<&str>) -> Result<Credentials> {
    let default_path = default_auth_path();
    match resolve_credentials(auth_or_path, &default_path) {
        Ok(creds) => Ok(creds),
        Err(e) if auth_or_path.is_some() => Err(e.into()),
        Err(_) => {
            // `Password` hides input in terminal, the key is a secret.
            let auth: String = Password::new()
                .with_prompt("Infermedica APP_ID:APP_KEY")
                .interact()?;
            let creds = Credentials::parse(&auth)?;
            let remember = Confirm::new()
                .with_prompt(format!("Remember credentials in {}?", default_path.display()))
                .default(false)
                .interact()?;
            if remember {
                if let Err(e) = persist_credentials(&creds, &default_path) {
                    warn!(error = %e, "could not store credentials");
                }
            }
            Ok(creds)
        }
    }
}

/// Whole conversation: demographics, complaints, interview, summary.
pub fn run_chat<S>(service: &S, console: &mut dyn Console, session: &Session) -> Result<()>
where
    S: DiagnosticService + ?Sized,
{
    info!(case_id = %session.case_id, "starting case");
    let patient = read_age_sex(console)?;
    console.say(&format!("Ok, {} year old {}.", patient.age, patient.sex))?;

    let naming = service.concept_names(session, &patient)?;

    let mentions = read_complaints(service, console, session, &patient)?;
    let evidence = mentions_to_evidence(&mentions);
    let outcome = conduct_interview(service, console, session, patient, evidence)?;

    console.say("")?;
    for block in [
        summarise_all_evidence(&outcome.evidence, &naming),
        summarise_diagnoses(&outcome.diagnoses),
        summarise_triage(&outcome.triage),
    ] {
        console.say(block.trim_end_matches('\n'))?;
        console.say("")?;
    }
    Ok(())
}
