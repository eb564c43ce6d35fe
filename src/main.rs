// Entrypoint for the symptom-checker chat.
// - Keeps `main` small: parse arguments, build an API client and hand it to
//   the chat flow.
// - Returns `anyhow::Result` so any failure ends the session with a message.

use clap::Parser;
use symptom_chat::{api::ApiClient, prompt::TerminalConsole, service::Session, ui};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Symptom-checker chat backed by the Infermedica API")]
struct Args {
    /// APP_ID:APP_KEY or a path to a file containing it. Defaults to
    /// ~/.infermedica_auth.
    auth: Option<String>,

    /// Use a non-standard model/language, e.g. infermedica-es.
    #[arg(long)]
    model: Option<String>,

    /// Hide the spinner shown while waiting for the API.
    #[arg(long)]
    no_progress: bool,

    /// Mark requests as development traffic.
    #[arg(long)]
    dev_mode: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with prompts on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let credentials = ui::obtain_credentials(args.auth.as_deref())?;
    let api = ApiClient::from_env(credentials)?
        .with_progress(!args.no_progress)
        .with_dev_mode(args.dev_mode);

    let session = Session::new(args.model);
    let mut console = TerminalConsole::stdio();
    ui::run_chat(&api, &mut console, &session)?;
    Ok(())
}
