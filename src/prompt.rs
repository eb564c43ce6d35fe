// Line-oriented prompting. Everything the interview says or asks goes
// through the `Console` trait so the loops can be driven by a script in
// tests instead of a terminal.

use crate::extract::{extract_sex, read_age, ExtractError, SEX_NORM};
use crate::model::Patient;
use anyhow::Result;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input closed before an answer was given")]
    InputClosed,
}

pub trait Console {
    /// Show `prompt` and return the trimmed reply. An empty string means
    /// "no answer".
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Print one line of output.
    fn say(&mut self, line: &str) -> Result<()>;
}

/// `"Patient age"` becomes `"Patient age: "`, a question keeps its `?` and
/// only gets the trailing space.
pub fn format_prompt(prompt: &str) -> String {
    if prompt.ends_with('?') {
        format!("{prompt} ")
    } else {
        format!("{prompt}: ")
    }
}

/// Console bound to the process' stdin/stdout.
pub struct TerminalConsole<R, W> {
    input: R,
    output: W,
}

impl TerminalConsole<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        TerminalConsole {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalConsole { input, output }
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", format_prompt(prompt))?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::InputClosed.into());
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }
}

/// Replays a fixed list of answers and records everything shown. Used to
/// drive the interview without a terminal.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub lines: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedConsole {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        let answer = self.answers.pop_front().ok_or(PromptError::InputClosed)?;
        Ok(answer.trim().to_string())
    }

    fn say(&mut self, line: &str) -> Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Ask `prompt` until `parse` accepts the reply. Each rejection prints the
/// extraction error followed by "Please repeat." and re-asks the identical
/// prompt. There is no attempt limit.
pub fn ask_until<T, F>(console: &mut dyn Console, prompt: &str, mut parse: F) -> Result<T>
where
    F: FnMut(&str) -> Result<T, ExtractError>,
{
    loop {
        let answer = console.ask(prompt)?;
        match parse(&answer) {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!(prompt, answer = %answer, error = %e, "unusable answer");
                console.say(&format!("{e} Please repeat."))?;
            }
        }
    }
}

/// Ask for the patient's age, then sex. A bad answer re-asks only the
/// question it was given to.
pub fn read_age_sex(console: &mut dyn Console) -> Result<Patient> {
    let age = ask_until(console, "Patient age", read_age)?;
    let sex = ask_until(console, "Patient sex", |answer| extract_sex(answer, SEX_NORM))?;
    Ok(Patient { age, sex })
}
