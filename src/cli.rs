//! The non-interactive subcommands. Each takes its input through a
//! [`Prompter`] and writes its report to `out`, so tests can drive them.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::{
    credential::Credential,
    document_path::DocumentPath,
    page::{Page, PageSource},
    session::Confirmation,
    state::AppState,
};

const TOKEN_PROMPT: &str = "Enter GitHub Personal Access Token (with repo scope):";

pub trait Prompter {
    /// Ask for a line of input. `None` when the user gave up (end of input).
    fn prompt(&mut self, question: &str) -> Result<Option<String>>;
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Reads answers from stdin, questions go to stderr.
pub struct StdioPrompter;

impl StdioPrompter {
    fn read_line(&self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok((n > 0).then_some(line))
    }
}

impl Prompter for StdioPrompter {
    fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        eprint!("{question} ");
        std::io::stderr().flush()?;
        self.read_line()
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        eprint!("{question} [y/N] ");
        std::io::stderr().flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
    }
}

pub async fn login(state: &AppState, prompter: &mut dyn Prompter, out: &mut impl Write) -> Result<()> {
    let input = prompter.prompt(TOKEN_PROMPT)?.unwrap_or_default();
    let token = input.trim();
    if token.is_empty() {
        writeln!(out, "Login cancelled.")?;
        return Ok(());
    }

    state
        .credentials
        .set(Credential::new(token))
        .context("Failed to store token")?;
    tracing::info!("Token stored");

    if state.repository.check_identity().await {
        writeln!(out, "Token stored and accepted by GitHub.")?;
    } else {
        writeln!(out, "Token stored, but GitHub did not accept it.")?;
    }
    Ok(())
}

pub fn logout(state: &AppState, prompter: &mut dyn Prompter, out: &mut impl Write) -> Result<()> {
    if state.credentials.get().is_none() {
        writeln!(out, "No token stored.")?;
        return Ok(());
    }
    if !prompter.confirm(Confirmation::Logout.prompt())? {
        return Ok(());
    }
    state
        .credentials
        .clear()
        .context("Failed to remove token")?;
    writeln!(out, "Token removed.")?;
    Ok(())
}

pub async fn status(state: &AppState, out: &mut impl Write) -> Result<()> {
    if state.credentials.get().is_none() {
        writeln!(out, "Not logged in.")?;
    } else if state.repository.check_identity().await {
        writeln!(out, "Logged in: stored token is valid.")?;
    } else {
        writeln!(out, "Stored token was rejected or GitHub is unreachable.")?;
    }
    Ok(())
}

/// Print where the post shown at `page` lives in the repository.
pub async fn path(state: &AppState, page: &str, out: &mut impl Write) -> Result<()> {
    let page = Page::load(PageSource::parse(page))
        .await
        .with_context(|| format!("Cannot read page {page}"))?;
    let path = DocumentPath::derive(&page.metadata, &state.settings.layout)?;
    writeln!(out, "{path}")?;
    Ok(())
}
