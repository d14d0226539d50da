//! `loom generate` handlers

use std::io::{self, Write};

use serde_json::Value;

use crate::api::{ApiClient, DraftAssembler, GenerateHandler, StreamCallbacks};
use crate::cli::commands::GenerateCommand;
use crate::controllers::{CharacterController, ProjectController, Scope};
use crate::core::config::AiModel;
use crate::error::{LoomError, Result};

/// Handle generation commands
pub async fn handle_generate(command: GenerateCommand, client: &ApiClient, model: AiModel) -> Result<()> {
    match command {
        GenerateCommand::Character {
            project,
            keywords,
            password,
            no_save,
        } => generate_character(client, model, &project, &keywords, password, no_save).await,
    }
}

async fn generate_character(
    client: &ApiClient,
    model: AiModel,
    project_id: &str,
    keywords: &str,
    password: Option<String>,
    no_save: bool,
) -> Result<()> {
    let projects = ProjectController::new(client);
    let bundle = match password {
        Some(password) => projects.unlock(project_id, &password).await?,
        None => projects.load_bundle(project_id).await?,
    };
    let scope = Scope::from_project(&bundle.project, model);
    let controller = CharacterController::new(client, &scope);
    let request = controller.generation_request(keywords)?;

    eprintln!("Generating with {}...", model.display_name());

    let mut assembler = DraftAssembler::new();
    let mut printer = LinePrinter::new(io::stdout());
    let mut failure: Option<LoomError> = None;
    {
        let mut handler = StreamCallbacks {
            on_chunk: |chunk: Value| {
                let line = assembler.push(&chunk);
                printer.print(&line);
            },
            on_complete: || tracing::debug!("Character stream complete"),
            on_error: |e: LoomError| failure = Some(e),
        };
        GenerateHandler::new(client)
            .character_stream(project_id, &request, &mut handler)
            .await;
    }
    if let Some(e) = failure {
        return Err(e);
    }
    printer.finish()?;

    let draft = assembler.finish()?;
    if no_save {
        eprintln!("Generated \"{}\" (not saved)", draft.name);
        return Ok(());
    }
    let done = controller.save_generated(&draft).await?;
    eprintln!("{}", done.message);
    Ok(())
}

/// Writes one line per chunk and stops at the first write error, so a
/// closed pipe ends the output instead of being ignored
struct LinePrinter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> LinePrinter<W> {
    fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn print(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        let text = format!("{}\n", line);
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!("Stopped printing stream: {}", e);
            self.error = Some(e);
        }
    }

    fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(LoomError::Io(e)),
            None => Ok(()),
        }
    }
}
