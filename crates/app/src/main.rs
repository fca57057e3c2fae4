use std::{io::stdout, process::ExitCode, sync::Arc};

use backend::Backend;
use engine::SessionStore;

use crate::{commands::Services, error::Result, local_state::SessionFile};

mod commands;
mod config;
mod error;
mod local_state;
mod prompt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let (settings, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "trip_tracker={level},engine={level},backend={level}",
            level = settings.level
        ))
        .init();

    let backend = Backend::new(settings.backend()?);
    let services = Services::new(Arc::new(backend), SessionStore::new());

    let file = SessionFile::new(&settings.state_path);
    commands::run_with_session_file(
        &services,
        &file,
        command,
        prompt::prompt_secret,
        &mut stdout(),
    )
    .await
}
