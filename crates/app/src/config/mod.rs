use backend::{
    BackendConfig, DEFAULT_DATABASE, DEFAULT_FIRESTORE_URL, DEFAULT_IDENTITY_URL,
    DEFAULT_TOKEN_URL,
};
use clap::{Args, Parser, Subcommand};
use config::ConfigError;
use engine::{Amount, TripId};
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/trip_tracker.toml";
const DEFAULT_STATE_PATH: &str = "config/trip_tracker_session.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: String,
    pub project_id: String,
    pub database: String,
    pub identity_url: String,
    pub token_url: String,
    pub firestore_url: String,
    pub state_path: String,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            database: DEFAULT_DATABASE.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            state_path: DEFAULT_STATE_PATH.to_string(),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn backend(&self) -> Result<BackendConfig> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::NotFound("api_key".to_string()).into());
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::NotFound("project_id".to_string()).into());
        }

        let mut backend = BackendConfig::new(self.api_key.trim(), self.project_id.trim());
        backend.database = self.database.clone();
        backend.identity_url = self.identity_url.clone();
        backend.token_url = self.token_url.clone();
        backend.firestore_url = self.firestore_url.clone();
        Ok(backend)
    }
}

#[derive(Debug, Parser)]
#[command(name = "trip_tracker", disable_version_flag = true)]
#[command(about = "Record trips and the expenses made during them")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override the project id.
    #[arg(long, global = true)]
    project_id: Option<String>,
    /// Override where the signed-in session is kept.
    #[arg(long, global = true)]
    state_path: Option<String>,
    /// Override the log level (e.g. debug).
    #[arg(long, global = true)]
    level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account; the password is asked on the terminal.
    SignUp {
        #[arg(long)]
        email: String,
    },
    /// Sign in with email and password.
    SignIn {
        #[arg(long)]
        email: String,
    },
    /// Sign in with an identity token issued by Google.
    SignInFederated {
        /// Asked on the terminal when omitted.
        #[arg(long)]
        id_token: Option<String>,
    },
    SignOut,
    /// Show who is signed in.
    Whoami,
    Trips(Trips),
    Expenses(Expenses),
}

#[derive(Debug, Args)]
pub struct Trips {
    #[command(subcommand)]
    pub command: TripsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TripsCommand {
    Add {
        #[arg(long)]
        place: String,
        #[arg(long)]
        country: String,
    },
    List,
}

#[derive(Debug, Args)]
pub struct Expenses {
    #[command(subcommand)]
    pub command: ExpensesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExpensesCommand {
    Add {
        #[arg(long)]
        trip: TripId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        category: String,
    },
    List {
        #[arg(long)]
        trip: TripId,
    },
}

pub fn load() -> Result<(AppConfig, Command)> {
    let cli = Cli::parse();
    let settings = resolve(&cli)?;
    Ok((settings, cli.command))
}

fn resolve(cli: &Cli) -> Result<AppConfig> {
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TRIP_TRACKER"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(project_id) = &cli.project_id {
        settings.project_id = project_id.clone();
    }
    if let Some(state_path) = &cli.state_path {
        settings.state_path = state_path.clone();
    }
    if let Some(level) = &cli.level {
        settings.level = level.clone();
    }

    Ok(settings)
}
