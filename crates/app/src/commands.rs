use std::{io::Write, sync::Arc};

use engine::{
    AuthGateway, DocumentStore, EngineError, Expense, ExpenseRepository, FederatedCredential,
    FederatedFailure, FederatedLogin, IdentityProvider, SessionStore, Trip, TripId,
    TripRepository, UserIdentity,
};
use tracing::{debug, warn};

use crate::{
    config::{Command, Expenses, ExpensesCommand, Trips, TripsCommand},
    error::{AppError, Result},
    local_state::SessionFile,
};

const NO_TRIPS: &str = "You haven't recorded any trips yet";
const NO_EXPENSES: &str = "No expenses recorded for this trip";
const SIGN_IN_FIRST: &str = "You need to sign in first";

/// Gateway and repositories wired to one provider and one session.
pub struct Services<P> {
    pub auth: AuthGateway<P>,
    pub trips: TripRepository<P>,
    pub expenses: ExpenseRepository<P>,
}

impl<P: IdentityProvider + DocumentStore> Services<P> {
    pub fn new(provider: Arc<P>, session: SessionStore) -> Self {
        Self {
            auth: AuthGateway::new(Arc::clone(&provider), session.clone()),
            trips: TripRepository::new(Arc::clone(&provider), session.clone()),
            expenses: ExpenseRepository::new(provider, session),
        }
    }

    pub fn session(&self) -> &SessionStore {
        self.auth.session()
    }

    fn signed_in_user(&self) -> Result<UserIdentity> {
        self.session()
            .current_user()
            .ok_or(AppError::NotSignedIn(SIGN_IN_FIRST))
    }
}

/// Identity token handed over on the command line or at the prompt.
struct PastedToken(String);

impl FederatedLogin for PastedToken {
    async fn obtain_credential(&self) -> std::result::Result<FederatedCredential, FederatedFailure> {
        let token = self.0.trim();
        if token.is_empty() {
            return Err(FederatedFailure::Cancelled);
        }
        Ok(FederatedCredential::google(token))
    }
}

/// [`run`] between restoring the saved session and writing it back.
///
/// A saved session whose refresh could not reach the provider is written
/// back untouched unless the command signed out or replaced it.
pub async fn run_with_session_file<P, S, W>(
    services: &Services<P>,
    file: &SessionFile,
    command: Command,
    ask_secret: S,
    out: &mut W,
) -> Result<()>
where
    P: IdentityProvider + DocumentStore,
    S: Fn(&str) -> Result<String>,
    W: Write,
{
    let mut pending = None;
    if let Some(stored) = file.load()? {
        match services.auth.restore(stored.clone()).await {
            Ok(_) => {}
            Err(EngineError::Unavailable(err)) => {
                warn!("could not refresh the saved session, keeping it: {err}");
                pending = Some(stored);
            }
            Err(err) => warn!("saved session could not be restored: {err}"),
        }
    }

    let signs_out = matches!(command, Command::SignOut);
    let outcome = run(services, command, ask_secret, out).await;

    let current = services.session().current_session();
    let keep = match current {
        Some(session) => Some(session),
        None if signs_out => None,
        None => pending,
    };
    file.store(keep.as_ref())?;

    outcome
}

/// Execute one command, writing its report to `out`.
///
/// `ask_secret` is only called by commands that need a password or token.
pub async fn run<P, S, W>(
    services: &Services<P>,
    command: Command,
    ask_secret: S,
    out: &mut W,
) -> Result<()>
where
    P: IdentityProvider + DocumentStore,
    S: Fn(&str) -> Result<String>,
    W: Write,
{
    match command {
        Command::SignUp { email } => {
            let password = ask_secret("Password: ")?;
            let user = services.auth.sign_up(&email, &password).await?;
            writeln!(out, "Signed up as {}", describe(&user))?;
        }
        Command::SignIn { email } => {
            let password = ask_secret("Password: ")?;
            let user = services.auth.sign_in(&email, &password).await?;
            writeln!(out, "Signed in as {}", describe(&user))?;
        }
        Command::SignInFederated { id_token } => {
            let token = match id_token {
                Some(token) => token,
                None => ask_secret("Identity token: ")?,
            };
            let user = services.auth.sign_in_federated(&PastedToken(token)).await?;
            writeln!(out, "Signed in as {}", describe(&user))?;
        }
        Command::SignOut => {
            services.auth.sign_out().await;
            writeln!(out, "Signed out")?;
        }
        Command::Whoami => match services.session().current_user() {
            Some(user) => writeln!(out, "{}", describe(&user))?,
            None => writeln!(out, "Not signed in")?,
        },
        Command::Trips(Trips { command }) => run_trips(services, command, out).await?,
        Command::Expenses(Expenses { command }) => run_expenses(services, command, out).await?,
    }
    Ok(())
}

async fn run_trips<P, W>(services: &Services<P>, command: TripsCommand, out: &mut W) -> Result<()>
where
    P: IdentityProvider + DocumentStore,
    W: Write,
{
    let user = services.signed_in_user()?;
    match command {
        TripsCommand::Add { place, country } => {
            let id = services.trips.create_trip(&place, &country, &user.id).await?;
            writeln!(out, "Created trip {id}")?;
        }
        TripsCommand::List => {
            let trips = services.trips.list_trips_for_owner(&user.id).await?;
            if trips.is_empty() {
                writeln!(out, "{NO_TRIPS}")?;
            }
            for trip in &trips {
                writeln!(out, "{}", trip_line(trip))?;
            }
        }
    }
    Ok(())
}

async fn run_expenses<P, W>(
    services: &Services<P>,
    command: ExpensesCommand,
    out: &mut W,
) -> Result<()>
where
    P: IdentityProvider + DocumentStore,
    W: Write,
{
    match command {
        ExpensesCommand::Add {
            trip,
            title,
            amount,
            category,
        } => {
            let id = services
                .expenses
                .create_expense(&trip, &title, amount, &category)
                .await?;
            writeln!(out, "Created expense {id}")?;
        }
        ExpensesCommand::List { trip } => {
            if let Some(header) = find_trip(services, &trip).await? {
                writeln!(out, "{}, {}", header.place, header.country)?;
            }
            let expenses = services.expenses.list_expenses_for_trip(&trip).await?;
            if expenses.is_empty() {
                writeln!(out, "{NO_EXPENSES}")?;
            }
            for expense in &expenses {
                writeln!(out, "{}", expense_line(expense))?;
            }
        }
    }
    Ok(())
}

/// The trip among the signed-in user's ones, for the list header.
async fn find_trip<P>(services: &Services<P>, id: &TripId) -> Result<Option<Trip>>
where
    P: IdentityProvider + DocumentStore,
{
    let Some(user) = services.session().current_user() else {
        return Ok(None);
    };
    let trips = services.trips.list_trips_for_owner(&user.id).await?;
    let found = trips.into_iter().find(|trip| &trip.id == id);
    if found.is_none() {
        debug!("trip {id} is not owned by {}", user.id);
    }
    Ok(found)
}

fn describe(user: &UserIdentity) -> String {
    match &user.email {
        Some(email) => format!("{email} ({})", user.id),
        None => user.id.to_string(),
    }
}

fn trip_line(trip: &Trip) -> String {
    format!("{}  {}, {}", trip.id, trip.place, trip.country)
}

fn expense_line(expense: &Expense) -> String {
    format!(
        "{}  {}  {}  [{}]",
        expense.id, expense.title, expense.amount, expense.category
    )
}
