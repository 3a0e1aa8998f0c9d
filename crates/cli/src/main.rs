use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use ebikri_core::analytics::{Granularity, SalesSummary};
use ebikri_core::api::{ApiClient, ApiError, Presentation};
use ebikri_core::session::{Route, SessionGate};
use ebikri_core::storage::{file::default_credentials_path, FileCredentialStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Debug, Parser)]
#[command(name = "ebikri", about = "eBikri business dashboard in the terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and remember the session on this machine.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show whether a session is stored.
    Status,
    Dashboard,
    Sales {
        #[arg(long, value_enum, default_value_t = View::Monthly)]
        view: View,

        /// Print the summary as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    Profile,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum View {
    Monthly,
    Yearly,
}

impl From<View> for Granularity {
    fn from(v: View) -> Self {
        match v {
            View::Monthly => Granularity::Month,
            View::Yearly => Granularity::Year,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = ebikri_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let path = settings
        .credentials_path
        .clone()
        .unwrap_or_else(default_credentials_path);
    let store = Arc::new(FileCredentialStore::new(path));
    tracing::debug!(path = %store.path().display(), "credential store");
    let gate = Arc::new(SessionGate::new(store));
    gate.on_navigate(|route| tracing::info!(%route, "navigate"));

    let result = run(args.command, &settings, gate).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

async fn run(
    command: Command,
    settings: &ebikri_core::config::Settings,
    gate: Arc<SessionGate>,
) -> anyhow::Result<()> {
    match command {
        Command::Status => {
            match gate.current_user().await {
                Some(user) => println!("Logged in as {}", user.display_name()),
                None if gate.is_authenticated().await => println!("Logged in"),
                None => println!("Not logged in"),
            }
            return Ok(());
        }
        Command::Logout => {
            gate.logout().await;
            println!("Logged out");
            return Ok(());
        }
        _ => {}
    }

    let client = ApiClient::from_settings(settings, gate.clone())?;

    match command {
        Command::Login { email, password } => {
            if gate.guard(Route::Login).await != Route::Login {
                println!("Already logged in; run `ebikri logout` first to switch accounts.");
                return Ok(());
            }
            let session = client.login(&email, &password).await.map_err(surface)?;
            println!("Welcome, {}", session.user.display_name());
        }
        Command::Dashboard => {
            require(&gate, Route::Dashboard).await?;
            let dashboard = client.fetch_dashboard().await.map_err(surface)?;
            print!("{}", render::dashboard(&dashboard));
        }
        Command::Sales { view, json } => {
            require(&gate, Route::Sales).await?;
            let records = client.fetch_sales().await.map_err(surface)?;
            let summary = SalesSummary::compute(&records, view.into());
            if json {
                let out = serde_json::to_string_pretty(&summary)
                    .context("serialize sales summary failed")?;
                println!("{out}");
            } else {
                print!("{}", render::sales(&summary));
            }
        }
        Command::Profile => {
            require(&gate, Route::Profile).await?;
            let user = gate
                .current_user()
                .await
                .context("no user record stored for this session; log in again")?;
            let profile = client.fetch_profile(&user.id).await.map_err(surface)?;
            print!("{}", render::profile(&profile));
        }
        Command::Status | Command::Logout => {}
    }

    Ok(())
}

async fn require(gate: &SessionGate, route: Route) -> anyhow::Result<()> {
    let target = gate.guard(route).await;
    anyhow::ensure!(
        target == route,
        "not logged in; run `ebikri login --email <email> --password <password>`"
    );
    Ok(())
}

fn surface(err: ApiError) -> anyhow::Error {
    tracing::debug!(error = %err, kind = ?err.kind(), "API call failed");
    anyhow::anyhow!(describe(&err))
}

fn describe(err: &ApiError) -> String {
    let message = err.user_message();
    match err.presentation() {
        Presentation::Retry => format!("{message} (run the command again to retry)"),
        Presentation::Redirect => {
            format!("{message} Run `ebikri login --email <email> --password <password>`.")
        }
        Presentation::Inline => message,
    }
}

fn init_sentry(settings: &ebikri_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors_carry_a_retry_hint() {
        let err = ApiError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let text = describe(&err);
        assert!(text.starts_with("Server error. Please try again later."));
        assert!(text.contains("retry"));

        let err = ApiError::NetworkFailure {
            detail: "timed out".into(),
            timed_out: true,
        };
        assert!(describe(&err).contains("retry"));
    }

    #[test]
    fn expired_session_points_at_login_and_bad_credentials_stay_plain() {
        assert!(describe(&ApiError::Unauthorized).contains("ebikri login"));

        let err = ApiError::InvalidCredentials {
            message: "Invalid email or password".into(),
        };
        assert_eq!(describe(&err), "Invalid email or password");
    }

    #[test]
    fn views_map_to_granularity() {
        assert_eq!(Granularity::from(View::Monthly), Granularity::Month);
        assert_eq!(Granularity::from(View::Yearly), Granularity::Year);
    }
}
