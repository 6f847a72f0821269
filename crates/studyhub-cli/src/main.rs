use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

#[derive(Parser)]
#[command(name = "studyhub")]
#[command(about = "StudyHub CLI - session and data diagnostics for the study group dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session bootstrap and print the resulting auth state
    Status,
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Register a new account
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Display name for the new profile
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out and forget the stored session
    SignOut,
    /// Print the profile of the signed-in member
    Profile,
    /// Print income, expense and balance totals plus a monthly breakdown
    FinanceSummary {
        /// Year of the monthly breakdown (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = commands::App::build()?;

    let result = match cli.command {
        Commands::Status => commands::auth::status(&app).await,
        Commands::SignIn { email, password } => commands::auth::sign_in(&app, &email, &password).await,
        Commands::SignUp {
            email,
            password,
            name,
        } => commands::auth::sign_up(&app, &email, &password, name).await,
        Commands::SignOut => commands::auth::sign_out(&app).await,
        Commands::Profile => commands::auth::profile(&app).await,
        Commands::FinanceSummary { year } => commands::finance::summary(&app, year).await,
    };

    app.auth.teardown();
    result
}
