// Spontime - client for the Spontime plans API
// Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use spontime::actions::Actions;
use spontime::api::{ApiClient, ApiError, CreatePlanRequest, Plan, User, Visibility};
use spontime::config::{load_config, Config};
use spontime::errors::{session_file_error, suggestion_for, UserFriendlyError};
use spontime::notify::TerminalSink;
use spontime::session::{FileTokenStore, Session};
use spontime::task::ActionHandle;

#[derive(Parser, Debug)]
#[command(name = "spontime")]
#[command(about = "Browse and create Spontime plans from the terminal", version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Override the API base URL from the config file
    #[arg(long = "base-url", global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        handle: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        #[arg(long = "display-name")]
        display_name: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user's profile
    Profile,
    /// List plans
    Plans {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show a single plan
    Plan { id: String },
    /// Create a new plan
    CreatePlan {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Start time (RFC 3339)
        #[arg(long)]
        starts: Option<chrono::DateTime<chrono::Utc>>,
        /// End time (RFC 3339)
        #[arg(long)]
        ends: Option<chrono::DateTime<chrono::Utc>>,
        #[arg(long)]
        capacity: Option<i32>,
        /// public, friends or restricted
        #[arg(long, default_value = "public")]
        visibility: Visibility,
    },
    /// List users
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show a single user
    User { id: String },
    /// List messages, optionally for one plan
    Messages {
        #[arg(long = "plan")]
        plan_id: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show the configured server and session state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing();

    let mut config = load_config().user_context_with_suggestion(
        "Failed to load configuration",
        "Check ~/.spontime/config.toml or the SPONTIME_* environment variables",
    )?;
    if let Some(base_url) = args.base_url {
        config.api_base_url = base_url;
    }

    let session = Arc::new(open_session(&config)?);
    let client = ApiClient::new(&config, session.clone())
        .context("Failed to create API client")?;

    if let Command::Status = args.command {
        print_status(&config, &client);
        return Ok(());
    }

    let notifier = Arc::new(TerminalSink::new(io::stdout().is_terminal()));
    let actions = Actions::new(client, notifier);

    let command = resolve_passwords(args.command)?;
    let handle = ActionHandle::spawn(run_command(actions, command));

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    match handle.join().await {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => {
            if let Some(suggestion) = suggestion_for(&e) {
                eprintln!("\n\x1b[1;33mSuggestion:\x1b[0m {}", suggestion);
            }
            std::process::exit(1);
        }
        None => {
            eprintln!("Cancelled");
            std::process::exit(130);
        }
    }
}

fn init_tracing() {
    // SPONTIME_DEBUG=1 forces debug output unless RUST_LOG is set explicitly
    let show_debug = std::env::var("SPONTIME_DEBUG")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_level(show_debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();

    // Bridge log crate -> tracing (for dependencies using log crate)
    tracing_log::LogTracer::init().ok();
}

fn default_log_level(show_debug: bool) -> &'static str {
    if show_debug {
        "debug"
    } else {
        "info"
    }
}

/// Build the session, adopting a token saved by an earlier run
fn open_session(config: &Config) -> Result<Session> {
    let path = config
        .session_file
        .clone()
        .or_else(FileTokenStore::default_path)
        .context("Could not determine home directory for the session file")?;

    let store = FileTokenStore::new(&path);
    match Session::restore(store.clone()) {
        Ok(session) => Ok(session),
        Err(e) => {
            eprintln!(
                "{}",
                session_file_error(&path.display().to_string(), &e.to_string())
            );
            eprintln!("\nContinuing without a saved session.\n");
            Ok(Session::new(store))
        }
    }
}

/// Prompt for any password not given on the command line
fn resolve_passwords(command: Command) -> Result<Command> {
    Ok(match command {
        Command::Login { email, password } => Command::Login {
            email,
            password: Some(password_or_prompt(password)?),
        },
        Command::Register {
            email,
            handle,
            password,
            display_name,
        } => Command::Register {
            email,
            handle,
            password: Some(password_or_prompt(password)?),
            display_name,
        },
        other => other,
    })
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run_command(actions: Actions, command: Command) -> Result<(), ApiError> {
    match command {
        Command::Login { email, password } => {
            let auth = actions
                .login(&email, password.as_deref().unwrap_or_default())
                .await?;
            println!("Signed in as {}", auth.user.name());
        }
        Command::Register {
            email,
            handle,
            password,
            display_name,
        } => {
            let auth = actions
                .register(
                    &email,
                    &handle,
                    password.as_deref().unwrap_or_default(),
                    display_name.as_deref(),
                )
                .await?;
            println!("Welcome, {}", auth.user.name());
        }
        Command::Logout => actions.logout().await,
        Command::Profile => {
            let user = actions.profile().await?;
            print_profile(&user);
        }
        Command::Plans { page } => {
            let plans = actions.load_plans(page).await?;
            if plans.is_empty() {
                println!("No plans yet");
            }
            for plan in &plans.results {
                print_plan_line(plan);
            }
            print_page_footer(page, plans.count, plans.has_previous(), plans.has_next());
        }
        Command::Plan { id } => {
            let plan = actions.plan(&id).await?;
            print_plan(&plan);
        }
        Command::CreatePlan {
            title,
            description,
            starts,
            ends,
            capacity,
            visibility,
        } => {
            let simple = starts.is_none()
                && ends.is_none()
                && capacity.is_none()
                && visibility == Visibility::Public;

            let plan = if simple {
                actions.create_plan(&title, description.as_deref()).await?
            } else {
                let mut request = CreatePlanRequest::new(title.trim())
                    .with_schedule(starts, ends)
                    .with_visibility(visibility);
                request.description = description.filter(|d| !d.trim().is_empty());
                request.capacity = capacity;
                actions.submit_plan(&request).await?
            };
            print_plan_line(&plan);
        }
        Command::Users { page } => {
            let users = actions.users(page).await?;
            for user in &users.results {
                println!("{}  @{}  {}", user.id, user.handle, user.name());
            }
            print_page_footer(page, users.count, users.has_previous(), users.has_next());
        }
        Command::User { id } => {
            let user = actions.user(&id).await?;
            print_profile(&user);
        }
        Command::Messages { plan_id, page } => {
            let messages = actions.messages(plan_id.as_deref(), page).await?;
            for message in &messages.results {
                let author = message
                    .author
                    .as_ref()
                    .map(|u| u.handle.as_str())
                    .unwrap_or("unknown");
                println!(
                    "[{}] {}: {}",
                    message.created_at.format("%Y-%m-%d %H:%M"),
                    author,
                    message.content
                );
            }
            print_page_footer(
                page,
                messages.count,
                messages.has_previous(),
                messages.has_next(),
            );
        }
        Command::Status => {}
    }

    Ok(())
}

fn print_status(config: &Config, client: &ApiClient) {
    println!("Server:  {}", client.base_url());
    println!("Timeout: {}s", config.timeout_seconds);
    if client.session().is_authenticated() {
        println!("Session: signed in");
    } else {
        println!("Session: anonymous");
    }
}

fn print_profile(user: &User) {
    println!("Handle:       {}", user.handle);
    println!(
        "Display Name: {}",
        user.display_name.as_deref().unwrap_or("Not set")
    );
    println!("Email:        {}", user.email.as_deref().unwrap_or("Not set"));
    println!("Status:       {}", user.status);
}

fn print_plan_line(plan: &Plan) {
    let host = plan
        .host_user
        .as_ref()
        .map(|u| u.handle.as_str())
        .unwrap_or("Unknown");
    println!(
        "{}  {}  (host: {})\n    {}",
        plan.id,
        plan.title,
        host,
        plan.description.as_deref().unwrap_or("No description")
    );
}

fn print_plan(plan: &Plan) {
    print_plan_line(plan);
    if let Some(starts) = plan.starts_at {
        println!("    Starts:     {}", starts.to_rfc3339());
    }
    if let Some(ends) = plan.ends_at {
        println!("    Ends:       {}", ends.to_rfc3339());
    }
    if let Some(capacity) = plan.capacity {
        println!("    Capacity:   {}", capacity);
    }
    println!("    Visibility: {}", plan.visibility.as_str());
    println!("    Active:     {}", if plan.is_active { "yes" } else { "no" });
}

fn print_page_footer(page: u32, count: u64, has_previous: bool, has_next: bool) {
    println!("{}", page_footer(page, count, has_previous, has_next));
}

fn page_footer(page: u32, count: u64, has_previous: bool, has_next: bool) -> String {
    let mut footer = format!("-- page {} ({} total)", page, count);
    if has_previous {
        footer.push_str(&format!(", previous: --page {}", page.saturating_sub(1).max(1)));
    }
    if has_next {
        footer.push_str(&format!(", next: --page {}", page.saturating_add(1)));
    }
    footer
}
