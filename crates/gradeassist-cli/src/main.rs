//! gradeassist - a terminal front end for the grading assistant.
//!
//! Each sub-command stands in for one page of the web client: it runs the
//! page guard once, performs the page's action, and reports where the
//! client navigated.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use gradeassist_core::config::BASE_URL_ENV;
use gradeassist_core::{
    Config, FileSessionStore, FormOutcome, Page, PageInit, RecordingNavigator, Route, Section,
    SectionContent, SessionClient, SessionController, User,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: gradeassist <command>

Commands:
  status              Show who is logged in
  login [email]       Log in (prompts for the password)
  register            Create an account
  logout              Log out
  show <section>      Show a dashboard section:
                      semesters, classes, subjects, assignments,
                      submissions, grades, profile
  help                Show this message

Set GRADEASSIST_URL to point at a backend other than the configured one.";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Everything one page load needs
struct PageContext {
    config: Config,
    controller: SessionController,
    navigator: Arc<RecordingNavigator>,
}

impl PageContext {
    fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.resolve_base_url(std::env::var(BASE_URL_ENV).ok());
        let cache_dir = config.cache_dir()?;
        debug!(%base_url, ?cache_dir, "Configured");

        let navigator = Arc::new(RecordingNavigator::new());
        let store = Arc::new(FileSessionStore::new(cache_dir));
        let client = SessionClient::new(base_url, store, navigator.clone())?;

        Ok(Self {
            config,
            controller: SessionController::new(client),
            navigator,
        })
    }

    /// Describe the last navigation the way the target page would greet it
    fn report_navigation(&self) {
        match self.navigator.last() {
            Some(Route::Login(Some(notice))) => println!("{}", notice.message()),
            Some(Route::Login(None)) => println!("Please log in: gradeassist login"),
            Some(Route::Dashboard) => {
                let user = self.controller.client().current_user();
                match user {
                    Some(user) => println!("Logged in as {}.", user.display_name()),
                    None => println!("Logged in."),
                }
            }
            Some(Route::Home) => println!("Logged out."),
            Some(Route::Register) => println!("Please register: gradeassist register"),
            None => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    match command {
        "status" => status(),
        "login" => login(args.get(1).cloned()).await,
        "register" => register().await,
        "logout" => logout().await,
        "show" => show(args.get(1).map(String::as_str)).await,
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }
}

fn status() -> Result<()> {
    let ctx = PageContext::new()?;
    ctx.controller.init(Page::Home, "");

    println!("Backend: {}", ctx.controller.client().base_url());
    match ctx.controller.client().current_user() {
        Some(user) => print_user(&user),
        None => println!("Not logged in."),
    }
    Ok(())
}

async fn login(email_arg: Option<String>) -> Result<()> {
    let mut ctx = PageContext::new()?;

    if let PageInit::Redirected(_) = ctx.controller.init(Page::Login, "") {
        ctx.report_navigation();
        return Ok(());
    }

    let email = match email_arg {
        Some(email) => email,
        None => prompt_with_default("Email", ctx.config.last_email.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    match ctx.controller.login(&email, &password).await {
        FormOutcome::Navigated(_) => {
            info!("Login successful");
            ctx.config.last_email = Some(email);
            if let Err(e) = ctx.config.save() {
                warn!(error = %e, "Failed to save config");
            }
            ctx.report_navigation();
        }
        FormOutcome::Error(message) => {
            eprintln!("Login failed: {}", message);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn register() -> Result<()> {
    let ctx = PageContext::new()?;

    if let PageInit::Redirected(_) = ctx.controller.init(Page::Register, "") {
        ctx.report_navigation();
        return Ok(());
    }

    let name = prompt("Name")?;
    let email = prompt("Email")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;

    match ctx
        .controller
        .register(&name, &email, &password, &confirm)
        .await
    {
        FormOutcome::Navigated(_) => ctx.report_navigation(),
        FormOutcome::Error(message) => {
            eprintln!("Registration failed: {}", message);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn logout() -> Result<()> {
    let ctx = PageContext::new()?;
    ctx.controller.init(Page::Home, "");
    ctx.controller.logout().await;
    ctx.report_navigation();
    Ok(())
}

async fn show(section_arg: Option<&str>) -> Result<()> {
    let section = match section_arg {
        Some(name) => match Section::from_name(name) {
            Some(section) => section,
            None => {
                eprintln!("Unknown section: {}\n\n{}", name, USAGE);
                std::process::exit(2);
            }
        },
        None => Section::default(),
    };

    let ctx = PageContext::new()?;

    if let PageInit::Redirected(_) = ctx.controller.init(Page::Dashboard, "") {
        ctx.report_navigation();
        return Ok(());
    }

    // None: the session was rejected and we've been sent to the login page
    let Some(content) = ctx.controller.load_section(section).await else {
        ctx.report_navigation();
        return Ok(());
    };

    println!("== {} ==", section.title());
    match content {
        SectionContent::Rows(rows) if rows.is_empty() => println!("(no records)"),
        SectionContent::Rows(rows) => {
            for row in &rows {
                println!("{}", serde_json::to_string_pretty(row)?);
            }
            println!("{} record(s)", rows.len());
        }
        SectionContent::Profile(user) => print_user(&user),
        SectionContent::Error(message) => {
            eprintln!("Failed to load {}: {}", section.name(), message);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("Name:  {}", user.display_name());
    println!("Email: {}", user.email());
    println!("Role:  {}", user.role());
    if let Some(since) = user.member_since() {
        println!("Since: {}", since);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    let Some(default) = default else {
        return prompt(label);
    };

    print!("{} [{}]: ", label, default);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input.to_string())
    }
}
