//! Command-line front end for the tutoring backend.
//!
//! Each invocation is one request. The session token is kept in a file
//! between invocations so `login` followed by `generate` works like a
//! browser session would.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tutor_core::validation::{PasswordStrength, CUSTOM_TOPIC, PREDEFINED_TOPICS};
use tutor_core::{
    ApiError, ApiService, Config, ContentForm, ContentRecord, ContentStatus, ContentType,
    DifficultyLevel, FileTokenStore, HistoryEntry, LoginRequest, RegistrationForm, Session,
    UpdateContent, UreqTransport,
};

#[derive(Parser)]
#[command(name = "tutor", version, about = "AI tutoring API client")]
struct Cli {
    /// Overrides TUTOR_API_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Where the session token is kept between runs.
    #[arg(long, global = true, env = "TUTOR_TOKEN_FILE", default_value = ".tutor-token")]
    token_file: String,

    /// Print raw JSON instead of a summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether the backend is reachable.
    Health,
    /// Create an account and start a session.
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to --password.
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Start a session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the session. The local token is removed even if the server fails.
    Logout,
    /// Show the logged-in user.
    Me,
    /// Request new study material.
    Generate {
        /// One of the predefined topics, or "custom" together with --custom-topic.
        #[arg(long, default_value = "")]
        topic: String,
        #[arg(long, default_value = "")]
        custom_topic: String,
        #[arg(long, default_value = "")]
        difficulty: String,
        #[arg(long, default_value = "")]
        content_type: String,
    },
    /// List recent requests.
    History {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one request.
    Show { id: String },
    /// Change fields of a request.
    Update {
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        error_message: Option<String>,
    },
    /// Delete a request.
    Delete { id: String },
    /// Ask the backend to generate a request again.
    Regenerate { id: String },
    /// List topics, difficulty levels and content types.
    Options,
    /// Check a password against the strength rules without sending it.
    CheckPassword { password: String },
}

fn main() -> Result<()> {
    tutor_core::logging::init_logging("warn");
    let cli = Cli::parse();

    let config = match &cli.base_url {
        Some(url) => Config::with_base_url(url)?,
        None => Config::from_env()?,
    };
    debug!(base_url = %config.base_url, token_file = %cli.token_file, "configuration loaded");

    let session = Session::new(Arc::new(FileTokenStore::new(&cli.token_file)));
    let api = ApiService::from_config(&config, session);
    run(&api, cli.command, cli.json)
}

fn run(api: &ApiService<UreqTransport>, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Health => {
            if api.health_check() {
                println!("healthy");
            } else {
                bail!("backend at {} is not healthy", api.client().origin());
            }
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let form = RegistrationForm {
                first_name,
                last_name,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            let request = form.validate().map_err(ApiError::from)?;
            let auth = api.register(&request)?;
            println!("registered {} ({})", auth.user.email, auth.user.id);
        }
        Command::Login { email, password } => {
            let auth = api.login(&LoginRequest { email, password })?;
            println!("welcome back, {}", auth.user.first_name);
        }
        Command::Logout => {
            match api.logout() {
                Ok(()) => println!("logged out"),
                // The local token is gone; a server failure is only reported.
                Err(e @ ApiError::Storage(_)) => bail!(logout_failure(&e)),
                Err(e) => {
                    eprintln!("warning: {}", logout_failure(&e));
                    println!("logged out");
                }
            }
        }
        Command::Me => {
            let user = api.get_current_user()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("{} {} <{}>", user.first_name, user.last_name, user.email);
            }
        }
        Command::Generate {
            topic,
            custom_topic,
            difficulty,
            content_type,
        } => {
            let form = ContentForm {
                topic,
                custom_topic,
                difficulty_level: difficulty,
                content_type,
            };
            let request = form.validate().map_err(ApiError::from)?;
            let record = api.generate_content(&request)?;
            print_record(&record, json)?;
        }
        Command::History { limit } => {
            let records = api.get_content_history(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("no requests yet");
            } else {
                for record in &records {
                    let entry = HistoryEntry::from(record);
                    println!(
                        "{}  {:<10}  {:<12}  {:<11}  {}",
                        entry.id, entry.status, entry.difficulty_level, entry.content_type, entry.topic
                    );
                }
            }
        }
        Command::Show { id } => {
            let record = api.get_content_by_id(&id)?;
            print_record(&record, json)?;
        }
        Command::Update {
            id,
            status,
            content,
            error_message,
        } => {
            let status = status
                .map(|s| s.parse::<ContentStatus>())
                .transpose()
                .context("invalid --status")?;
            let update = UpdateContent {
                status,
                generated_content: content,
                error_message,
                ..UpdateContent::default()
            };
            let record = api.update_content(&id, &update)?;
            print_record(&record, json)?;
        }
        Command::Delete { id } => {
            api.delete_content(&id)?;
            println!("deleted {id}");
        }
        Command::Regenerate { id } => {
            let record = api.regenerate_content(&id)?;
            print_record(&record, json)?;
        }
        Command::Options => {
            println!("topics: {}, {CUSTOM_TOPIC}", PREDEFINED_TOPICS.join(", "));
            let levels: Vec<&str> = DifficultyLevel::ALL.iter().map(|d| d.as_str()).collect();
            println!("difficulty levels: {}", levels.join(", "));
            let kinds: Vec<&str> = ContentType::ALL.iter().map(|k| k.as_str()).collect();
            println!("content types: {}", kinds.join(", "));
        }
        Command::CheckPassword { password } => {
            let failures = PasswordStrength::check(&password).failures();
            if failures.is_empty() {
                println!("password meets all requirements");
            } else {
                for rule in failures {
                    println!("missing: {}", rule.description());
                }
                bail!("password does not meet all requirements");
            }
        }
    }
    Ok(())
}

fn logout_failure(e: &ApiError) -> String {
    match e {
        ApiError::Storage(_) => format!("could not remove the local session token: {e}"),
        _ => format!("server logout failed: {e}"),
    }
}

fn print_record(record: &ContentRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }
    let entry = HistoryEntry::from(record);
    println!("id:         {}", entry.id);
    println!("topic:      {}", entry.topic);
    println!("difficulty: {}", entry.difficulty_level);
    println!("type:       {}", entry.content_type);
    println!("status:     {}", entry.status);
    println!("requested:  {}", entry.timestamp.to_rfc3339());
    if let Some(message) = &record.error_message {
        println!("error:      {message}");
    }
    println!();
    println!("{}", entry.display_body());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_arguments_default_to_empty_selections() {
        let cli = Cli::try_parse_from(["tutor", "generate", "--topic", "Calculus"]).unwrap();
        match cli.command {
            Command::Generate { topic, difficulty, .. } => {
                assert_eq!(topic, "Calculus");
                assert!(difficulty.is_empty());
            }
            _ => panic!("expected generate"),
        }
        assert_eq!(cli.token_file, ".tutor-token");
    }

    #[test]
    fn logout_failures_name_their_source() {
        let local = ApiError::Storage(".tutor-token: permission denied".to_string());
        assert!(logout_failure(&local).starts_with("could not remove the local session token"));

        let server = ApiError::Request {
            message: "HTTP error! status: 500".to_string(),
            status: Some(500),
        };
        assert_eq!(logout_failure(&server), "server logout failed: HTTP error! status: 500");
    }
}
