//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod account;
pub mod character_list;
pub mod chats;
pub mod history;
pub mod say;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::WhispiClient;
use crate::core::config::Config;
use crate::core::session_store::SessionStore;
use crate::logging;
use crate::ui::chat_loop::run_chat;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    " for ",
    env!("VERGEN_CARGO_TARGET_TRIPLE"),
    ")"
);

#[derive(Parser)]
#[command(name = "whispi")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Chat with AI characters from your terminal")]
#[command(
    long_about = "Whispi is a full-screen terminal client for chatting with hosted AI \
characters. Replies stream in as they are written, and your conversations are kept \
server-side so they follow your user id.\n\n\
Getting started:\n\
  whispi signup --name <NAME> --birth-year <YEAR>   Create an anonymous account\n\
  whispi login <UID>                                Use an existing user id\n\n\
Environment Variables:\n\
  WHISPI_API_BASE_URL   Override the backend base URL\n\
  WHISPI_LOG            Log filter for --log (defaults to info)\n\n\
Controls:\n\
  Enter             Send the message (or confirm in a dialog)\n\
  Alt+Enter         Insert a newline\n\
  Tab               Switch between the chat list and the input\n\
  Ctrl+N            Pick a character\n\
  Ctrl+A            Create an anonymous account\n\
  Ctrl+U            Set your user id\n\
  Esc               Close a dialog\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL (overrides WHISPI_API_BASE_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Use an existing user id
    Login {
        /// The user id to store
        uid: String,
    },
    /// Create and onboard an anonymous account
    Signup {
        /// Name shown to characters
        #[arg(long)]
        name: String,
        /// Four-digit birth year
        #[arg(long)]
        birth_year: String,
    },
    /// Show the stored user id and device id
    Whoami,
    /// Forget the stored user id
    Logout,
    /// List characters, optionally filtered
    Characters {
        /// Case-insensitive match on name, status, or personality tags
        #[arg(short, long)]
        search: Option<String>,
        /// Require a filter tag (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// List your conversations
    Chats,
    /// Print the messages of a conversation
    History {
        /// Character whose conversation to show
        character_id: String,
        /// Maximum number of messages to fetch
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Send one message and stream the reply to stdout
    Say {
        /// Character to talk to
        #[arg(short, long, value_name = "ID")]
        character: String,
        /// Message text
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set configuration values, or print them when no value is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.log.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let api_base_url = args.api_base_url;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(api_base_url).await,
        Commands::Login { uid } => exit_on_error(account::login(&SessionStore::open_default()?, &uid)),
        Commands::Signup { name, birth_year } => {
            let (_, client) = load_client(api_base_url.as_deref())?;
            let store = SessionStore::open_default()?;
            exit_on_error(account::signup(&client, &store, &name, &birth_year).await)
        }
        Commands::Whoami => account::whoami(&SessionStore::open_default()?),
        Commands::Logout => account::logout(&SessionStore::open_default()?),
        Commands::Characters { search, tags } => {
            let (config, client) = load_client(api_base_url.as_deref())?;
            exit_on_error(
                character_list::list_characters(
                    &client,
                    config.character_page_size(),
                    search.as_deref().unwrap_or(""),
                    &tags,
                )
                .await,
            )
        }
        Commands::Chats => {
            let (_, client) = load_client(api_base_url.as_deref())?;
            let uid = require_uid()?;
            exit_on_error(chats::list_chats(&client, &uid).await)
        }
        Commands::History {
            character_id,
            limit,
        } => {
            let (config, client) = load_client(api_base_url.as_deref())?;
            let uid = require_uid()?;
            let limit = limit.filter(|n| *n > 0).unwrap_or(config.history_limit());
            exit_on_error(history::print_history(&client, &character_id, &uid, limit).await)
        }
        Commands::Say { character, prompt } => {
            let (_, client) = load_client(api_base_url.as_deref())?;
            let uid = require_uid()?;
            exit_on_error(say::run_say(client, &character, &uid, &prompt.join(" ")).await)
        }
        Commands::Set { key, value } => settings::set(key.as_deref(), value.as_deref()),
        Commands::Unset { key } => settings::unset(&key),
    }
}

fn load_client(api_base_url: Option<&str>) -> Result<(Config, WhispiClient), Box<dyn Error>> {
    let config = Config::load()?;
    let client = WhispiClient::from_config(&config, api_base_url)?;
    Ok((config, client))
}

fn require_uid() -> Result<String, Box<dyn Error>> {
    let state = SessionStore::open_default()?.load()?;
    match state.uid.filter(|uid| !uid.trim().is_empty()) {
        Some(uid) => Ok(uid),
        None => {
            eprintln!("❌ No user id stored.");
            eprintln!("   Run `whispi login <UID>` or `whispi signup --name <NAME> --birth-year <YEAR>`.");
            std::process::exit(1);
        }
    }
}

/// Print a user-facing failure and exit non-zero.
fn exit_on_error(result: Result<(), String>) -> Result<(), Box<dyn Error>> {
    if let Err(message) = result {
        eprintln!("❌ {message}");
        std::process::exit(1);
    }
    Ok(())
}
