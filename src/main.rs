mod common;
mod ui;
mod user;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::common::config::UserctlConfig;
use crate::common::privileges;
use crate::ui::prelude::*;
use crate::user::UserArgs;
use crate::user::cli::handle_user_command;

/// userctl main parser
#[derive(Parser, Debug)]
#[command(name = "userctl", author, version, about = "Manage local operating system user accounts", long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// User manager
    User(UserArgs),
}

/// Settings resolved once at startup and handed to the dispatcher
#[derive(Debug)]
struct AppConfig {
    settings: UserctlConfig,
}

impl AppConfig {
    fn load(explicit: Option<&Path>) -> Result<Self> {
        let settings = UserctlConfig::load(explicit)?;
        emit(
            Level::Debug,
            "config.loaded",
            &format!("configuration: {:?}", settings),
            None,
        );
        Ok(Self { settings })
    }
}

fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color);

    if let Err(e) = run(cli) {
        let (code, message) = match e.downcast_ref::<user::UserError>() {
            Some(user_err) => (user_err.code(), user_err.to_string()),
            None => ("error", format!("{:#}", e)),
        };
        emit(Level::Error, code, &format!("error, {}", message), None);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::User(args)) => {
            let config = AppConfig::load(cli.config.as_deref())?;
            dispatch_user(&config, args)
        }
        None => {
            println!("userctl: run with --help for usage");
            Ok(())
        }
    }
}

fn dispatch_user(config: &AppConfig, args: UserArgs) -> Result<()> {
    if args.is_mutating() && (args.sudo || config.settings.escalate) {
        args.precheck()?;
        privileges::escalate_if_needed()?;
    }

    let password = args.resolve_password(std::io::stdin().lock())?;
    let op = args.operation(password)?;
    let backend = user::backend_for_current_os(&config.settings);
    handle_user_command(backend.as_ref(), op)
}
