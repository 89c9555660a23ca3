//! # Schoolhouse CLI Module
//!
//! Setup and administration from the command line.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Create the database and seed experience levels and goals
//! - `status` - Show record counts
//! - `create-user` - Create a student, teacher or manager account
//! - `set-active` - Activate or deactivate an account
//! - `add-filia` - Register a filia (branch location)
//! - `groups` - List groups, optionally by status
//! - `compact` - Compact the database file

mod commands;

use crate::AppError;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Schoolhouse - School Management Server
///
/// Courses, groups and capacity-limited enrollment.
#[derive(Parser, Debug)]
#[command(name = "schoolhouse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the school database
    #[arg(short = 'D', long, global = true, default_value = "schoolhouse.redb")]
    pub database: PathBuf,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Path to a TOML config file (defaults to ./schoolhouse.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the database and seed experience levels and goals
    Init {
        /// Recreate the database even if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show record counts
    Status,

    /// Create a user account
    CreateUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Phone number, e.g. "(050) 123-45-67"
        #[arg(long)]
        phone: String,

        #[arg(long)]
        password: String,

        /// Role: student, teacher, education or program
        #[arg(long, default_value = "student")]
        role: String,
    },

    /// Activate or deactivate an account
    SetActive {
        #[arg(long)]
        email: String,

        /// true to allow login and enrollment, false to block them
        #[arg(long, action = ArgAction::Set)]
        active: bool,
    },

    /// Register a filia
    AddFilia {
        #[arg(long)]
        name: String,

        #[arg(long)]
        city: String,

        #[arg(long)]
        address: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// List groups
    Groups {
        /// Only groups with this status (e.g. enrollment_started)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Compact the database file
    Compact,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let db = cli.database.as_path();
    let backend = Backend::parse(&cli.backend)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(db, backend, cli.config.as_deref(), host, port).await
        }
        Some(Commands::Init { force }) => cmd_init(db, backend, force, json_mode),
        Some(Commands::Status) | None => cmd_status(db, backend, json_mode),
        Some(Commands::CreateUser {
            email,
            first_name,
            last_name,
            phone,
            password,
            role,
        }) => cmd_create_user(
            db,
            backend,
            json_mode,
            NewUserArgs {
                email,
                first_name,
                last_name,
                phone,
                password,
                role,
            },
        ),
        Some(Commands::AddFilia {
            name,
            city,
            address,
            description,
        }) => cmd_add_filia(
            db,
            backend,
            json_mode,
            &schoolhouse_core::FiliaForm {
                name,
                city,
                address,
                description,
            },
        ),
        Some(Commands::SetActive { email, active }) => {
            cmd_set_active(db, backend, json_mode, &email, active)
        }
        Some(Commands::Groups { status }) => cmd_groups(db, backend, json_mode, status.as_deref()),
        Some(Commands::Compact) => cmd_compact(db, backend, json_mode),
    }
}
