//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::AppError;
use crate::api::{self, UserView};
use crate::config::Config;
use schoolhouse_core::{
    Accounts, Catalog, FiliaForm, GroupFilter, GroupStatus, Groups, NewUser, Role, School,
    SortOption,
};
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Where the school's records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Redb,
    /// Volatile; changes are lost when the command exits.
    Memory,
}

impl Backend {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(AppError::Usage(format!(
                "Unknown backend '{}'. Use \"redb\" or \"memory\".",
                other
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

/// Open the school for a command.
///
/// A memory school starts with the default experience levels and goals so
/// that it is usable right away.
pub fn open_school(db_path: &Path, backend: Backend) -> Result<School, AppError> {
    match backend {
        Backend::Redb => Ok(School::with_redb(db_path)?),
        Backend::Memory => {
            let mut school = School::new();
            Catalog::seed_defaults(&mut school)?;
            Ok(school)
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: Backend,
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    let mut config = Config::load(config_path)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    let school = open_school(db_path, backend)?;

    println!("Schoolhouse Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!("  Backend:    {}", backend.as_str());
    println!("  Database:   {}", db_path.display());
    println!("  Rate limit: {}/s", config.rate_limit);
    println!();
    println!("Endpoints:");
    println!("  GET  /courses, /filias   - Catalog");
    println!("  POST /quiz               - Course suggestion");
    println!("  POST /login, /register   - Accounts");
    println!("  GET  /dashboard          - Role dashboard");
    println!("  *    /manage/...         - Manager tools");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(school, config).await
}

// =============================================================================
// INIT & STATUS
// =============================================================================

/// Create the database and seed experience levels and goals.
pub fn cmd_init(
    db_path: &Path,
    backend: Backend,
    force: bool,
    json_mode: bool,
) -> Result<(), AppError> {
    if backend == Backend::Redb && db_path.exists() {
        if !force {
            return Err(AppError::Usage(
                "Database already exists. Use --force to recreate it.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| AppError::Io(format!("Cannot remove old database: {}", e)))?;
        tracing::warn!(path = %db_path.display(), "removed existing database");
    }

    let mut school = open_school(db_path, backend)?;
    let seeded = Catalog::seed_defaults(&mut school)?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend.as_str(),
            "seeded": seeded,
        }));
    } else {
        println!(
            "Initialized {} database at {} ({} default records)",
            backend.as_str(),
            db_path.display(),
            seeded
        );
    }
    Ok(())
}

/// Show record counts.
pub fn cmd_status(db_path: &Path, backend: Backend, json_mode: bool) -> Result<(), AppError> {
    let school = open_school(db_path, backend)?;
    let counts = school.counts()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend.as_str(),
            "counts": counts,
        }));
        return Ok(());
    }

    println!("Schoolhouse Status");
    println!("==================");
    println!("Database: {}", db_path.display());
    println!("Backend:  {}", backend.as_str());
    println!();
    println!("Users:            {}", counts.users);
    println!("Filias:           {}", counts.filias);
    println!("Courses:          {}", counts.courses);
    println!("Groups:           {}", counts.groups);
    println!("Contact messages: {}", counts.contact_messages);
    println!("Notifications:    {}", counts.notifications);
    Ok(())
}

// =============================================================================
// ADMINISTRATION
// =============================================================================

/// Arguments of `create-user`.
#[derive(Debug, Clone)]
pub struct NewUserArgs {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password: String,
    pub role: String,
}

/// Create an account with any role.
pub fn cmd_create_user(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    args: NewUserArgs,
) -> Result<(), AppError> {
    let role = Role::from_str(&args.role)?;
    let mut school = open_school(db_path, backend)?;
    let user = Accounts::create_user(
        &mut school,
        &NewUser {
            email: args.email,
            first_name: args.first_name,
            last_name: args.last_name,
            phone_number: args.phone,
            password: args.password,
            role,
        },
        api::handlers::new_salt(),
    )?;

    if json_mode {
        print_json(&UserView::from(&user));
    } else {
        println!(
            "Created {} {} <{}> with id {}",
            role.label(),
            user.full_name(),
            user.email,
            user.id
        );
    }
    Ok(())
}

/// Activate or deactivate the account with an email address.
///
/// An inactive account cannot log in and cannot be added to groups.
pub fn cmd_set_active(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    email: &str,
    active: bool,
) -> Result<(), AppError> {
    let mut school = open_school(db_path, backend)?;
    let user = Accounts::find_by_email(&school, email.trim())?
        .ok_or_else(|| AppError::Usage(format!("No account with email '{}'.", email.trim())))?;
    let user = Accounts::set_active(&mut school, user.id, active)?;
    tracing::info!(user = %user.id, active, "account activity changed");

    if json_mode {
        print_json(&UserView::from(&user));
    } else {
        let state = if active { "activated" } else { "deactivated" };
        println!("Account {} <{}> {}", user.full_name(), user.email, state);
    }
    Ok(())
}

/// Register a filia.
pub fn cmd_add_filia(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    form: &FiliaForm,
) -> Result<(), AppError> {
    let mut school = open_school(db_path, backend)?;
    let filia = Catalog::create_filia(&mut school, form)?;

    if json_mode {
        print_json(&filia);
    } else {
        println!("Created filia {} ({}) with id {}", filia.name, filia.city, filia.id);
    }
    Ok(())
}

/// List groups by name, optionally only those with one status.
pub fn cmd_groups(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    status: Option<&str>,
) -> Result<(), AppError> {
    let mut filter = GroupFilter::default();
    if let Some(status) = status {
        filter.statuses.insert(GroupStatus::from_str(status)?);
    }
    let school = open_school(db_path, backend)?;
    let views = Groups::list(&school, &filter, SortOption::Name)?
        .into_iter()
        .map(|group| Groups::resolve(&school, group))
        .collect::<Result<Vec<_>, _>>()?;

    if json_mode {
        print_json(&views);
        return Ok(());
    }

    if views.is_empty() {
        println!("No groups found.");
        return Ok(());
    }
    println!(
        "{:<6} {:<24} {:<24} {:<16} {:<20} {:>9}",
        "ID", "NAME", "COURSE", "FILIA", "STATUS", "STUDENTS"
    );
    for view in &views {
        println!(
            "{:<6} {:<24} {:<24} {:<16} {:<20} {:>4}/{:<4}",
            view.group.id.to_string(),
            view.group.name,
            view.course.name,
            view.filia.name,
            view.group.status.as_str(),
            view.group.students.len(),
            view.group.group_size
        );
    }
    Ok(())
}

// =============================================================================
// MAINTENANCE
// =============================================================================

/// Compact the database file.
pub fn cmd_compact(db_path: &Path, backend: Backend, json_mode: bool) -> Result<(), AppError> {
    let mut school = open_school(db_path, backend)?;
    let compacted = school.compact()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend.as_str(),
            "compacted": compacted,
        }));
    } else if compacted {
        println!("Compacted {}", db_path.display());
    } else {
        println!("Nothing to compact for the {} backend", backend.as_str());
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!(Backend::parse("redb").ok(), Some(Backend::Redb));
        assert_eq!(Backend::parse(" Memory ").ok(), Some(Backend::Memory));
        assert!(matches!(Backend::parse("file"), Err(AppError::Usage(_))));
    }

    #[test]
    fn init_refuses_existing_database_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("school.redb");

        cmd_init(&db, Backend::Redb, false, true).expect("first init");
        assert!(matches!(
            cmd_init(&db, Backend::Redb, false, true),
            Err(AppError::Usage(_))
        ));
        cmd_init(&db, Backend::Redb, true, true).expect("forced init");

        let school = open_school(&db, Backend::Redb).expect("open");
        assert!(!Catalog::experiences(&school).expect("experiences").is_empty());
    }

    #[test]
    fn admin_commands_persist_to_redb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("school.redb");
        cmd_init(&db, Backend::Redb, false, true).expect("init");

        cmd_create_user(
            &db,
            Backend::Redb,
            true,
            NewUserArgs {
                email: "pm@school.test".into(),
                first_name: "Pat".into(),
                last_name: "Lee".into(),
                phone: "(050) 123-45-67".into(),
                password: "changeme123".into(),
                role: "program".into(),
            },
        )
        .expect("create user");
        cmd_add_filia(
            &db,
            Backend::Redb,
            true,
            &FiliaForm {
                name: "Podil".into(),
                city: "Kyiv".into(),
                address: "Sahaidachnoho 1".into(),
                description: String::new(),
            },
        )
        .expect("add filia");

        let school = open_school(&db, Backend::Redb).expect("open");
        let counts = school.counts().expect("counts");
        assert_eq!(counts.users, 1);
        assert_eq!(counts.filias, 1);
        let user = Accounts::find_by_email(&school, "pm@school.test")
            .expect("lookup")
            .expect("user exists");
        assert!(user.role.is_manager());
    }

    #[test]
    fn set_active_blocks_login_and_compact_keeps_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("school.redb");
        cmd_init(&db, Backend::Redb, false, true).expect("init");
        cmd_create_user(
            &db,
            Backend::Redb,
            true,
            NewUserArgs {
                email: "s1@school.test".into(),
                first_name: "Sam".into(),
                last_name: "Doe".into(),
                phone: "(050) 123-45-67".into(),
                password: "changeme123".into(),
                role: "student".into(),
            },
        )
        .expect("create user");

        cmd_set_active(&db, Backend::Redb, true, "s1@school.test", false).expect("deactivate");
        cmd_compact(&db, Backend::Redb, true).expect("compact");

        let school = open_school(&db, Backend::Redb).expect("open");
        let user = Accounts::find_by_email(&school, "s1@school.test")
            .expect("lookup")
            .expect("user exists");
        assert!(!user.is_active);
        assert!(Accounts::authenticate(&school, "s1@school.test", "changeme123").is_err());
        drop(school);

        cmd_set_active(&db, Backend::Redb, true, "s1@school.test", true).expect("reactivate");
        let school = open_school(&db, Backend::Redb).expect("open");
        assert!(Accounts::authenticate(&school, "s1@school.test", "changeme123").is_ok());
    }

    #[test]
    fn set_active_unknown_email_is_a_usage_error() {
        let result = cmd_set_active(
            Path::new("unused.redb"),
            Backend::Memory,
            true,
            "ghost@school.test",
            false,
        );
        assert!(matches!(result, Err(AppError::Usage(_))));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = cmd_create_user(
            Path::new("unused.redb"),
            Backend::Memory,
            true,
            NewUserArgs {
                email: "x@school.test".into(),
                first_name: "X".into(),
                last_name: "Y".into(),
                phone: "(050) 123-45-67".into(),
                password: "changeme123".into(),
                role: "janitor".into(),
            },
        );
        assert!(matches!(result, Err(AppError::School(_))));
    }

    #[test]
    fn groups_rejects_unknown_status() {
        let result = cmd_groups(Path::new("unused.redb"), Backend::Memory, true, Some("paused"));
        assert!(matches!(result, Err(AppError::School(_))));
    }
}
