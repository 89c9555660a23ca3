//! # Accounts
//!
//! User registration, staff creation, password checks and role helpers.
//!
//! Salts are supplied by the caller so the core stays free of entropy
//! sources. The binary draws them from random UUIDs.

use crate::model::{PasswordHash, User};
use crate::primitives::{
    MAX_PASSWORD_LENGTH, MAX_PERSON_NAME_LENGTH, MIN_PASSWORD_LENGTH, PASSWORD_CONTEXT,
    PASSWORD_ROUNDS, SALT_LENGTH,
};
use crate::store::WriteBatch;
use crate::validation::{FieldErrors, check_length, normalize_email, validate_phone};
use crate::{ManagerRole, Role, School, SchoolError, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Self-registration form for students.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password: String,
    pub password_confirm: String,
}

/// Account creation input for any role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password: String,
    pub role: Role,
}

/// The Accounts engine handles user records and credentials.
pub struct Accounts;

impl Accounts {
    /// Derive a password digest from a password and a salt.
    #[must_use]
    pub fn hash_password(password: &str, salt: [u8; SALT_LENGTH]) -> PasswordHash {
        let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
        hasher.update(&salt);
        hasher.update(password.as_bytes());
        let mut digest: [u8; 32] = hasher.finalize().into();

        for _ in 0..PASSWORD_ROUNDS {
            let mut round = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
            round.update(&digest);
            round.update(&salt);
            digest = round.finalize().into();
        }

        PasswordHash { salt, digest }
    }

    /// Check a password against a stored digest in constant time.
    #[must_use]
    pub fn verify_password(stored: &PasswordHash, password: &str) -> bool {
        if password.len() > MAX_PASSWORD_LENGTH {
            return false;
        }
        let candidate = Self::hash_password(password, stored.salt);
        candidate.digest.ct_eq(&stored.digest).into()
    }

    /// Register a student from the public registration form.
    pub fn register_student(
        school: &mut School,
        form: &RegistrationForm,
        salt: [u8; SALT_LENGTH],
    ) -> Result<User, SchoolError> {
        let mut errors = FieldErrors::new();
        if form.password != form.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }

        let new_user = NewUser {
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone_number: form.phone_number.clone(),
            password: form.password.clone(),
            role: Role::Student,
        };
        Self::create_with_errors(school, &new_user, salt, errors)
    }

    /// Create an account with any role. Managers are staff.
    pub fn create_user(
        school: &mut School,
        new_user: &NewUser,
        salt: [u8; SALT_LENGTH],
    ) -> Result<User, SchoolError> {
        Self::create_with_errors(school, new_user, salt, FieldErrors::new())
    }

    fn create_with_errors(
        school: &mut School,
        new_user: &NewUser,
        salt: [u8; SALT_LENGTH],
        mut errors: FieldErrors,
    ) -> Result<User, SchoolError> {
        let email = match normalize_email(&new_user.email) {
            Ok(email) => Some(email),
            Err(msg) => {
                errors.add("email", msg);
                None
            }
        };
        errors.check(
            "first_name",
            check_length(&new_user.first_name, 1, MAX_PERSON_NAME_LENGTH),
        );
        errors.check(
            "last_name",
            check_length(&new_user.last_name, 1, MAX_PERSON_NAME_LENGTH),
        );
        errors.check("phone_number", validate_phone(new_user.phone_number.trim()));
        errors.check(
            "password",
            check_length(&new_user.password, MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH),
        );

        if let Some(email) = &email
            && Self::find_by_email(school, email)?.is_some()
        {
            errors.add("email", "A user with that email already exists.");
        }
        errors.into_result()?;

        let email = email.ok_or_else(|| SchoolError::field("email", "This field is required."))?;
        let user = User {
            id: UserId(school.next_id::<User>()),
            email,
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            phone_number: new_user.phone_number.trim().to_string(),
            password: Self::hash_password(&new_user.password, salt),
            role: new_user.role,
            is_active: true,
            is_staff: new_user.role.is_manager(),
            joined_at: Utc::now(),
        };

        let mut batch = WriteBatch::new();
        batch.put(&user)?;
        school.commit(batch)?;

        tracing::info!(user = %user.id, role = user.role.dashboard(), "account created");
        Ok(user)
    }

    /// Check credentials and return the matching active account.
    pub fn authenticate(
        school: &School,
        email: &str,
        password: &str,
    ) -> Result<User, SchoolError> {
        let email = normalize_email(email).map_err(|_| SchoolError::InvalidCredentials)?;
        let Some(user) = Self::find_by_email(school, &email)? else {
            return Err(SchoolError::InvalidCredentials);
        };
        if !Self::verify_password(&user.password, password) {
            return Err(SchoolError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(SchoolError::InactiveAccount);
        }
        Ok(user)
    }

    /// Find an account by (normalized) email, ignoring case.
    pub fn find_by_email(school: &School, email: &str) -> Result<Option<User>, SchoolError> {
        Ok(school
            .list::<User>()?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// All accounts holding a role, ordered by last then first name.
    pub fn users_with_role(school: &School, role: Role) -> Result<Vec<User>, SchoolError> {
        let mut users: Vec<User> = school
            .list::<User>()?
            .into_iter()
            .filter(|u| u.role == role)
            .collect();
        users.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str(), a.id)
                .cmp(&(b.last_name.as_str(), b.first_name.as_str(), b.id))
        });
        Ok(users)
    }

    /// Activate or deactivate an account.
    pub fn set_active(school: &mut School, user: UserId, active: bool) -> Result<User, SchoolError> {
        let mut record = school.require::<User>(user.0)?;
        record.is_active = active;
        let mut batch = WriteBatch::new();
        batch.put(&record)?;
        school.commit(batch)?;
        Ok(record)
    }
}

// =============================================================================
// ROLE CHECKS
// =============================================================================

#[must_use]
pub fn is_student(user: &User) -> bool {
    user.role == Role::Student
}

#[must_use]
pub fn is_teacher(user: &User) -> bool {
    user.role == Role::Teacher
}

#[must_use]
pub fn is_education_manager(user: &User) -> bool {
    user.role == Role::Manager(ManagerRole::Education)
}

#[must_use]
pub fn is_program_manager(user: &User) -> bool {
    user.role == Role::Manager(ManagerRole::Program)
}

/// Dashboard a user lands on after login.
#[must_use]
pub fn dashboard_role(user: &User) -> &'static str {
    user.role.dashboard()
}

// =============================================================================
// TESTS
// =============================================================================
