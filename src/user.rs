//! Code for creating the user table and storing and fetching users.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, FieldError, PasswordHash, validation::has_length_between};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

const USER_NAME_MIN_LENGTH: usize = 7;
const USER_NAME_MAX_LENGTH: usize = 15;

/// The unique handle a user logs in with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserName(String);

impl UserName {
    /// Create a user name.
    ///
    /// # Errors
    ///
    /// This function will return an error if `name` is not between 7 and 15
    /// characters long.
    pub fn new(name: &str) -> Result<Self, FieldError> {
        if has_length_between(name, USER_NAME_MIN_LENGTH, USER_NAME_MAX_LENGTH) {
            Ok(Self(name.to_owned()))
        } else {
            Err(FieldError::new(
                "handle",
                "handle must be between 7 and 15 characters long",
            ))
        }
    }

    /// Create a user name without validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the length invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` and `user_name` are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The handle the user logs in with.
    pub user_name: UserName,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub registered_at: OffsetDateTime,
}

/// The data needed to add a user to a [UserStore].
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The handle the user logs in with.
    pub user_name: UserName,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub registered_at: OffsetDateTime,
}

/// Handles the creation and retrieval of [User]s.
pub trait UserStore {
    /// Add a new user to the store.
    fn create(&self, new_user: NewUser) -> Result<User, Error>;

    /// Get a user by their handle.
    ///
    /// Returns [Error::NotFound] if no user has the handle `user_name`.
    fn get_by_name(&self, user_name: &str) -> Result<User, Error>;
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                user_name TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                registered_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Errors
    ///
    /// Returns a [Error::SqlError] if an SQL related error occurred, e.g. the
    /// handle is already taken.
    fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        let registered_at = new_user.registered_at.to_offset(time::UtcOffset::UTC);

        connection.execute(
            "INSERT INTO user (user_name, password, registered_at) VALUES (?1, ?2, ?3)",
            (
                new_user.user_name.as_ref(),
                new_user.password_hash.as_ref(),
                registered_at,
            ),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User {
            id,
            user_name: new_user.user_name,
            password_hash: new_user.password_hash,
            registered_at,
        })
    }

    /// Get the user from the database with the handle `user_name`.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - `user_name` does not belong to a registered user.
    /// - there was an error trying to access the store.
    fn get_by_name(&self, user_name: &str) -> Result<User, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(
                "SELECT id, user_name, password, registered_at FROM user WHERE user_name = :user_name",
            )?
            .query_row(&[(":user_name", user_name)], map_user_row)
            .map_err(|error| error.into())
    }
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_user_name: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let registered_at = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        user_name: UserName::new_unchecked(&raw_user_name),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        registered_at,
    })
}
