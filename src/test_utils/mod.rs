#![allow(missing_docs)]

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, DatabaseId, PasswordHash, User, UserName, ValidatedPassword,
    catalog::{CatalogKind, CatalogName, CatalogStore, NewCatalogEntry, SQLiteCatalogStore},
    user::{NewUser, SQLiteUserStore, UserStore},
};

pub(crate) const TEST_JWT_SECRET: &str = "foobar";

/// An app state over a fresh in-memory database with the cheapest bcrypt cost.
pub(crate) fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database.");

    AppState::new(connection, TEST_JWT_SECRET, 4).expect("Could not create app state.")
}

pub(crate) fn insert_test_user(state: &AppState, user_name: &str, password: &str) -> User {
    SQLiteUserStore::new(state.db_connection.clone())
        .create(NewUser {
            user_name: UserName::new_unchecked(user_name),
            password_hash: PasswordHash::new(ValidatedPassword::new_unchecked(password), 4)
                .expect("Could not hash password."),
            registered_at: OffsetDateTime::now_utc(),
        })
        .expect("Could not insert test user.")
}

pub(crate) fn insert_test_catalog_entry(
    state: &AppState,
    kind: CatalogKind,
    name: &str,
) -> DatabaseId {
    SQLiteCatalogStore::new(state.db_connection.clone(), kind)
        .create(NewCatalogEntry {
            name: CatalogName::new_unchecked(name),
            label: None,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        })
        .expect("Could not insert catalog entry.")
        .id
}
