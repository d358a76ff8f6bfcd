//! Defines the catalog entry model and the uniqueness-checked create operation.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{DatabaseId, Error, FieldError, validation::has_length_between};

/// Which catalog an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// What a transaction was for, e.g. "food".
    Category,
    /// How a transaction was paid, e.g. "card".
    PaymentMethod,
}

impl CatalogKind {
    /// The database table holding entries of this kind.
    pub fn table(self) -> &'static str {
        match self {
            CatalogKind::Category => "category",
            CatalogKind::PaymentMethod => "payment_method",
        }
    }

    /// The name shown to users in messages.
    pub fn display_name(self) -> &'static str {
        match self {
            CatalogKind::Category => "category",
            CatalogKind::PaymentMethod => "payment method",
        }
    }

    /// The prefix used when logging operations on this kind.
    pub fn log_tag(self) -> &'static str {
        match self {
            CatalogKind::Category => "category",
            CatalogKind::PaymentMethod => "paymentMethod",
        }
    }

    /// The maximum number of characters in a name.
    pub fn max_name_length(self) -> usize {
        match self {
            CatalogKind::Category => 50,
            CatalogKind::PaymentMethod => 30,
        }
    }
}

/// The unique name of a catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CatalogName(String);

impl CatalogName {
    /// Create a catalog name for the catalog `kind`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `name` is empty or longer than
    /// [CatalogKind::max_name_length].
    pub fn new(kind: CatalogKind, name: &str) -> Result<Self, FieldError> {
        if has_length_between(name, 1, kind.max_name_length()) {
            Ok(Self(name.to_owned()))
        } else {
            Err(FieldError {
                field: "name",
                message: format!(
                    "{} name must be between 1 and {} characters long",
                    kind.display_name(),
                    kind.max_name_length()
                ),
            })
        }
    }

    /// Create a catalog name without validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the length invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CatalogName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CatalogName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category or payment method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// The ID of the entry.
    pub id: DatabaseId,
    /// The unique name, e.g. "food".
    pub name: CatalogName,
    /// An optional human readable label, e.g. "Food".
    pub label: Option<String>,
    /// Whether the entry can be used for new records.
    pub is_active: bool,
    /// When the entry was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data needed to add an entry to a [CatalogStore].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogEntry {
    /// The unique name of the entry.
    pub name: CatalogName,
    /// An optional human readable label.
    pub label: Option<String>,
    /// Whether the entry can be used for new records.
    pub is_active: bool,
    /// When the entry was created.
    pub created_at: OffsetDateTime,
}

/// Creates and retrieves entries of a single [CatalogKind].
pub trait CatalogStore {
    /// The kind of entries held by this store.
    fn kind(&self) -> CatalogKind;

    /// Add a new entry to the store.
    fn create(&self, entry: NewCatalogEntry) -> Result<CatalogEntry, Error>;

    /// Get an entry by its exact name.
    ///
    /// Returns [Error::NotFound] if there is no entry named `name`.
    fn get_by_name(&self, name: &str) -> Result<CatalogEntry, Error>;
}

/// Create a new, active catalog entry unless one with the same name exists.
///
/// The name check and the insert are separate statements, so two concurrent
/// requests for the same name can both pass the check. The unique constraint
/// on the table then rejects the second insert, which is reported as
/// [Error::Persistence] rather than [Error::DuplicateName].
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateName] if an entry named `name` already exists,
/// - [Error::Persistence] if the store failed; the cause is logged.
pub fn create_catalog_entry<S: CatalogStore>(
    name: CatalogName,
    label: Option<String>,
    store: &S,
) -> Result<CatalogEntry, Error> {
    let kind = store.kind();
    let log_tag = kind.log_tag();

    match store.get_by_name(name.as_ref()) {
        Ok(_) => {
            tracing::warn!("{log_tag} CREATE - Attempted to create duplicate name: {name}");
            return Err(Error::DuplicateName {
                kind: kind.display_name(),
                name: name.to_string(),
            });
        }
        Err(Error::NotFound) => {}
        Err(error) => {
            tracing::error!("{log_tag} CREATE - Could not check for existing name {name}: {error}");
            return Err(Error::Persistence(kind.display_name()));
        }
    }

    store
        .create(NewCatalogEntry {
            name,
            label,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        })
        .map_err(|error| {
            tracing::error!("{log_tag} CREATE - {error}");
            Error::Persistence(kind.display_name())
        })
}
