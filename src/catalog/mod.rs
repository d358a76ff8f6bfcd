//! Categories and payment methods: named reference records that account book
//! entries point to.
//!
//! Both kinds share the same shape and the same uniqueness rule, so they are
//! handled by one set of types parameterised by [CatalogKind].

mod core;
mod create_endpoint;
mod store;

pub use core::{
    CatalogEntry, CatalogKind, CatalogName, CatalogStore, NewCatalogEntry, create_catalog_entry,
};
pub use create_endpoint::{create_category_endpoint, create_payment_method_endpoint};
pub use store::{SQLiteCatalogStore, create_catalog_tables};
