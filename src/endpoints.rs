//! The API endpoints URIs.

/// The route to register users.
pub const USERS: &str = "/users";
/// The route for logging in a user and receiving a bearer token.
pub const LOG_IN: &str = "/users/login";
/// The route to create a category.
pub const CATEGORY: &str = "/category";
/// The route to create a payment method.
pub const PAYMENT_METHOD: &str = "/payment-method";
/// The route to create an account book entry.
pub const ACCOUNT_BOOK: &str = "/account-book";
/// The route to search account book entries by date.
pub const ACCOUNT_BOOK_SEARCH: &str = "/account-book/search";
/// The route to get a single account book entry.
pub const ACCOUNT_BOOK_ENTRY: &str = "/account-book/{idx}";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// Returns `endpoint_path` unchanged if it has no parameter.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
