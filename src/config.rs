//! Settings read from the environment at start up.

use crate::{Error, PasswordHash};

/// The environment variable holding the secret used to sign bearer tokens.
pub const JWT_SECRET_VAR: &str = "JWT_SECRET";

/// The environment variable holding the bcrypt cost used when hashing passwords.
pub const BCRYPT_COST_VAR: &str = "BCRYPT_SALT_ROUND";

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Parse the bcrypt cost from the raw value of [BCRYPT_COST_VAR].
///
/// An unset variable gives [PasswordHash::DEFAULT_COST].
///
/// # Errors
///
/// Returns [Error::InvalidConfig] if the value is not an integer between 4
/// and 31 inclusive.
pub fn parse_password_cost(raw_value: Option<&str>) -> Result<u32, Error> {
    let Some(raw_value) = raw_value else {
        return Ok(PasswordHash::DEFAULT_COST);
    };

    let cost: u32 = raw_value.trim().parse().map_err(|_| {
        Error::InvalidConfig(format!(
            "{BCRYPT_COST_VAR} must be an integer, got \"{raw_value}\""
        ))
    })?;

    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(Error::InvalidConfig(format!(
            "{BCRYPT_COST_VAR} must be between {MIN_COST} and {MAX_COST}, got {cost}"
        )));
    }

    Ok(cost)
}
