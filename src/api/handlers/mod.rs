pub mod auth;
pub mod chat;
pub mod health;

pub use self::health::health;

// common functions for the handlers
use regex::Regex;

/// Basic `local@domain.tld` shape check.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}
