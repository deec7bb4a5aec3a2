//! Phone number normalization into WhatsApp Web chat ids.
//!
//! Individual chats are addressed as `<digits>@c.us`, groups as `<id>@g.us`.
//! There is no locale database: a single configured country code is applied
//! to every number that does not already carry it.

use crate::error::GatewayError;

/// Address suffix for one-to-one chats.
pub const USER_SUFFIX: &str = "@c.us";

/// Address suffix for group chats.
pub const GROUP_SUFFIX: &str = "@g.us";

/// A resolved message recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A phone-derived individual chat id (`5511999887766@c.us`).
    Individual(String),
    /// A group chat id (`120363001234567890@g.us`).
    Group(String),
}

impl Recipient {
    /// Build an individual recipient from a raw, user-typed phone number.
    pub fn individual(raw: &str, country_code: &str) -> Result<Self, GatewayError> {
        format_phone_number(raw, country_code).map(Self::Individual)
    }

    /// Build a group recipient from an explicit id. No existence check is made.
    pub fn group(id: &str) -> Self {
        Self::Group(format_group_id(id))
    }

    /// The chat id to hand to the messaging client.
    pub fn id(&self) -> &str {
        match self {
            Self::Individual(id) | Self::Group(id) => id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

/// Normalize a raw phone number into an individual chat id.
///
/// Strips every non-digit, drops leading zeros (national trunk prefix or the
/// `00` international exit code), prepends `country_code` unless the number
/// already starts with it, and appends [`USER_SUFFIX`].
///
/// Formatting an already formatted id returns it unchanged.
pub fn format_phone_number(raw: &str, country_code: &str) -> Result<String, GatewayError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(GatewayError::InvalidNumber(raw.to_string()));
    }
    let national = digits.trim_start_matches('0');

    let canonical = if national.starts_with(country_code) {
        national.to_string()
    } else {
        format!("{country_code}{national}")
    };

    Ok(format!("{canonical}{USER_SUFFIX}"))
}

/// Normalize an explicit group id. Ids that already carry a server part are
/// used verbatim.
pub fn format_group_id(id: &str) -> String {
    let id = id.trim();
    if id.contains('@') {
        id.to_string()
    } else {
        format!("{id}{GROUP_SUFFIX}")
    }
}

/// Whether `code` is usable as a default country code.
pub fn is_valid_country_code(code: &str) -> bool {
    !code.is_empty() && !code.starts_with('0') && code.chars().all(|c| c.is_ascii_digit())
}
