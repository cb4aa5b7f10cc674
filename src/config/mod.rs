pub mod paths;

/// Environment variable consulted for the account password before prompting.
pub const PASSWORD_ENV: &str = "ZBT_PASSWORD";
