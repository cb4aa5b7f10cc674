use serde::{Deserialize, Serialize};

/// A Zimbra account the CLI can talk to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub name: String,
    /// SOAP service URL, e.g. `https://mail.example.org/service/soap/`.
    pub url: String,
    pub username: String,
}

impl Default for AccountProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: "https://localhost/service/soap/".to_string(),
            username: String::new(),
        }
    }
}

impl AccountProfile {
    /// Apply command line overrides on top of a stored profile.
    pub fn with_overrides(mut self, url: Option<String>, username: Option<String>) -> Self {
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(username) = username {
            self.username = username;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let stored = AccountProfile {
            name: "work".to_string(),
            url: "https://a/service/soap/".to_string(),
            username: "bob".to_string(),
        };
        let p = stored.clone().with_overrides(None, Some("alice".to_string()));
        assert_eq!(p.url, stored.url);
        assert_eq!(p.username, "alice");
    }
}
