//! Login/credential pair a session authenticates with.

use std::fmt;

use rand::RngExt;

/// Password the server accepts for anonymous, read-only logins.
pub const ANONYMOUS_PASSWORD: &str = "SCHMOOPIIE";

const ANONYMOUS_LOGIN_PREFIX: &str = "justinfan";
const OAUTH_PREFIX: &str = "oauth:";

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// User access token, stored without the `oauth:` prefix.
    OAuth(String),
    Anonymous,
}

impl Credential {
    /// Value written on the `PASS` line.
    pub fn pass_value(&self) -> String {
        match self {
            Credential::OAuth(token) => format!("{}{}", OAUTH_PREFIX, token),
            Credential::Anonymous => ANONYMOUS_PASSWORD.to_string(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::OAuth(_) => f.write_str("OAuth(<redacted>)"),
            Credential::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Immutable for the life of a session; a different identity needs a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    login: String,
    credential: Credential,
}

impl Identity {
    /// An authenticated identity. The token may be given with or without the
    /// `oauth:` prefix.
    pub fn new(login: impl Into<String>, token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        let token = token.strip_prefix(OAUTH_PREFIX).unwrap_or(token);
        Self {
            login: login.into(),
            credential: Credential::OAuth(token.to_string()),
        }
    }

    /// A read-only identity with a random `justinfanNNNNN` login.
    pub fn anonymous() -> Self {
        Self {
            login: generate_anonymous_login(),
            credential: Credential::Anonymous,
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn is_anonymous(&self) -> bool {
        self.credential == Credential::Anonymous
    }
}

fn generate_anonymous_login() -> String {
    let mut rng = rand::rng();
    let num: u32 = rng.random_range(10_000..100_000);
    format!("{}{}", ANONYMOUS_LOGIN_PREFIX, num)
}
