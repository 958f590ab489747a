// Target credentials
//
// Bearer tokens are looked up in:
// 1. System keychain (preferred)
// 2. The environment variable named by the target's `token_env`
//
// Tokens are NEVER stored in the run config file.

use std::env;

/// Service name for keychain storage
#[cfg_attr(not(feature = "keychain"), allow(dead_code))]
const KEYCHAIN_SERVICE: &str = "apiparity";

/// Where a token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Keychain,
    Environment,
    None,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Keychain => "keychain",
            TokenSource::Environment => "environment",
            TokenSource::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenLookup {
    pub token: Option<String>,
    pub source: TokenSource,
}

/// Keychain account name for a target
#[cfg_attr(not(feature = "keychain"), allow(dead_code))]
fn keychain_account(target: &str) -> String {
    format!("target/{}", target.to_lowercase())
}

/// Find the bearer token for `target`.
///
/// Checks the keychain first, then `env_name` when given. Empty values
/// count as missing.
pub fn lookup_token(target: &str, env_name: Option<&str>) -> TokenLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(target)) {
            if let Ok(token) = entry.get_password() {
                if !token.is_empty() {
                    return TokenLookup {
                        token: Some(token),
                        source: TokenSource::Keychain,
                    };
                }
            }
        }
    }

    if let Some(name) = env_name {
        if let Ok(token) = env::var(name) {
            if !token.is_empty() {
                return TokenLookup {
                    token: Some(token),
                    source: TokenSource::Environment,
                };
            }
        }
    }

    TokenLookup {
        token: None,
        source: TokenSource::None,
    }
}
