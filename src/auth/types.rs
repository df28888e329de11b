//! Token types

use std::fmt;

/// A static OAuth bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// The access token
    pub access_token: String,
}

impl Token {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Value of the `Authorization` header
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_authorization_value() {
        let token = Token::bearer("abc");
        assert_eq!(token.authorization_value(), "Bearer abc");
    }

    #[test]
    fn test_debug_hides_token() {
        let token = Token::bearer("dop_v1_secret");
        assert!(!format!("{token:?}").contains("dop_v1_secret"));
    }
}
