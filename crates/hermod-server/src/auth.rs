//! Login credential checks.
//!
//! A deliberately small pass/fail lookup over an in-memory table: there are
//! no sessions or tokens, and the check runs once at login time before any
//! hub interaction.

use std::collections::HashMap;

/// Username/password lookup service.
#[derive(Debug, Clone, Default)]
pub struct AuthService {
    users: HashMap<String, String>,
}

impl AuthService {
    /// Create a service over the given username/password table.
    #[must_use]
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// Check whether the username and password are valid.
    #[must_use]
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(HashMap::from([(
            "alice".to_string(),
            "password123".to_string(),
        )]))
    }

    #[test]
    fn test_authenticate_valid() {
        assert!(service().authenticate("alice", "password123"));
    }

    #[test]
    fn test_authenticate_wrong_password() {
        assert!(!service().authenticate("alice", "letmein"));
    }

    #[test]
    fn test_authenticate_unknown_user() {
        assert!(!service().authenticate("mallory", "password123"));
    }
}
