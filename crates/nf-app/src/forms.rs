//! Sign-in and sign-up forms.

use tracing::warn;

use nf_client::ClientError;

use crate::error::ValidationError;
use crate::guard::Route;
use crate::session::AuthSession;

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MIN_PASSWORD_CHARS: usize = 6;

pub fn validate_registration(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(ValidationError::UsernameTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Reword a failed login for display.
pub fn login_error_message(e: &ClientError) -> String {
    let message = e.to_string();
    if message.contains("Invalid credentials") || message.contains("401") {
        "Invalid username or password".to_string()
    } else {
        common_error_message(message, "Login failed. Please try again.")
    }
}

/// Reword a failed sign-up for display.
pub fn register_error_message(e: &ClientError) -> String {
    let message = e.to_string();
    if message.contains("already exists") {
        "Username already taken. Try another one".to_string()
    } else {
        common_error_message(message, "Registration failed. Please try again.")
    }
}

fn common_error_message(message: String, fallback: &str) -> String {
    if message.contains("Network") {
        "Network error. Please check your connection".to_string()
    } else if message.contains("404") {
        "Server not found. Please check API URL".to_string()
    } else if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub username: String,
    pub password: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Disabled while a field is empty or a request is running.
    pub fn can_submit(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.loading
    }

    /// On success returns where to go next. On failure the friendly message
    /// is left in `error`.
    pub async fn submit_login(&mut self, session: &AuthSession) -> Option<Route> {
        if !self.can_submit() {
            return None;
        }
        self.loading = true;
        self.error = None;
        let result = session.login(&self.username, &self.password).await;
        self.loading = false;

        match result {
            Ok(()) => Some(Route::Feed),
            Err(e) => {
                warn!(username = %self.username, "login failed: {}", e);
                self.error = Some(login_error_message(&e));
                None
            }
        }
    }

    pub async fn submit_register(&mut self, session: &AuthSession) -> Option<Route> {
        if !self.can_submit() {
            return None;
        }
        if let Err(e) = validate_registration(&self.username, &self.password) {
            self.error = Some(e.to_string());
            return None;
        }
        self.loading = true;
        self.error = None;
        let result = session.register(&self.username, &self.password).await;
        self.loading = false;

        match result {
            Ok(()) => Some(Route::Feed),
            Err(e) => {
                warn!(username = %self.username, "registration failed: {}", e);
                self.error = Some(register_error_message(&e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(msg: &str) -> ClientError {
        ClientError::RequestFailed(msg.to_string())
    }

    #[test]
    fn test_registration_rules() {
        assert_eq!(validate_registration("al", "secret1"), Err(ValidationError::UsernameTooShort));
        assert_eq!(validate_registration("alice", "12345"), Err(ValidationError::PasswordTooShort));
        assert_eq!(validate_registration("ali", "123456"), Ok(()));
    }

    #[test]
    fn test_login_messages() {
        assert_eq!(login_error_message(&failed("Invalid credentials")), "Invalid username or password");
        assert_eq!(login_error_message(&failed("401 Unauthorized")), "Invalid username or password");
        assert_eq!(
            login_error_message(&failed("Network error: connection refused")),
            "Network error. Please check your connection"
        );
        assert_eq!(
            login_error_message(&failed("404 Not Found")),
            "Server not found. Please check API URL"
        );
        assert_eq!(login_error_message(&failed("Account locked")), "Account locked");
        assert_eq!(login_error_message(&failed("")), "Login failed. Please try again.");
    }

    #[test]
    fn test_register_messages() {
        assert_eq!(
            register_error_message(&failed("Username already exists")),
            "Username already taken. Try another one"
        );
        // 401 only has a special meaning for login
        assert_eq!(register_error_message(&failed("401 Unauthorized")), "401 Unauthorized");
    }

    #[test]
    fn test_can_submit() {
        assert!(!AuthForm::new("", "x").can_submit());
        assert!(!AuthForm::new("x", "").can_submit());
        let mut form = AuthForm::new("x", "y");
        assert!(form.can_submit());
        form.loading = true;
        assert!(!form.can_submit());
    }
}
