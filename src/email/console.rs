//! Console-based email sender for development

use super::EmailSender;

/// Email sender that logs to console (for development)
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailSender for ConsoleEmailSender {
    fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  PASSWORD RESET FOR: {}", email);
        println!("  LINK: {}", reset_url);
        println!("========================================");
        println!();

        tracing::info!(email = %email, "Password reset link sent");

        Ok(())
    }
}
