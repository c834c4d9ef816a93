//! Email sending abstractions

pub mod console;
pub mod smtp;

pub use console::ConsoleEmailSender;
pub use smtp::{SmtpConfig, SmtpEmailSender};

/// Trait for sending auth-related emails
pub trait EmailSender: Send + Sync {
    /// Send a password-reset link to an email address
    fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), String>;
}

/// Allow using Box<dyn EmailSender> as an EmailSender
impl EmailSender for Box<dyn EmailSender> {
    fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), String> {
        (**self).send_password_reset(email, reset_url)
    }
}
