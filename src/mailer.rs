use crate::error::AppError;

/// Outbound mail seam. Only password reset links are sent today.
pub trait Mailer: Send + Sync {
    fn send_password_reset(&self, to: &str, name: &str, reset_link: &str) -> Result<(), AppError>;
}

/// Writes the message to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_password_reset(&self, to: &str, name: &str, reset_link: &str) -> Result<(), AppError> {
        log::info!(
            "password reset for {} <{}>: {}",
            name,
            to,
            reset_link
        );
        Ok(())
    }
}

pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    )
}
