use crate::auth::MIN_PASSWORD_LENGTH;
use crate::server::response::ApiError;

const MAX_CLIENT_NAME_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 1000;

pub fn validate_client_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Client name cannot be empty"));
    }
    if name.len() > MAX_CLIENT_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Client name cannot exceed {MAX_CLIENT_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_reminder_message(message: &str) -> Result<(), ApiError> {
    if message.trim().is_empty() {
        return Err(ApiError::bad_request("Reminder message cannot be empty"));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::bad_request(format!(
            "Reminder message cannot exceed {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_registration(name: &str, email: &str, password: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Name, email, and password are required"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
