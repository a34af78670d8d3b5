// Validation utilities for string fields

/// Trim, lowercase, and check the shape the credential service requires:
/// exactly one `@`, a non-empty local part, and a dotted domain.
pub fn normalize_email(raw: &str) -> Result<String, String> {
    let email = raw.trim().to_lowercase();
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err("email must contain exactly one '@'".to_string());
    }
    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() {
        return Err("email local part cannot be empty".to_string());
    }
    if !domain.contains('.') {
        return Err("email domain must be dotted".to_string());
    }
    Ok(email)
}

/// Passwords are handled as raw bytes, not code points, since bcrypt's
/// own input limit is byte-based.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.len();
    if !(8..=72).contains(&len) {
        return Err("password must be between 8 and 72 bytes".to_string());
    }
    Ok(())
}

pub fn validate_display_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("display name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 200 {
        return Err("display name must be at most 200 characters".to_string());
    }
    Ok(trimmed.to_string())
}

pub fn validate_note_title(raw: &str) -> Result<(), String> {
    if raw.chars().count() > 500 {
        return Err("title must be at most 500 characters".to_string());
    }
    Ok(())
}

pub fn validate_note_content(raw: &str) -> Result<(), String> {
    if raw.chars().count() > 500_000 {
        return Err("content must be at most 500,000 characters".to_string());
    }
    Ok(())
}

pub fn validate_todo_content(raw: &str) -> Result<(), String> {
    if raw.chars().count() > 10_000 {
        return Err("content must be at most 10,000 characters".to_string());
    }
    Ok(())
}
