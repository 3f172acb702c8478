/// Validate a role name: required, at most 100 chars, no control characters.
pub fn validate_role_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Some("Role name is required".to_string());
    }
    if trimmed.chars().count() > 100 {
        return Some("Role name must be at most 100 characters".to_string());
    }
    if trimmed.chars().any(char::is_control) {
        return Some("Role name may not contain control characters".to_string());
    }
    None
}

/// Validate an optional email: empty is OK, otherwise must contain '@' and '.'.
pub fn validate_optional_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("Email must be a valid address (contain '@' and '.')".to_string());
    }
    None
}

/// Validate a monetary amount: finite and not negative.
pub fn validate_amount(amount: f64) -> Option<String> {
    if !amount.is_finite() {
        return Some("Amount must be a number".to_string());
    }
    if amount < 0.0 {
        return Some("Amount must not be negative".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}
