//! Field-format checks shared by every handler (spec §4.4 "field-presence
//! and format checks"), grounded in the teacher's `AuthService::is_valid_email`
//! / `is_valid_password` (`src/routes/auth.rs`).

use crate::constants::password::MIN_LENGTH;

/// Minimal addr-spec check: requires an `@` not at either end and a `.` in
/// the domain part. Not a full RFC 5322 parser — the teacher's own check is
/// this permissive, and a stricter one would reject real addresses a mail
/// server would accept.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() <= 5 {
        return false;
    }
    let Some(at_pos) = email.find('@') else {
        return false;
    };
    if at_pos == 0 || at_pos == email.len() - 1 {
        return false;
    }
    let domain_part = &email[at_pos + 1..];
    domain_part.contains('.')
}

/// Password minimum length (spec §4.4: "Password minimum length is 8").
#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    password.len() >= MIN_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_at() {
        assert!(!is_valid_email("not-an-email"));
    }

    #[test]
    fn rejects_missing_domain_dot() {
        assert!(!is_valid_email("a@localhost"));
    }

    #[test]
    fn accepts_plain_address() {
        assert!(is_valid_email("a@b.co"));
    }

    #[test]
    fn enforces_minimum_length() {
        assert!(!is_valid_password("short"));
        assert!(is_valid_password("pw_12345"));
    }
}
