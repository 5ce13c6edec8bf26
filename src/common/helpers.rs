// Helper functions for safe logging, slugs and invite tokens

use rand::Rng;

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 {
            format!("{}***@{}", &parts[0][..1.min(parts[0].len())], parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Masks tokens for safe logging
/// Shows only first and last 4 characters
///
/// # Example
/// ```
/// let masked = safe_token_log("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9");
/// // Returns: "eyJh...kpXVCJ9"
/// ```
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

/// Builds a URL-safe slug from a display name.
///
/// Lowercases, maps every character outside `[a-z0-9-]` to `-`, collapses
/// runs of `-` and trims them from both ends. Can return an empty string
/// (e.g. a name of only diacritics); callers pick a fallback.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = false;

    for c in name.to_lowercase().chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if mapped == '-' {
            if !last_was_dash {
                slug.push('-');
            }
            last_was_dash = true;
        } else {
            slug.push(mapped);
            last_was_dash = false;
        }
    }

    slug.trim_matches('-').to_string()
}

/// Generates an invite token: 24 random bytes as 48 lowercase hex characters.
pub fn generate_invite_token() -> String {
    let bytes: [u8; 24] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
