//! Suspicious username heuristics.

use once_cell::sync::Lazy;
use regex::Regex;

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Invite links
        r"(?i)discord\.(gg|com/invite)",
        // Nitro scams
        r"(?i)nitro",
        r"(?i)free.*nitro",
        // Long digit runs
        r"\d{10,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static username pattern"))
    .collect()
});

const MAX_REPEAT: usize = 6;

fn has_repeated_run(name: &str, run: usize) -> bool {
    let mut chars = name.chars();
    let Some(mut prev) = chars.next() else {
        return false;
    };
    let mut count = 1;
    for c in chars {
        if c == prev {
            count += 1;
            if count >= run {
                return true;
            }
        } else {
            prev = c;
            count = 1;
        }
    }
    count >= run
}

/// True if `name` looks like a scam or raid account.
pub fn detect_suspicious_username(name: &str) -> bool {
    PATTERNS.iter().any(|p| p.is_match(name)) || has_repeated_run(name, MAX_REPEAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspicious_names() {
        assert!(detect_suspicious_username("join discord.gg/abc"));
        assert!(detect_suspicious_username("FREE NITRO here"));
        assert!(detect_suspicious_username("user12345678901"));
        assert!(detect_suspicious_username("aaaaaaa"));
        assert!(detect_suspicious_username("xx______"));
    }

    #[test]
    fn test_ordinary_names() {
        assert!(!detect_suspicious_username("alan_turing"));
        assert!(!detect_suspicious_username("player123"));
        assert!(!detect_suspicious_username("aaaaab"));
        assert!(!detect_suspicious_username(""));
    }
}
