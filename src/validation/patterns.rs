//! Content pattern sets.
//!
//! The sets are heuristic and overlap; callers must test them in a fixed order
//! so that the reported category is stable.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static content pattern"))
        .collect()
}

static CODE_INJECTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bimport\s+",
        r"(?i)\brequire\s*\(",
        r"(?i)\beval\s*\(",
        r"(?i)\bfunction\s*\(",
        r"=>\s*\{",
        r"(?i)\bnew\s+Function\b",
        r"(?i)\bset(?:Timeout|Interval)\s*\(",
        r"\bprocess\s*[.\[]",
        r"(?:^|\W)__\w+",
        r"\bthis\s*[.\[]",
        r"(?i)\bconstructor\b",
        r"(?i)\bprototype\b",
    ])
});

static MARKUP_INJECTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)<\s*script\b",
        r"(?i)<\s*iframe\b",
        r"(?i)javascript\s*:",
        r#"(?i)(?:^|[\s<"'/])on[a-z]+\s*="#,
    ])
});

static INVITE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)discord(?:\.gg|(?:app)?\.com/invite)/([A-Za-z0-9-]*)")
        .expect("static invite pattern")
});

static LINK_SERVICES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        // Shorteners
        r"(?i)\bbit\.ly\b",
        r"(?i)tinyurl",
        // IP loggers
        r"(?i)grabify",
        r"(?i)iplogger",
    ])
});

static SCAM_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)free.*nitro",
        r"(?i)steam.*gift",
        r"(?i)claim.*prize",
        r"(?i)verify.*account",
    ])
});

pub fn contains_code_injection(text: &str) -> bool {
    CODE_INJECTION.iter().any(|p| p.is_match(text))
}

pub fn contains_markup_injection(text: &str) -> bool {
    MARKUP_INJECTION.iter().any(|p| p.is_match(text))
}

/// Invite links are suspicious unless their code is whitelisted.
pub fn contains_suspicious_link(text: &str, invite_whitelist: &[String]) -> bool {
    let bad_invite = INVITE_LINK.captures_iter(text).any(|caps| {
        let code = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        !invite_whitelist
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(code))
    });
    bad_invite || LINK_SERVICES.iter().any(|p| p.is_match(text))
}

pub fn contains_scam(text: &str) -> bool {
    SCAM_PHRASES.iter().any(|p| p.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_injection() {
        for input in [
            "eval(x)",
            "require('fs')",
            "import os",
            "function() { }",
            "x => { y }",
            "new Function('a')",
            "setTimeout(f, 1)",
            "process.exit()",
            "a.__proto__",
            "this.constructor",
            "Object.prototype",
        ] {
            assert!(contains_code_injection(input), "{input}");
        }
        for input in ["2+2", "sqrt(16) * 3", "what is this", "the process of learning"] {
            assert!(!contains_code_injection(input), "{input}");
        }
    }

    #[test]
    fn test_markup_injection() {
        assert!(contains_markup_injection("<script>alert(1)</script>"));
        assert!(contains_markup_injection("<IFRAME src=x>"));
        assert!(contains_markup_injection("JavaScript:alert(1)"));
        assert!(contains_markup_injection("<img src=x onerror=alert(1)>"));
        assert!(!contains_markup_injection("a < b and c > d"));
    }

    #[test]
    fn test_suspicious_links() {
        let whitelist = vec!["official".to_string()];
        assert!(contains_suspicious_link("join discord.gg/abc123", &whitelist));
        assert!(contains_suspicious_link("https://discord.com/invite/raid", &whitelist));
        assert!(!contains_suspicious_link("discord.gg/official", &whitelist));
        assert!(contains_suspicious_link("see bit.ly/xyz", &whitelist));
        assert!(contains_suspicious_link("grabify.link/abc", &whitelist));
        assert!(!contains_suspicious_link("https://example.com", &whitelist));
    }

    #[test]
    fn test_scam_phrases() {
        assert!(contains_scam("Get FREE discord nitro now"));
        assert!(contains_scam("claim your prize"));
        assert!(contains_scam("please verify your account"));
        assert!(!contains_scam("I bought nitro yesterday"));
    }
}
