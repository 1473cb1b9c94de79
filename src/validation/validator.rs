use arc_swap::ArcSwap;
use std::sync::Arc;
use url::Url;

use crate::config::ValidationConfig;
use crate::validation::math;
use crate::validation::patterns;
use crate::validation::rejection::{Rejection, RejectionKind};
use crate::validation::sanitize;

const DANGEROUS_EXTENSIONS: &[&str] = &[
    ".exe", ".bat", ".cmd", ".com", ".pif", ".scr", ".vbs", ".js", ".jar", ".msi", ".app",
    ".deb", ".apk", ".dmg", ".pkg", ".sh", ".ps1",
];
const RESERVED_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Per-call switches for [`InputValidator::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    pub max_length: usize,
    pub allow_links: bool,
    pub allow_code: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            max_length: 2000,
            allow_links: false,
            allow_code: false,
        }
    }
}

/// Stateless content checks; only the tunables are swappable.
pub struct InputValidator {
    config: ArcSwap<ValidationConfig>,
}

impl InputValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Options carrying the configured default length limit.
    pub fn default_options(&self) -> ValidateOptions {
        ValidateOptions {
            max_length: self.config.load().default_max_length,
            ..ValidateOptions::default()
        }
    }

    /// Run the content checks in order and return the sanitized text.
    ///
    /// The first failing check decides the rejection:
    /// length, code, markup, links, scam wording.
    pub fn validate(&self, text: &str, opts: ValidateOptions) -> Result<String, Rejection> {
        let config = self.config.load();
        let result = if text.chars().count() > opts.max_length {
            Err(Rejection::too_long(opts.max_length))
        } else if !opts.allow_code && patterns::contains_code_injection(text) {
            Err(Rejection::code_injection())
        } else if patterns::contains_markup_injection(text) {
            Err(Rejection::markup_injection())
        } else if !opts.allow_links
            && patterns::contains_suspicious_link(text, &config.invite_whitelist)
        {
            Err(Rejection::suspicious_link())
        } else if patterns::contains_scam(text) {
            Err(Rejection::scam())
        } else {
            Ok(sanitize::sanitize(text))
        };

        if let Err(rejection) = &result {
            tracing::warn!(
                kind = %rejection.kind,
                input = %sanitize::excerpt(text, config.log_excerpt_chars),
                "Input rejected"
            );
        }
        result
    }

    /// Calculator input: grammar first, then the code patterns.
    pub fn validate_math_expression(&self, expr: &str) -> Result<(), Rejection> {
        if let Err(e) = math::tokenize(expr) {
            tracing::warn!(
                error = %e,
                input = %sanitize::excerpt(expr, self.config.load().log_excerpt_chars),
                "Math expression rejected"
            );
            return Err(Rejection::new(
                RejectionKind::InvalidMath,
                "Invalid math expression",
            ));
        }
        if patterns::contains_code_injection(expr) {
            tracing::warn!(
                input = %sanitize::excerpt(expr, self.config.load().log_excerpt_chars),
                "Code in math expression"
            );
            return Err(Rejection::new(
                RejectionKind::CodeInjection,
                "Code detected in expression",
            ));
        }
        Ok(())
    }

    /// Accept http(s) URLs; with a non-empty allow-list the host must be one
    /// of the domains or a subdomain of one.
    pub fn validate_url(&self, raw: &str, allowed_domains: &[String]) -> Result<(), Rejection> {
        let parsed = Url::parse(raw.trim())
            .map_err(|_| Rejection::new(RejectionKind::InvalidUrl, "Invalid URL"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Rejection::new(
                RejectionKind::ForbiddenScheme,
                "Protocol not allowed",
            ));
        }

        if allowed_domains.is_empty() {
            return Ok(());
        }
        let host = parsed
            .host_str()
            .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
            .unwrap_or_default();
        let allowed = allowed_domains.iter().any(|domain| {
            let domain = domain.trim_start_matches('.').to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        });
        if allowed {
            Ok(())
        } else {
            tracing::warn!(host = %host, "URL domain not allowed");
            Err(Rejection::new(
                RejectionKind::ForbiddenDomain,
                "Domain not allowed",
            ))
        }
    }

    pub fn validate_filename(&self, name: &str) -> Result<(), Rejection> {
        if let Some(idx) = name.rfind('.') {
            let ext = name[idx..].to_ascii_lowercase();
            if DANGEROUS_EXTENSIONS.contains(&ext.as_str()) {
                return Err(Rejection::new(
                    RejectionKind::DangerousExtension,
                    format!("File extension not allowed: {ext}"),
                ));
            }
        }
        if name
            .chars()
            .any(|c| c.is_control() || RESERVED_FILENAME_CHARS.contains(&c))
        {
            return Err(Rejection::new(
                RejectionKind::InvalidFilename,
                "Invalid characters in filename",
            ));
        }
        Ok(())
    }

    /// Platform ids are 17 to 19 decimal digits.
    pub fn validate_snowflake(&self, id: &str) -> bool {
        (17..=19).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn sanitize(&self, text: &str) -> String {
        sanitize::sanitize(text)
    }

    pub fn apply_config(&self, config: ValidationConfig) {
        self.config.store(Arc::new(config));
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
