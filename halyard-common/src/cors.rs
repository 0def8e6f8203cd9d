//! Origin whitelist check for the per-API CORS layer.
//!
//! Each workflow domain keeps an ordered list of whitelisted origins in
//! its settings document; the HTTP layer fetches that list and asks this
//! check whether the requesting origin is a member. The decision shape
//! matches what CORS middleware expects: allow the origin or fall through
//! to a same-origin-only response.

/// Outcome of an origin whitelist check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CorsDecision {
    /// Whether the requesting origin may be echoed back in
    /// `Access-Control-Allow-Origin`.
    pub origin: bool,
}

/// Check a requesting origin against a whitelist.
///
/// Membership is exact string comparison; no pattern or subdomain
/// matching is performed.
#[must_use]
pub fn origin_allowed(requesting_origin: &str, whitelist: &[String]) -> CorsDecision {
    CorsDecision {
        origin: whitelist.iter().any(|domain| domain == requesting_origin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> Vec<String> {
        vec![
            "https://intranet.example.org".to_string(),
            "https://apps.example.org".to_string(),
        ]
    }

    #[test]
    fn member_origin_is_allowed() {
        let decision = origin_allowed("https://apps.example.org", &whitelist());
        assert!(decision.origin);
    }

    #[test]
    fn unknown_origin_is_denied() {
        let decision = origin_allowed("https://evil.example.net", &whitelist());
        assert!(!decision.origin);
    }

    #[test]
    fn matching_is_exact() {
        // Scheme and subdomain variants are different origins
        assert!(!origin_allowed("http://intranet.example.org", &whitelist()).origin);
        assert!(!origin_allowed("https://intranet.example.org/", &whitelist()).origin);
        assert!(!origin_allowed("", &whitelist()).origin);
    }

    #[test]
    fn empty_whitelist_denies_everything() {
        assert!(!origin_allowed("https://apps.example.org", &[]).origin);
    }
}
