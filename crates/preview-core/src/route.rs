//! Route identities for previewable REST resources
//!
//! Provides [`RouteIdentity`], the normalized key shared by the validating
//! dispatcher, the preview registry and the response overlay.

use crate::error::RouteError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// `<kind>[<route>]`, e.g. `rest_resource[wp/v2/posts/1]`
static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<kind>[^\[]+)\[(?P<route>.+)\]$").expect("identifier pattern is valid")
});

/// Route separator trimmed during normalization
const SEPARATOR: char = '/';

/// Identity of one addressable resource within the API
///
/// Two identities are equal iff their normalized routes are equal; the raw
/// identifier and kind are carried for diagnostics only.
///
/// # Examples
/// - `rest_resource[/widgets/5/]` → kind `rest_resource`, route `widgets/5`
/// - `widgets/5` (via [`RouteIdentity::from_route`]) → route `widgets/5`
#[derive(Debug, Clone)]
pub struct RouteIdentity {
    raw: String,
    kind: Option<String>,
    normalized: String,
}

impl RouteIdentity {
    /// Parse a setting identifier of the form `<kind>[<route>]`
    ///
    /// # Errors
    /// Returns [`RouteError::MalformedIdentifier`] if the identifier does not
    /// match the two-part pattern.
    pub fn parse(identifier: &str) -> Result<Self, RouteError> {
        let captures = IDENTIFIER_PATTERN.captures(identifier).ok_or_else(|| {
            RouteError::MalformedIdentifier {
                identifier: identifier.to_string(),
            }
        })?;

        Ok(Self {
            raw: identifier.to_string(),
            kind: Some(captures["kind"].to_string()),
            normalized: Self::normalize(&captures["route"]),
        })
    }

    /// Identity for a bare route (no setting kind)
    #[inline]
    #[must_use]
    pub fn from_route(route: &str) -> Self {
        Self {
            raw: route.to_string(),
            kind: None,
            normalized: Self::normalize(route),
        }
    }

    /// Trim leading and trailing separators
    ///
    /// Pure and idempotent: `normalize(normalize(r)) == normalize(r)`.
    #[inline]
    #[must_use]
    pub fn normalize(route: &str) -> String {
        route.trim_matches(SEPARATOR).to_string()
    }

    /// Original identifier as supplied by the caller
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Setting kind, if parsed from an identifier
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Normalized route, the registry and overlay key
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Route as dispatched, with a single leading separator
    #[inline]
    #[must_use]
    pub fn path(&self) -> String {
        format!("{SEPARATOR}{}", self.normalized)
    }

    /// Canonical setting identifier for this route
    #[must_use]
    pub fn setting_id(&self) -> String {
        match &self.kind {
            Some(kind) => format!("{kind}[{}]", self.normalized),
            None => self.normalized.clone(),
        }
    }

    /// Check whether this identity addresses `route` (normalized before comparing)
    #[inline]
    #[must_use]
    pub fn matches(&self, route: &str) -> bool {
        self.normalized == route.trim_matches(SEPARATOR)
    }
}

impl PartialEq for RouteIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for RouteIdentity {}

impl Hash for RouteIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl Display for RouteIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl FromStr for RouteIdentity {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_extracts_kind_and_route() {
        let id = RouteIdentity::parse("rest_resource[/widgets/5/]").unwrap();
        assert_eq!(id.kind(), Some("rest_resource"));
        assert_eq!(id.normalized(), "widgets/5");
        assert_eq!(id.raw(), "rest_resource[/widgets/5/]");
    }

    #[test]
    fn parse_rejects_missing_brackets() {
        let err = RouteIdentity::parse("widgets/5").unwrap_err();
        assert!(matches!(err, RouteError::MalformedIdentifier { .. }));
    }

    #[test]
    fn parse_rejects_empty_parts() {
        assert!(RouteIdentity::parse("[widgets/5]").is_err());
        assert!(RouteIdentity::parse("rest_resource[]").is_err());
        assert!(RouteIdentity::parse("rest_resource[widgets").is_err());
    }

    #[test]
    fn equality_ignores_raw_form() {
        let a = RouteIdentity::parse("rest_resource[widgets/5]").unwrap();
        let b = RouteIdentity::from_route("//widgets/5/");
        assert_eq!(a, b);
        assert!(a.matches("/widgets/5"));
    }

    #[test]
    fn path_and_setting_id() {
        let id = RouteIdentity::parse("rest_resource[/wp/v2/posts/1]").unwrap();
        assert_eq!(id.path(), "/wp/v2/posts/1");
        assert_eq!(id.setting_id(), "rest_resource[wp/v2/posts/1]");
        assert_eq!(id.to_string(), "wp/v2/posts/1");
    }

    #[test]
    fn from_str_parses_identifier() {
        let id: RouteIdentity = "rest_resource[widgets/7]".parse().unwrap();
        assert_eq!(id.normalized(), "widgets/7");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(route in "[/a-z0-9_]{0,24}") {
            let once = RouteIdentity::normalize(&route);
            prop_assert_eq!(RouteIdentity::normalize(&once), once.clone());
            prop_assert!(!once.starts_with('/'));
            prop_assert!(!once.ends_with('/'));
        }
    }
}
