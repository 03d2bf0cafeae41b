//! Cache key definitions.
//!
//! A `ResourceKey` names one API read: the resource family (a path below
//! `/api/`) plus its query parameters. Keys compare structurally.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::SaleId;

/// Well-known resource families sharing an invalidation scope.
pub mod family {
    pub const MEDICINES: &str = "medicines";
    pub const MEDICINES_LOW_STOCK: &str = "medicines/low-stock";
    pub const MEDICINES_NEAR_EXPIRY: &str = "medicines/near-expiry";
    pub const SALES: &str = "sales";
    pub const DASHBOARD: &str = "dashboard";
    pub const DASHBOARD_STATS: &str = "dashboard/stats";
    pub const AUTH_ME: &str = "auth/me";
}

/// Identifies one cached API result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    family: String,
    params: BTreeMap<String, String>,
}

impl ResourceKey {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: normalize_family(family.into()),
            params: BTreeMap::new(),
        }
    }

    /// Add a query parameter. Re-adding a name replaces its value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn sale(id: SaleId) -> Self {
        Self::new(format!("{}/{id}", family::SALES))
    }

    pub fn dashboard_stats() -> Self {
        Self::new(family::DASHBOARD_STATS)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Request path for this key, e.g. `/api/medicines/low-stock/`.
    pub fn path(&self) -> String {
        format!("/api/{}/", self.family)
    }

    /// Query pairs sent to the backend. An empty `search` is omitted.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.params()
            .filter(|(name, value)| !(*name == "search" && value.is_empty()))
            .collect()
    }

    /// True when this key's family equals `token` or sits below it.
    ///
    /// Matching stops at path-segment boundaries: `medicines` covers
    /// `medicines/low-stock` but not `medicinesx`.
    pub fn in_family(&self, token: &str) -> bool {
        let token = token.trim_matches('/');
        match self.family.strip_prefix(token) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())?;
        let mut sep = '?';
        for (name, value) in &self.params {
            write!(f, "{sep}{name}={value}")?;
            sep = '&';
        }
        Ok(())
    }
}

fn normalize_family(family: String) -> String {
    let trimmed = family.trim_matches('/');
    let trimmed = trimmed.strip_prefix("api/").unwrap_or(trimmed);
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_structurally() {
        let a = ResourceKey::new("medicines")
            .with_param("search", "asp")
            .with_param("page", 2);
        let b = ResourceKey::new("/api/medicines/")
            .with_param("page", "2")
            .with_param("search", "asp");
        assert_eq!(a, b);
        assert_ne!(a, ResourceKey::new("medicines").with_param("page", 2));
    }

    #[test]
    fn family_matching_respects_segments() {
        let low = ResourceKey::new(family::MEDICINES_LOW_STOCK);
        assert!(low.in_family("medicines"));
        assert!(low.in_family("medicines/low-stock"));
        assert!(!low.in_family("medicines/near-expiry"));
        assert!(!ResourceKey::new("medicinesx").in_family("medicines"));
        assert!(ResourceKey::sale(42).in_family("sales"));
        assert!(!ResourceKey::new(family::SALES).in_family("sales/42"));
    }

    #[test]
    fn query_pairs_skip_empty_search() {
        let key = ResourceKey::new(family::MEDICINES)
            .with_param("search", "")
            .with_param("page", 1);
        assert_eq!(key.query_pairs(), vec![("page", "1")]);
        assert_eq!(key.path(), "/api/medicines/");
    }

    #[test]
    fn display_includes_params() {
        let key = ResourceKey::new(family::SALES)
            .with_param("ordering", "-created_at")
            .with_param("page", 3);
        assert_eq!(key.to_string(), "/api/sales/?ordering=-created_at&page=3");
    }
}
