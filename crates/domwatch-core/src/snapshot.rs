//! Snapshot model
//!
//! A [`Snapshot`] is the unit of comparison for the change detector: the
//! flattened WHOIS field mapping plus the sorted MX record list observed in
//! one poll cycle. Exactly one snapshot is persisted at any time; each
//! completed cycle replaces it.
//!
//! ## Persisted layout
//!
//! ```json
//! {
//!   "whois": {
//!     "registrar": "Example Registrar, Inc.",
//!     "name_server": ["ns1.example.com", "ns2.example.com"],
//!     "dnssec": null
//!   },
//!   "mx_records": ["mail1.example.com.", "mail2.example.com."]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flattened WHOIS record: field name → value.
///
/// Values are strings, arrays of strings (repeated fields such as name
/// servers or status lines), or null for valueless fields. Raw WHOIS text
/// is never stored.
pub type WhoisFields = BTreeMap<String, serde_json::Value>;

/// One observation of a domain's WHOIS fields and MX records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Flattened WHOIS field mapping
    pub whois: WhoisFields,

    /// MX exchange hostnames, sorted lexicographically
    pub mx_records: Vec<String>,
}

impl Snapshot {
    /// Build a snapshot from freshly fetched data
    ///
    /// MX records are sorted here so that comparison and storage are
    /// insensitive to resolver answer order.
    pub fn new(whois: WhoisFields, mut mx_records: Vec<String>) -> Self {
        mx_records.sort();
        Self { whois, mx_records }
    }

    /// Re-establish the sorted-MX invariant on a snapshot loaded from
    /// external storage
    pub fn normalize(&mut self) {
        self.mx_records.sort();
    }

    /// Compare this (previous) snapshot against a freshly fetched one
    pub fn diff(&self, current: &Snapshot) -> ChangeReport {
        let whois = (self.whois != current.whois)
            .then(|| (self.whois.clone(), current.whois.clone()));
        let mx_records = (self.mx_records != current.mx_records)
            .then(|| (self.mx_records.clone(), current.mx_records.clone()));

        ChangeReport { whois, mx_records }
    }
}

/// Differences between two snapshots
///
/// Each section is present only when it changed, and carries the previous
/// and current values in that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeReport {
    /// (previous, current) WHOIS fields, if they differ
    pub whois: Option<(WhoisFields, WhoisFields)>,

    /// (previous, current) MX record lists, if they differ
    pub mx_records: Option<(Vec<String>, Vec<String>)>,
}

impl ChangeReport {
    /// True when neither section changed
    pub fn is_empty(&self) -> bool {
        self.whois.is_none() && self.mx_records.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn fields(registrar: &str) -> WhoisFields {
        let mut map = WhoisFields::new();
        map.insert("registrar".to_string(), Value::String(registrar.to_string()));
        map.insert(
            "name_server".to_string(),
            json!(["ns1.derp.com", "ns2.derp.com"]),
        );
        map
    }

    #[test]
    fn constructor_sorts_mx_records() {
        let snapshot = Snapshot::new(
            fields("A"),
            vec!["mail2.derp.com".to_string(), "mail1.derp.com".to_string()],
        );
        assert_eq!(snapshot.mx_records, vec!["mail1.derp.com", "mail2.derp.com"]);
    }

    #[test]
    fn equal_snapshots_produce_empty_report() {
        let previous = Snapshot::new(
            fields("A"),
            vec!["mail2.derp.com".to_string(), "mail1.derp.com".to_string()],
        );
        let current = Snapshot::new(
            fields("A"),
            vec!["mail1.derp.com".to_string(), "mail2.derp.com".to_string()],
        );

        let report = previous.diff(&current);
        assert!(report.is_empty());
    }

    #[test]
    fn registrar_change_reports_whois_section_only() {
        let previous = Snapshot::new(fields("A"), vec!["mail1.derp.com".to_string()]);
        let current = Snapshot::new(fields("B"), vec!["mail1.derp.com".to_string()]);

        let report = previous.diff(&current);
        assert!(report.mx_records.is_none());

        let (old, new) = report.whois.expect("whois section should be reported");
        assert_eq!(old["registrar"], json!("A"));
        assert_eq!(new["registrar"], json!("B"));
    }

    #[test]
    fn mx_change_reports_mx_section_only() {
        let previous = Snapshot::new(fields("A"), vec!["mail1.derp.com".to_string()]);
        let current = Snapshot::new(
            fields("A"),
            vec!["mail1.derp.com".to_string(), "mail3.derp.com".to_string()],
        );

        let report = previous.diff(&current);
        assert!(report.whois.is_none());

        let (old, new) = report.mx_records.expect("mx section should be reported");
        assert_eq!(old, vec!["mail1.derp.com"]);
        assert_eq!(new, vec!["mail1.derp.com", "mail3.derp.com"]);
    }

    #[test]
    fn persisted_layout_has_exactly_two_keys() {
        let snapshot = Snapshot::new(fields("A"), vec!["mail1.derp.com".to_string()]);
        let value = serde_json::to_value(&snapshot).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("whois"));
        assert!(object.contains_key("mx_records"));
    }

    #[test]
    fn normalize_restores_sort_order() {
        let mut snapshot: Snapshot = serde_json::from_value(json!({
            "whois": {"registrar": "A"},
            "mx_records": ["mail2.derp.com", "mail1.derp.com"],
        }))
        .unwrap();

        snapshot.normalize();
        assert_eq!(snapshot.mx_records, vec!["mail1.derp.com", "mail2.derp.com"]);
    }
}
