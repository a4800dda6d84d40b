//! WHOIS response parsing
//!
//! Registry and registrar responses are loosely structured `Key: Value`
//! text. This module flattens them into the field mapping the change
//! detector compares, after dropping the one line that changes on every
//! query (the database-update timestamp).

use domwatch_core::WhoisFields;
use serde_json::Value;

/// The boilerplate line registrars refresh on every response. Left in
/// place it would make every poll cycle look like a change.
const DATABASE_TIMESTAMP_MARKER: &str = "Last update of whois database:";

/// Keys longer than this are almost always terms-of-use prose that
/// happens to contain a colon, not a field.
const MAX_KEY_LEN: usize = 40;

/// Remove the database-update timestamp line from a raw response
pub fn strip_database_timestamp(text: &str) -> String {
    text.lines()
        .filter(|line| !line.contains(DATABASE_TIMESTAMP_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten a WHOIS response into a field mapping
///
/// - `Key: Value` lines become entries under a normalized snake_case key
/// - repeated keys (name servers, status lines) accumulate into arrays
/// - keys with no value map to null
/// - comment lines (`%`, `#`, `>>>`) and non-field prose are skipped
pub fn parse_fields(text: &str) -> WhoisFields {
    let mut fields = WhoisFields::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>") {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once(':') else {
            continue;
        };

        let raw_key = raw_key.trim();
        if raw_key.is_empty() || raw_key.len() > MAX_KEY_LEN {
            continue;
        }

        let Some(key) = normalize_key(raw_key) else {
            continue;
        };

        let value = match raw_value.trim() {
            "" => Value::Null,
            v => Value::String(v.to_string()),
        };

        insert_field(&mut fields, key, value);
    }

    fields
}

/// Extract the registrar's own WHOIS server from a registry response, if
/// the record names one
pub fn registrar_referral(text: &str) -> Option<String> {
    find_field(text, "Registrar WHOIS Server")
}

/// Extract the referral server from an IANA TLD record
pub fn iana_referral(text: &str) -> Option<String> {
    find_field(text, "refer").or_else(|| find_field(text, "whois"))
}

fn find_field(text: &str, wanted: &str) -> Option<String> {
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case(wanted) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Lowercase, with runs of non-alphanumerics collapsed to single
/// underscores. Returns None for keys that normalize to nothing.
fn normalize_key(raw: &str) -> Option<String> {
    let mut key = String::with_capacity(raw.len());
    let mut last_was_separator = true;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            key.push('_');
            last_was_separator = true;
        }
    }

    while key.ends_with('_') {
        key.pop();
    }

    if key.is_empty() { None } else { Some(key) }
}

/// Insert a value, turning repeated keys into arrays (duplicates dropped)
fn insert_field(fields: &mut WhoisFields, key: String, value: Value) {
    match fields.get_mut(&key) {
        None => {
            fields.insert(key, value);
        }
        Some(Value::Array(existing)) => {
            if !existing.contains(&value) {
                existing.push(value);
            }
        }
        Some(existing) => {
            if *existing != value {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "\
Domain Name: DERP.COM
Registrar: Example Registrar, Inc.
Registrar WHOIS Server: whois.example-registrar.com
Name Server: NS1.DERP.COM
Name Server: NS2.DERP.COM
Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
DNSSEC:
% Terms of use follow
>>> Last update of whois database: 2024-05-01T10:00:00Z <<<
All domain names are subject to the following terms of use: you agree to abide
";

    #[test]
    fn strips_database_timestamp_line() {
        let stripped = strip_database_timestamp(SAMPLE);
        assert!(!stripped.contains("Last update of whois database"));
        assert!(stripped.contains("Registrar: Example Registrar, Inc."));
    }

    #[test]
    fn parses_simple_fields() {
        let fields = parse_fields(&strip_database_timestamp(SAMPLE));

        assert_eq!(fields["domain_name"], json!("DERP.COM"));
        assert_eq!(fields["registrar"], json!("Example Registrar, Inc."));
    }

    #[test]
    fn repeated_keys_accumulate_into_arrays() {
        let fields = parse_fields(SAMPLE);
        assert_eq!(
            fields["name_server"],
            json!(["NS1.DERP.COM", "NS2.DERP.COM"])
        );
    }

    #[test]
    fn duplicate_values_are_not_repeated() {
        let fields = parse_fields("Name Server: NS1.DERP.COM\nName Server: NS1.DERP.COM\n");
        assert_eq!(fields["name_server"], json!("NS1.DERP.COM"));
    }

    #[test]
    fn valueless_field_maps_to_null() {
        let fields = parse_fields(SAMPLE);
        assert_eq!(fields["dnssec"], json!(null));
    }

    #[test]
    fn prose_and_comments_are_skipped() {
        let fields = parse_fields(SAMPLE);
        assert!(!fields.keys().any(|k| k.contains("terms_of_use")));
        assert!(!fields.keys().any(|k| k.starts_with("all_domain")));
    }

    #[test]
    fn value_with_colon_is_kept_whole() {
        let fields = parse_fields("Registrar URL: http://www.example-registrar.com\n");
        assert_eq!(
            fields["registrar_url"],
            json!("http://www.example-registrar.com")
        );
    }

    #[test]
    fn extracts_registrar_referral() {
        assert_eq!(
            registrar_referral(SAMPLE).as_deref(),
            Some("whois.example-registrar.com")
        );
        assert_eq!(registrar_referral("Domain Name: DERP.COM\n"), None);
    }

    #[test]
    fn extracts_iana_referral() {
        let iana = "\
domain:       COM
organisation: VeriSign Global Registry Services
refer:        whois.verisign-grs.com
";
        assert_eq!(iana_referral(iana).as_deref(), Some("whois.verisign-grs.com"));
    }

    #[test]
    fn identical_responses_parse_identically_after_stripping() {
        let first = format!("{SAMPLE}\n>>> Last update of whois database: 2024-05-01T10:00:00Z <<<");
        let second = format!("{SAMPLE}\n>>> Last update of whois database: 2024-05-01T11:30:00Z <<<");

        assert_eq!(
            parse_fields(&strip_database_timestamp(&first)),
            parse_fields(&strip_database_timestamp(&second))
        );
    }
}
