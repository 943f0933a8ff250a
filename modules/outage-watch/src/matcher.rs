use crate::types::OutageRecord;

/// Street name to look for, trimmed and lowercased once up front.
///
/// A blank term disables matching entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where a record mentions the search term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub description_hit: bool,
    pub address_hit: bool,
}

impl MatchOutcome {
    pub fn is_hit(&self) -> bool {
        self.description_hit || self.address_hit
    }
}

/// Case-insensitive substring match against the description and every
/// address's teryt street name.
pub fn evaluate(record: &OutageRecord, term: &SearchTerm) -> MatchOutcome {
    if term.is_blank() {
        return MatchOutcome::default();
    }
    let needle = term.as_str();

    let description_hit = record.description.to_lowercase().contains(needle);
    let address_hit = record
        .addresses
        .iter()
        .filter_map(|a| a.street_name())
        .any(|street| street.to_lowercase().contains(needle));

    MatchOutcome {
        description_hit,
        address_hit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, AddressTeryt};
    use chrono::NaiveDate;

    fn record(description: &str, streets: &[Option<&str>]) -> OutageRecord {
        let at = NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        OutageRecord {
            description: description.to_string(),
            start_at: at,
            stop_at: at,
            revoked: false,
            revoked_description: None,
            addresses: streets
                .iter()
                .map(|s| Address {
                    numbers: None,
                    teryt: Some(AddressTeryt {
                        street_name: s.map(String::from),
                    }),
                })
                .collect(),
        }
    }

    #[test]
    fn term_is_trimmed_and_lowercased() {
        let term = SearchTerm::new("  Kwiatowa \n");
        assert_eq!(term.as_str(), "kwiatowa");
        assert!(!term.is_blank());
        assert!(SearchTerm::new("   ").is_blank());
    }

    #[test]
    fn description_hit_is_case_insensitive() {
        let r = record("Wyłączenie: ul. KWIATOWA 5", &[]);
        let outcome = evaluate(&r, &SearchTerm::new("Kwiatowa"));
        assert!(outcome.description_hit);
        assert!(!outcome.address_hit);
    }

    #[test]
    fn address_hit_checks_any_street() {
        let r = record("Prace sieciowe", &[None, Some("Polna"), Some("Kwiatowa Boczna")]);
        let outcome = evaluate(&r, &SearchTerm::new("kwiatowa"));
        assert!(!outcome.description_hit);
        assert!(outcome.address_hit);
        assert!(outcome.is_hit());
    }

    #[test]
    fn addresses_without_teryt_never_hit() {
        let mut r = record("Prace sieciowe", &[]);
        r.addresses.push(Address {
            numbers: Some("Kwiatowa 1".into()),
            teryt: None,
        });
        assert!(!evaluate(&r, &SearchTerm::new("kwiatowa")).is_hit());
    }

    #[test]
    fn blank_term_disables_matching() {
        let r = record("ul. Kwiatowa", &[Some("Kwiatowa")]);
        assert_eq!(evaluate(&r, &SearchTerm::new("  ")), MatchOutcome::default());
        assert_eq!(evaluate(&r, &SearchTerm::new("")), MatchOutcome::default());
    }

    #[test]
    fn inner_whitespace_is_kept() {
        let r = record("ul. Kwiatowa", &[]);
        assert!(!evaluate(&r, &SearchTerm::new("kwia towa")).is_hit());
    }
}
