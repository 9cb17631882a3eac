//! Validation rules: pattern verdicts the orchestrator can compute locally,
//! and the lookup seam for party/product checks that belong to an external
//! collaborator.

use chrono::NaiveDate;

use crate::field::Field;

/// Outcome of validating a field's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Ordered replacement values, closest match first.
    Suggestions(Vec<String>),
}

/// Answer from a lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Resolved(Verdict),
    /// The collaborator had nothing to say; the request completes with no
    /// state change beyond the bookkeeping.
    NoVerdict,
    /// The answer arrives later through `FormSession::resolve_lookup`.
    Deferred,
}

/// External name-lookup collaborator for party and product fields.
pub trait LookupValidator {
    fn lookup(&self, field: Field, value: &str) -> Lookup;
}

const MATURITY_DATE_LAYOUT: &str = "%d/%m/%Y";

/// Quantity rule: non-negative integer digits with at least one non-zero
/// digit. "007" passes, "000" and "12.5" do not.
pub fn check_integer(value: &str) -> Verdict {
    let digits = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    if digits && value.chars().any(|c| c != '0') {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

/// Price rule: non-negative decimal number with at least one non-zero
/// digit. "10.50" passes, "0.00" and "abc" do not.
pub fn check_decimal(value: &str) -> Verdict {
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (value, None),
    };
    let whole_ok = !whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit());
    let frac_ok = match frac {
        Some(f) => !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()),
        None => true,
    };
    let non_zero = value.chars().any(|c| c.is_ascii_digit() && c != '0');
    if whole_ok && frac_ok && non_zero {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

/// Maturity-date rule: the fixed DD/MM/YYYY layout. Layout only; whether
/// the date is tradeable is the live collaborator's call.
pub fn check_date(value: &str) -> Verdict {
    match NaiveDate::parse_from_str(value, MATURITY_DATE_LAYOUT) {
        Ok(_) => Verdict::Correct,
        Err(_) => Verdict::Incorrect,
    }
}

/// Stand-in lookup used while the live validation service is unavailable.
/// It may only ever suggest, never decide correct/incorrect: values
/// containing "test" receive the field's fixed placeholder suggestion list,
/// everything else resolves without a verdict.
#[derive(Debug, Default)]
pub struct PlaceholderLookup;

impl PlaceholderLookup {
    fn placeholder_suggestions(field: Field) -> Vec<String> {
        let names: &[&str] = match field {
            Field::BuyingParty => &["Acme Ltd", "Acme Plc", "Acme Holdings"],
            Field::SellingParty => &["Globex Plc", "Globex Ltd", "Globex Group"],
            Field::ProductName => &["Copper Futures", "Copper Options", "Cobalt Futures"],
            _ => &[],
        };
        names.iter().map(|n| n.to_string()).collect()
    }
}

impl LookupValidator for PlaceholderLookup {
    fn lookup(&self, field: Field, value: &str) -> Lookup {
        if value.contains("test") {
            Lookup::Resolved(Verdict::Suggestions(Self::placeholder_suggestions(field)))
        } else {
            Lookup::NoVerdict
        }
    }
}

/// Lookup against a known-name directory: exact matches are correct,
/// everything else gets the five closest names within edit distance five,
/// or an incorrect verdict when nothing is close enough.
#[derive(Debug, Default)]
pub struct DirectoryLookup {
    companies: Vec<String>,
    products: Vec<String>,
}

impl DirectoryLookup {
    pub fn new(companies: Vec<String>, products: Vec<String>) -> Self {
        Self { companies, products }
    }

    fn candidates(&self, field: Field) -> &[String] {
        match field {
            Field::BuyingParty | Field::SellingParty => &self.companies,
            Field::ProductName => &self.products,
            _ => &[],
        }
    }
}

impl LookupValidator for DirectoryLookup {
    fn lookup(&self, field: Field, value: &str) -> Lookup {
        let candidates = self.candidates(field);
        if candidates.is_empty() {
            return Lookup::NoVerdict;
        }
        if candidates.iter().any(|c| c == value) {
            return Lookup::Resolved(Verdict::Correct);
        }
        let matches = closest_matches(value, candidates);
        if matches.is_empty() {
            Lookup::Resolved(Verdict::Incorrect)
        } else {
            Lookup::Resolved(Verdict::Suggestions(matches))
        }
    }
}

const SUGGESTION_LIMIT: usize = 5;
const SUGGESTION_MAX_DISTANCE: usize = 5;

/// The five candidates closest to `value` by Damerau-Levenshtein distance,
/// closest first; candidates further than five edits away are dropped.
pub fn closest_matches(value: &str, candidates: &[String]) -> Vec<String> {
    let mut ranked: Vec<(usize, &String)> = candidates
        .iter()
        .map(|c| (strsim::damerau_levenshtein(value, c), c))
        .filter(|(d, _)| *d <= SUGGESTION_MAX_DISTANCE)
        .collect();
    ranked.sort_by_key(|(d, _)| *d);
    ranked
        .into_iter()
        .take(SUGGESTION_LIMIT)
        .map(|(_, c)| c.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_rule_verdicts() {
        assert_eq!(check_integer("007"), Verdict::Correct);
        assert_eq!(check_integer("000"), Verdict::Incorrect);
        assert_eq!(check_integer("12.5"), Verdict::Incorrect);
        assert_eq!(check_integer(""), Verdict::Incorrect);
        assert_eq!(check_integer("-3"), Verdict::Incorrect);
    }

    #[test]
    fn decimal_rule_verdicts() {
        assert_eq!(check_decimal("10.50"), Verdict::Correct);
        assert_eq!(check_decimal("007"), Verdict::Correct);
        assert_eq!(check_decimal("0.00"), Verdict::Incorrect);
        assert_eq!(check_decimal("abc"), Verdict::Incorrect);
        assert_eq!(check_decimal(".5"), Verdict::Incorrect);
        assert_eq!(check_decimal("1.2.3"), Verdict::Incorrect);
        assert_eq!(check_decimal(""), Verdict::Incorrect);
    }

    #[test]
    fn date_rule_requires_day_month_year_layout() {
        assert_eq!(check_date("31/12/2025"), Verdict::Correct);
        assert_eq!(check_date("2025-12-31"), Verdict::Incorrect);
        assert_eq!(check_date("31/02/2025"), Verdict::Incorrect);
        assert_eq!(check_date("not a date"), Verdict::Incorrect);
    }

    #[test]
    fn placeholder_lookup_only_ever_suggests() {
        let stub = PlaceholderLookup;
        match stub.lookup(Field::BuyingParty, "test123") {
            Lookup::Resolved(Verdict::Suggestions(s)) => assert!(!s.is_empty()),
            other => panic!("expected suggestions, got {other:?}"),
        }
        assert_eq!(stub.lookup(Field::BuyingParty, "Acme Ltd"), Lookup::NoVerdict);
    }

    #[test]
    fn closest_matches_ranks_and_filters() {
        let candidates: Vec<String> = ["Copper Futures", "Copper Options", "Zinc Swaps"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let matches = closest_matches("Copper Future", &candidates);
        assert_eq!(matches, vec!["Copper Futures".to_string()]);
    }

    #[test]
    fn directory_lookup_verdicts() {
        let dir = DirectoryLookup::new(
            vec!["Acme Ltd".into(), "Globex Plc".into()],
            vec!["Copper Futures".into()],
        );
        assert_eq!(
            dir.lookup(Field::BuyingParty, "Acme Ltd"),
            Lookup::Resolved(Verdict::Correct)
        );
        assert_eq!(
            dir.lookup(Field::BuyingParty, "Acme Lt"),
            Lookup::Resolved(Verdict::Suggestions(vec!["Acme Ltd".into()]))
        );
        assert_eq!(
            dir.lookup(Field::ProductName, "completely unrelated"),
            Lookup::Resolved(Verdict::Incorrect)
        );
    }
}
