//! Pure state transitions. Every mutation of [`FormState`] flows through
//! [`reduce`]; nothing here performs I/O or panics.

use crate::field::Field;
use crate::state::{CorrectionRecord, FormState, InFlight, FINAL_PAGE};

/// The complete action vocabulary of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// User edited a field.
    SetValue { field: Field, value: String },
    /// Ask for the field to be (re-)validated. Duplicates are allowed and
    /// never silently dropped.
    QueueValidation { field: Field },
    /// A validation request went into flight for the field.
    MarkRequestStart { field: Field },
    /// The in-flight request for the field terminated, verdict or not.
    MarkRequestComplete { field: Field },
    MarkCorrect { field: Field },
    MarkIncorrect { field: Field },
    /// Offer replacement values for a field believed incorrect.
    ProvideSuggestions { field: Field, suggestions: Vec<String> },
    /// User accepted one of the offered replacements.
    ApplyCorrection { field: Field, value: String },
    AdvancePage,
    Submit,
}

/// Total transition function: `(state, action) -> state`. The input is never
/// mutated; inapplicable actions leave the state unchanged rather than
/// failing.
pub fn reduce(state: &FormState, action: &Action) -> FormState {
    let mut next = state.clone();
    match action {
        Action::SetValue { field, value } => {
            next.values[*field] = value.clone();
            // An edit only unblocks a stale invalid flag when no validation
            // is in flight for the field; otherwise the flag belongs to the
            // cycle that is still running and stays until it resolves.
            if next.incorrect[*field] && !next.requesting[*field] {
                next.incorrect[*field] = false;
            }
        }
        Action::QueueValidation { field } => {
            next.pending_validations.push(*field);
        }
        Action::MarkRequestStart { field } => {
            next.requesting[*field] = true;
            let occurrences = next
                .pending_validations
                .iter()
                .filter(|f| *f == field)
                .count();
            next.in_flight = Some(InFlight {
                field: *field,
                occurrences,
            });
        }
        Action::MarkRequestComplete { field } => {
            next.requesting[*field] = false;
            let limit = match next.in_flight {
                Some(in_flight) if in_flight.field == *field => {
                    next.in_flight = None;
                    in_flight.occurrences
                }
                // No matching in-flight record: drain every entry.
                _ => usize::MAX,
            };
            let mut removed = 0;
            next.pending_validations.retain(|f| {
                if f == field && removed < limit {
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        Action::MarkCorrect { field } => {
            next.incorrect[*field] = false;
            next.corrections[*field].clear();
        }
        Action::MarkIncorrect { field } => {
            next.incorrect[*field] = true;
        }
        Action::ProvideSuggestions { field, suggestions } => {
            next.corrections[*field] = suggestions.clone();
            next.incorrect[*field] = true;
        }
        Action::ApplyCorrection { field, value } => {
            let old_value = std::mem::replace(&mut next.values[*field], value.clone());
            next.incorrect[*field] = false;
            next.corrections[*field].clear();
            next.correction_log.push(CorrectionRecord {
                field: *field,
                old_value,
                new_value: value.clone(),
            });
        }
        Action::AdvancePage => {
            if next.current_page < FINAL_PAGE {
                next.current_page += 1;
            }
        }
        Action::Submit => {
            next.submit_now = true;
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(state: FormState, actions: &[Action]) -> FormState {
        actions.iter().fold(state, |s, a| reduce(&s, a))
    }

    #[test]
    fn set_value_clears_stale_incorrect_flag() {
        let state = apply(
            FormState::new(),
            &[
                Action::MarkIncorrect { field: Field::Quantity },
                Action::SetValue { field: Field::Quantity, value: "12".into() },
            ],
        );
        assert_eq!(state.values[Field::Quantity], "12");
        assert!(!state.incorrect[Field::Quantity]);
    }

    #[test]
    fn set_value_keeps_incorrect_flag_while_request_in_flight() {
        let state = apply(
            FormState::new(),
            &[
                Action::QueueValidation { field: Field::Quantity },
                Action::MarkRequestStart { field: Field::Quantity },
                Action::MarkIncorrect { field: Field::Quantity },
                Action::SetValue { field: Field::Quantity, value: "12".into() },
            ],
        );
        assert!(state.incorrect[Field::Quantity]);
        assert!(state.requesting[Field::Quantity]);
    }

    #[test]
    fn request_complete_clears_flag_and_queue_entry() {
        let state = apply(
            FormState::new(),
            &[
                Action::QueueValidation { field: Field::StrikePrice },
                Action::MarkRequestStart { field: Field::StrikePrice },
                Action::MarkRequestComplete { field: Field::StrikePrice },
            ],
        );
        assert!(!state.requesting[Field::StrikePrice]);
        assert!(state.pending_validations.is_empty());
        assert_eq!(state.in_flight, None);
    }

    #[test]
    fn entries_queued_during_flight_survive_completion() {
        let state = apply(
            FormState::new(),
            &[
                Action::QueueValidation { field: Field::Quantity },
                Action::MarkRequestStart { field: Field::Quantity },
                // Re-queued while the first request is still in flight.
                Action::QueueValidation { field: Field::Quantity },
                Action::MarkRequestComplete { field: Field::Quantity },
            ],
        );
        assert_eq!(state.pending_validations, vec![Field::Quantity]);
    }

    #[test]
    fn mark_correct_clears_flag_and_suggestions() {
        let state = apply(
            FormState::new(),
            &[
                Action::ProvideSuggestions {
                    field: Field::BuyingParty,
                    suggestions: vec!["Acme Ltd".into()],
                },
                Action::MarkCorrect { field: Field::BuyingParty },
            ],
        );
        assert!(!state.incorrect[Field::BuyingParty]);
        assert!(state.corrections[Field::BuyingParty].is_empty());
    }

    #[test]
    fn provide_suggestions_implies_incorrect() {
        let suggestions = vec!["Acme Ltd".to_string(), "Acme Plc".to_string()];
        let state = reduce(
            &FormState::new(),
            &Action::ProvideSuggestions {
                field: Field::SellingParty,
                suggestions: suggestions.clone(),
            },
        );
        assert!(state.incorrect[Field::SellingParty]);
        assert_eq!(state.corrections[Field::SellingParty], suggestions);
    }

    #[test]
    fn apply_correction_appends_exactly_one_log_entry() {
        let state = apply(
            FormState::new(),
            &[
                Action::SetValue { field: Field::ProductName, value: "coper".into() },
                Action::ProvideSuggestions {
                    field: Field::ProductName,
                    suggestions: vec!["Copper".into()],
                },
                Action::ApplyCorrection { field: Field::ProductName, value: "Copper".into() },
            ],
        );
        assert_eq!(state.values[Field::ProductName], "Copper");
        assert!(!state.incorrect[Field::ProductName]);
        assert!(state.corrections[Field::ProductName].is_empty());
        assert_eq!(
            state.correction_log,
            vec![CorrectionRecord {
                field: Field::ProductName,
                old_value: "coper".into(),
                new_value: "Copper".into(),
            }]
        );
    }

    #[test]
    fn page_never_exceeds_final() {
        let state = apply(
            FormState::new(),
            &[Action::AdvancePage, Action::AdvancePage, Action::AdvancePage, Action::AdvancePage],
        );
        assert_eq!(state.current_page, FINAL_PAGE);
        let state = reduce(&state, &Action::AdvancePage);
        assert_eq!(state.current_page, FINAL_PAGE);
    }

    #[test]
    fn submit_is_monotone() {
        let state = reduce(&FormState::new(), &Action::Submit);
        assert!(state.submit_now);
        let state = apply(
            state,
            &[
                Action::SetValue { field: Field::Quantity, value: "1".into() },
                Action::AdvancePage,
            ],
        );
        assert!(state.submit_now);
    }

    #[test]
    fn reduce_never_mutates_its_input() {
        let before = apply(
            FormState::new(),
            &[
                Action::SetValue { field: Field::Quantity, value: "7".into() },
                Action::QueueValidation { field: Field::Quantity },
            ],
        );
        let snapshot = before.clone();
        let _ = reduce(&before, &Action::MarkRequestStart { field: Field::Quantity });
        assert_eq!(before, snapshot);
    }
}
