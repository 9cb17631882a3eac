//! The single form state object: one instance per capture session, mutated
//! only through the reducer.

use crate::field::{Field, FieldMap};

pub const FINAL_PAGE: u8 = 4;

/// One accepted correction: the field, what it held, and what the user
/// replaced it with. The log these live in is append-only for the whole
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionRecord {
    pub field: Field,
    pub old_value: String,
    pub new_value: String,
}

/// Bookkeeping for the single validation request the orchestrator has in
/// flight. `occurrences` counts how many queue entries for the field existed
/// when the request started; completion removes exactly that many, so
/// entries queued during the flight survive and get processed next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub field: Field,
    pub occurrences: usize,
}

/// The whole of the form's mutable state. Views read it; only the reducer
/// writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    /// Current textual value per field; empty string means unset.
    pub values: FieldMap<String>,
    /// Suggested replacements for fields currently believed incorrect.
    pub corrections: FieldMap<Vec<String>>,
    /// Append-only audit trail of accepted corrections.
    pub correction_log: Vec<CorrectionRecord>,
    /// True while a field's current value is believed invalid.
    pub incorrect: FieldMap<bool>,
    /// True while a validation request for the field is in flight; the view
    /// must not allow edits while set.
    pub requesting: FieldMap<bool>,
    /// Fields awaiting validation; the tail entry is processed first.
    pub pending_validations: Vec<Field>,
    pub in_flight: Option<InFlight>,
    pub current_page: u8,
    /// Set once when the user confirms submission; never unset afterwards.
    pub submit_now: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    /// Fresh state for a new capture session: everything empty, page 1.
    pub fn new() -> Self {
        Self {
            values: FieldMap::default(),
            corrections: FieldMap::default(),
            correction_log: Vec::new(),
            incorrect: FieldMap::default(),
            requesting: FieldMap::default(),
            pending_validations: Vec::new(),
            in_flight: None,
            current_page: 1,
            submit_now: false,
        }
    }

    /// The most recently queued field, which validation handles next.
    pub fn pending_tail(&self) -> Option<Field> {
        self.pending_validations.last().copied()
    }

    /// Whether one field currently blocks page progression.
    fn blocks_advance(&self, field: Field) -> bool {
        self.values[field].is_empty()
            || self.incorrect[field]
            || self.requesting[field]
            || !self.corrections[field].is_empty()
    }

    /// Page gating: every field on the current page must be non-empty,
    /// not flagged incorrect, not mid-validation, and free of outstanding
    /// suggestions before the view may offer the next page.
    pub fn can_advance(&self) -> bool {
        if self.current_page >= FINAL_PAGE {
            return false;
        }
        Field::on_page(self.current_page).all(|f| !self.blocks_advance(f))
    }

    /// Submission gating on the review page: no field may be blank.
    pub fn can_submit(&self) -> bool {
        self.current_page == FINAL_PAGE
            && Field::ALL.into_iter().all(|f| !self.values[f].is_empty())
    }
}
