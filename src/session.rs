//! Capture session: owns the form state, serializes every action through a
//! single dispatch point, and runs the reactive watchers that drive
//! validation, correction auditing and submission.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::FormError;
use crate::field::{Field, FieldMap, Rule};
use crate::reducer::{Action, reduce};
use crate::rules::{Lookup, LookupValidator, Verdict, check_date, check_decimal, check_integer};
use crate::state::{CorrectionRecord, FormState};
use crate::utils::new_uuid_to_bech32;

/// Audit collaborator: receives each accepted correction. Fire-and-forget;
/// the session never consumes anything beyond the error.
pub trait AuditSink {
    fn record_correction(&self, session_id: &str, record: &CorrectionRecord) -> anyhow::Result<()>;
}

/// Submission collaborator: receives the finalized value mapping exactly
/// once per session and answers with a ticket identifier.
pub trait SubmissionSink {
    fn submit_ticket(
        &self,
        session_id: &str,
        values: &FieldMap<String>,
    ) -> anyhow::Result<String>;
}

/// One complete lifecycle of the form, from creation to submission or
/// abandonment. Views read `state()` and go through `dispatch`; nothing
/// mutates the state behind the reducer's back.
pub struct FormSession<V, A, S> {
    session_id: String,
    state: FormState,
    validator: V,
    audit: A,
    submission: S,
    /// How many correction-log entries have been forwarded to the audit
    /// collaborator.
    audit_cursor: usize,
    /// Rising-edge guard: the submission collaborator fires once.
    submitted: bool,
    ticket_id: Option<String>,
    request_started: FieldMap<Option<DateTime<Utc>>>,
}

impl<V, A, S> FormSession<V, A, S>
where
    V: LookupValidator,
    A: AuditSink,
    S: SubmissionSink,
{
    pub fn new(validator: V, audit: A, submission: S) -> anyhow::Result<Self> {
        Ok(Self {
            session_id: new_uuid_to_bech32("form_")?,
            state: FormState::new(),
            validator,
            audit,
            submission,
            audit_cursor: 0,
            submitted: false,
            ticket_id: None,
            request_started: FieldMap::default(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Read-only view of the whole form state.
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Ticket id returned by the submission collaborator, once fired.
    pub fn ticket_id(&self) -> Option<&str> {
        self.ticket_id.as_deref()
    }

    /// Single entry point for view-originated actions. The action and every
    /// follow-up the watchers issue are applied one at a time, never
    /// interleaved.
    pub fn dispatch(&mut self, action: Action) -> anyhow::Result<()> {
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            self.apply(&action, &mut queue)?;
        }
        Ok(())
    }

    /// View path for edits: rejects fields with a request in flight, then
    /// records the value and queues a fresh validation.
    pub fn edit(&mut self, field: Field, value: &str) -> anyhow::Result<()> {
        if self.state.requesting[field] {
            return Err(FormError::FieldLocked(field).into());
        }
        self.dispatch(Action::SetValue {
            field,
            value: value.to_string(),
        })?;
        self.dispatch(Action::QueueValidation { field })
    }

    /// User accepted one of the offered replacement values.
    pub fn accept_correction(&mut self, field: Field, value: &str) -> anyhow::Result<()> {
        self.dispatch(Action::ApplyCorrection {
            field,
            value: value.to_string(),
        })
    }

    /// Move to the next page; refuses while the current page's gating fails.
    pub fn advance_page(&mut self) -> anyhow::Result<()> {
        if !self.state.can_advance() {
            return Err(FormError::PageIncomplete(self.state.current_page).into());
        }
        self.dispatch(Action::AdvancePage)
    }

    /// Confirm submission from the review page.
    pub fn submit(&mut self) -> anyhow::Result<()> {
        if !self.state.can_submit() {
            return Err(FormError::TicketIncomplete.into());
        }
        self.dispatch(Action::Submit)
    }

    /// Deliver the asynchronous answer for a lookup the collaborator
    /// deferred. Dispatches the verdict, if any, then completes the request.
    pub fn resolve_lookup(&mut self, field: Field, verdict: Option<Verdict>) -> anyhow::Result<()> {
        if !self.state.requesting[field] {
            return Err(FormError::NoRequestInFlight(field).into());
        }
        if let Some(verdict) = verdict {
            self.dispatch(verdict_action(field, verdict))?;
        }
        self.dispatch(Action::MarkRequestComplete { field })
    }

    /// Force completion for requests older than `max_age`, marking their
    /// fields incorrect so the user can re-enter them. Returns the fields
    /// that were expired.
    pub fn expire_stalled(&mut self, max_age: TimeDelta) -> anyhow::Result<Vec<Field>> {
        let cutoff = Utc::now() - max_age;
        let stalled: Vec<Field> = Field::ALL
            .into_iter()
            .filter(|f| {
                self.state.requesting[*f]
                    && self.request_started[*f].is_some_and(|at| at <= cutoff)
            })
            .collect();
        for field in &stalled {
            self.dispatch(Action::MarkIncorrect { field: *field })?;
            self.dispatch(Action::MarkRequestComplete { field: *field })?;
        }
        Ok(stalled)
    }

    /// Apply one action through the reducer, then run whichever watchers its
    /// state deltas trigger. Follow-up actions land on the queue.
    fn apply(&mut self, action: &Action, queue: &mut VecDeque<Action>) -> anyhow::Result<()> {
        let prev = std::mem::take(&mut self.state);
        let next = reduce(&prev, action);

        let queue_changed = next.pending_validations != prev.pending_validations;
        let log_grew = next.correction_log.len() > prev.correction_log.len();
        let submit_edge = next.submit_now && !prev.submit_now;
        for field in Field::ALL {
            if prev.requesting[field] && !next.requesting[field] {
                self.request_started[field] = None;
            }
        }
        self.state = next;

        if queue_changed {
            self.react_to_queue(queue);
        }
        if log_grew {
            self.forward_corrections()?;
        }
        if submit_edge && !self.submitted {
            self.submitted = true;
            let ticket = self
                .submission
                .submit_ticket(&self.session_id, &self.state.values)?;
            self.ticket_id = Some(ticket);
        }
        Ok(())
    }

    /// Validation orchestrator: one reaction per queue identity change,
    /// one request in flight at a time, most recently queued field first.
    fn react_to_queue(&mut self, queue: &mut VecDeque<Action>) {
        if self.state.in_flight.is_some() {
            return;
        }
        let Some(field) = self.state.pending_tail() else {
            return;
        };
        // The request start is synchronous with the reaction.
        self.state = reduce(&self.state, &Action::MarkRequestStart { field });
        self.request_started[field] = Some(Utc::now());

        let value = self.state.values[field].clone();
        let outcome = match field.spec().rule {
            Rule::Integer => Lookup::Resolved(check_integer(&value)),
            Rule::Decimal => Lookup::Resolved(check_decimal(&value)),
            Rule::Date => Lookup::Resolved(check_date(&value)),
            Rule::Lookup => self.validator.lookup(field, &value),
            Rule::Undefined => Lookup::NoVerdict,
        };
        match outcome {
            Lookup::Resolved(verdict) => {
                queue.push_back(verdict_action(field, verdict));
                queue.push_back(Action::MarkRequestComplete { field });
            }
            // Completion still happens, just with nothing to report.
            Lookup::NoVerdict => queue.push_back(Action::MarkRequestComplete { field }),
            // The collaborator answers later through `resolve_lookup`; the
            // field stays in the requesting state until then.
            Lookup::Deferred => {}
        }
    }

    /// Correction logger: forwards every not-yet-reported log entry.
    fn forward_corrections(&mut self) -> anyhow::Result<()> {
        while self.audit_cursor < self.state.correction_log.len() {
            let record = self.state.correction_log[self.audit_cursor].clone();
            self.audit.record_correction(&self.session_id, &record)?;
            self.audit_cursor += 1;
        }
        Ok(())
    }
}

fn verdict_action(field: Field, verdict: Verdict) -> Action {
    match verdict {
        Verdict::Correct => Action::MarkCorrect { field },
        Verdict::Incorrect => Action::MarkIncorrect { field },
        Verdict::Suggestions(suggestions) => Action::ProvideSuggestions { field, suggestions },
    }
}
