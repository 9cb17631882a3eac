//! Sled-backed collaborator for audit and submission records.
//!
//! Records are minicbor-encoded; corrections are keyed by the sha256 digest
//! of their encoding (prefixed for scanning), tickets by their bech32 id.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sled::Batch;

use crate::field::{Field, FieldMap};
use crate::session::{AuditSink, SubmissionSink};
use crate::state::CorrectionRecord;
use crate::utils::new_uuid_to_bech32;

const CORRECTION_KEY_PREFIX: &str = "corr_";

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// One persisted correction: which session, which field, what changed, when.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct CorrectionEntry {
    #[n(0)]
    pub session_id: String,
    #[n(1)]
    pub field: Field,
    #[n(2)]
    pub old_value: String,
    #[n(3)]
    pub new_value: String,
    #[n(4)]
    pub recorded_at: TimeStamp<Utc>,
}

/// One field value inside a persisted ticket.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    #[n(0)]
    pub field: Field,
    #[n(1)]
    pub value: String,
}

/// The finalized deal ticket as handed over on submission.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    #[n(0)]
    pub ticket_id: String,
    #[n(1)]
    pub session_id: String,
    #[n(2)]
    pub fields: Vec<FieldValue>,
    #[n(3)]
    pub submitted_at: TimeStamp<Utc>,
}

#[derive(Clone)]
pub struct TicketStore {
    instance: Arc<sled::Db>,
}

impl TicketStore {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    pub fn fetch_ticket(&self, ticket_id: &str) -> anyhow::Result<Option<TicketRecord>> {
        match self.instance.get(ticket_id.as_bytes())? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every persisted correction, in key order.
    pub fn corrections(&self) -> anyhow::Result<Vec<CorrectionEntry>> {
        let mut entries = Vec::new();
        for item in self.instance.scan_prefix(CORRECTION_KEY_PREFIX.as_bytes()) {
            let (_, bytes) = item?;
            entries.push(minicbor::decode(&bytes)?);
        }
        Ok(entries)
    }

    /// Every persisted ticket. Ticket ids carry the `ticket_` bech32 prefix,
    /// which doubles as the scan prefix.
    pub fn tickets(&self) -> anyhow::Result<Vec<TicketRecord>> {
        let mut records = Vec::new();
        for item in self.instance.scan_prefix(b"ticket_") {
            let (_, bytes) = item?;
            records.push(minicbor::decode(&bytes)?);
        }
        Ok(records)
    }
}

impl AuditSink for TicketStore {
    fn record_correction(&self, session_id: &str, record: &CorrectionRecord) -> anyhow::Result<()> {
        let entry = CorrectionEntry {
            session_id: session_id.to_string(),
            field: record.field,
            old_value: record.old_value.clone(),
            new_value: record.new_value.clone(),
            recorded_at: TimeStamp::new(),
        };
        let cbor = minicbor::to_vec(&entry)?;
        let key = format!("{CORRECTION_KEY_PREFIX}{}", sha256::digest(&cbor));
        self.instance.insert(key.as_bytes(), cbor)?;
        Ok(())
    }
}

impl SubmissionSink for TicketStore {
    fn submit_ticket(
        &self,
        session_id: &str,
        values: &FieldMap<String>,
    ) -> anyhow::Result<String> {
        let ticket_id = new_uuid_to_bech32("ticket_")?;
        let record = TicketRecord {
            ticket_id: ticket_id.clone(),
            session_id: session_id.to_string(),
            fields: values
                .iter()
                .map(|(field, value)| FieldValue {
                    field,
                    value: value.clone(),
                })
                .collect(),
            submitted_at: TimeStamp::new(),
        };
        let mut batch = Batch::default();
        batch.insert(ticket_id.as_bytes(), minicbor::to_vec(&record)?);
        self.instance.apply_batch(batch)?;
        Ok(ticket_id)
    }
}
