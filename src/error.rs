use crate::field::Field;

#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("page {0} still has empty, invalid or in-flight fields")]
    PageIncomplete(u8),
    #[error("no validation request in flight for {0}")]
    NoRequestInFlight(Field),
    #[error("{0} cannot be edited while its validation request is in flight")]
    FieldLocked(Field),
    #[error("review page is incomplete; every field needs a value before submission")]
    TicketIncomplete,
}
