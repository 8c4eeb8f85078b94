//! Order submission port.

use crate::domain::error::DcaError;
use crate::domain::order::TradeOrder;

pub trait OrderSubmission {
    /// Submit one order. A single attempt; failures come back as
    /// [`DcaError::Submission`] or [`DcaError::Api`].
    fn submit(&self, order: &TradeOrder) -> Result<(), DcaError>;
}
