//! Alert dispatcher.
//!
//! Serialises an [`AlertRecord`] to JSON and hands it to an
//! [`AlertSink`].  Delivery is best effort: a failure is logged, counted
//! and returned, and the caller carries on.  Any HTTP status that comes
//! back counts as delivered; the code is logged, not validated.

use log::{info, warn};

use crate::error::DeliveryError;

use super::events::AlertRecord;
use super::ports::AlertSink;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u32,
    pub failed: u32,
    pub last_status: Option<u16>,
    pub last_error: Option<DeliveryError>,
}

pub struct AlertDispatcher<S: AlertSink> {
    sink: S,
    stats: DispatchStats,
}

impl<S: AlertSink> AlertDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, stats: DispatchStats::default() }
    }

    /// Render the JSON body for `record`.
    pub fn serialise(record: &AlertRecord) -> Result<Vec<u8>, DeliveryError> {
        serde_json::to_vec(record).map_err(|_| DeliveryError::Serialise)
    }

    /// Deliver one record.  Returns the HTTP status on success.
    pub fn dispatch(&mut self, record: &AlertRecord) -> Result<u16, DeliveryError> {
        let result = self.try_dispatch(record);
        match result {
            Ok(status) => {
                self.stats.delivered = self.stats.delivered.saturating_add(1);
                self.stats.last_status = Some(status);
                info!("HTTP [{}]: code={}", record.severity, status);
            }
            Err(e) => {
                self.stats.failed = self.stats.failed.saturating_add(1);
                self.stats.last_error = Some(e);
                warn!("Alert not delivered ({}): {}", e, record);
            }
        }
        result
    }

    fn try_dispatch(&mut self, record: &AlertRecord) -> Result<u16, DeliveryError> {
        if !self.sink.is_connected() {
            return Err(DeliveryError::NetworkDown);
        }
        let body = Self::serialise(record)?;
        self.sink.post_json(&body)
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
