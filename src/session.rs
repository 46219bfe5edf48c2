//! Discards analyses that finish after a newer one was requested.
//!
//! Each [`AnalysisSession::begin`] bumps a generation counter. A result is
//! only applied if its ticket still carries the latest generation, so a slow
//! fetch for an old date can never overwrite the currently selected one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    generation: u64,
    date: NaiveDate,
}

impl AnalysisTicket {
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Shared generation counter; clones observe the same generation.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    generation: Arc<AtomicU64>,
    latest_date: Arc<Mutex<Option<NaiveDate>>>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an analysis for `date`, superseding any in flight.
    pub fn begin(&self, date: NaiveDate) -> AnalysisTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut latest) = self.latest_date.lock() {
            *latest = Some(date);
        }
        AnalysisTicket { generation, date }
    }

    pub fn is_current(&self, ticket: &AnalysisTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Date of the most recently begun analysis.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.latest_date.lock().ok().and_then(|d| *d)
    }

    /// Hand `value` back if `ticket` is still current, else report it superseded.
    pub fn finish<T>(&self, ticket: AnalysisTicket, value: T) -> Result<T> {
        if self.is_current(&ticket) {
            return Ok(value);
        }
        let current = self.latest_date().unwrap_or(ticket.date);
        debug!(requested = %ticket.date, %current, "discarding superseded analysis");
        Err(AnalyticsError::Superseded {
            requested: ticket.date,
            current,
        })
    }
}
