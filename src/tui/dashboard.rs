use tracing::{debug, warn};

use super::viewport::{apply_scroll, compute_scroll_limits, filter_by_substring, ScrollInput};
use crate::history::HistoryTracker;
use crate::monitor::{FetchEvent, Pacing};
use crate::validator::ValidatorRecord;

/// Everything the dashboard shows. Only the render loop mutates it.
pub struct Dashboard {
    chain_id: String,
    validators: Vec<ValidatorRecord>,
    history: HistoryTracker,
    query: Option<String>,
    scroll_offset: usize,
    pacing: Pacing,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(
        chain_id: String,
        validators: Vec<ValidatorRecord>,
        history: HistoryTracker,
        pacing: Pacing,
    ) -> Self {
        Self {
            chain_id,
            validators,
            history,
            query: None,
            scroll_offset: 0,
            pacing,
            last_error: None,
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Validators currently listed, after the search filter.
    pub fn visible_rows(&self) -> Vec<&ValidatorRecord> {
        filter_by_substring(&self.validators, self.query.as_deref().unwrap_or(""))
    }

    pub fn apply_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Block { pointer, pacing } => {
                self.pacing = pacing;
                match self.history.record_block(&pointer) {
                    Ok(()) => self.last_error = None,
                    Err(e) => {
                        warn!("Dropping block: {}", e);
                        self.last_error = Some(e.to_string());
                    }
                }
            }
            FetchEvent::Waiting { pacing } => {
                self.pacing = pacing;
                self.last_error = None;
            }
            FetchEvent::Failed { reason, pacing } => {
                self.pacing = pacing;
                self.last_error = Some(reason);
            }
        }
    }

    /// Replace the search filter. An empty query clears it.
    pub fn set_query(&mut self, query: String) {
        debug!("Search query {:?}", query);
        self.query = if query.is_empty() { None } else { Some(query) };
        self.scroll_offset = 0;
    }

    pub fn scroll(&mut self, input: ScrollInput, terminal_height: usize) {
        let limits = compute_scroll_limits(self.visible_rows().len(), terminal_height);
        self.scroll_offset = apply_scroll(input, self.scroll_offset, limits.max_offset, limits.page_size);
    }

    /// Keep the offset valid after a resize or a filter change.
    pub fn clamp_scroll(&mut self, terminal_height: usize) {
        let limits = compute_scroll_limits(self.visible_rows().len(), terminal_height);
        self.scroll_offset = self.scroll_offset.min(limits.max_offset);
    }
}
