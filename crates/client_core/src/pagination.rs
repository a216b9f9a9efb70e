use std::sync::Arc;

use shared::{domain::PaginationRequest, error::PageError, protocol::PAGE_NOT_ALLOWED};
use tracing::{debug, warn};

use crate::page::Notifier;

pub struct PaginationController {
    notifier: Arc<dyn Notifier>,
}

impl PaginationController {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Calls `navigate` with `(requested_page - 1) * page_size` when the page
    /// is within `1..=total_pages`; otherwise raises the blocking notice once
    /// and navigates nowhere.
    pub fn jump_to_page<F, R>(&self, request: &PaginationRequest, navigate: F) -> Option<R>
    where
        F: FnOnce(u64) -> R,
    {
        match request.row_offset() {
            Ok(offset) => {
                debug!(page = request.requested_page, offset, "jumping to page");
                Some(navigate(offset))
            }
            Err(err) => {
                self.reject(&err);
                None
            }
        }
    }

    pub fn jump_from_input<F, R>(
        &self,
        input: &str,
        page_size: u64,
        total_pages: u64,
        navigate: F,
    ) -> Option<R>
    where
        F: FnOnce(u64) -> R,
    {
        match parse_page_input(input) {
            Ok(page) => {
                self.jump_to_page(&PaginationRequest::new(page, page_size, total_pages), navigate)
            }
            Err(err) => {
                self.reject(&err);
                None
            }
        }
    }

    fn reject(&self, err: &PageError) {
        warn!(error = %err, "page jump rejected");
        self.notifier.alert(PAGE_NOT_ALLOWED);
    }
}

pub fn parse_page_input(input: &str) -> Result<i64, PageError> {
    let trimmed = input.trim();
    trimmed.parse::<i64>().map_err(|_| PageError::NotANumber {
        input: trimmed.to_string(),
    })
}
