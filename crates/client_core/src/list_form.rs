use std::sync::Arc;

use shared::{
    domain::{FieldName, FormId},
    protocol::{is_submit_key, toggle_sort, FilterAction, FILTER_FIELD, SORT_FIELD},
};
use tracing::debug;

use crate::page::PageDom;

pub struct ListForm {
    page: Arc<dyn PageDom>,
}

impl ListForm {
    pub fn new(page: Arc<dyn PageDom>) -> Self {
        Self { page }
    }

    /// Returns the new signed sort value.
    pub fn simple_sort(&self, form: &FormId, column: i64) -> i64 {
        let sort_field = FieldName::from(SORT_FIELD);
        let current = self
            .page
            .field_value(form, &sort_field)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(0);
        let next = toggle_sort(current, column);
        debug!(form = %form, current, next, "toggling sort");

        self.page.set_field(form, &sort_field, &next.to_string());
        self.submit_with_filter(form, FilterAction::Reapply);
        next
    }

    pub fn clear_simple_search(&self, form: &FormId) {
        self.page.clear_inputs(form);
        self.submit_with_filter(form, FilterAction::Clear);
    }

    /// Submits on Enter; returns whether the key press should proceed as usual.
    pub fn submit_on_enter(&self, form: &FormId, key_code: u32) -> bool {
        if is_submit_key(key_code) {
            self.page.submit_form(form);
            return false;
        }
        true
    }

    fn submit_with_filter(&self, form: &FormId, action: FilterAction) {
        self.page
            .set_field(form, &FieldName::from(FILTER_FIELD), action.code());
        self.page.submit_form(form);
    }
}
