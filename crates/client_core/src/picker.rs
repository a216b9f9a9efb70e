//! Correlates picker dialog results with the form fields that asked for them.
//! Resolves pop the most recent binding; launches past the bound (one by
//! default) are refused.

use std::sync::Arc;

use shared::{
    domain::{FieldName, FormId, PickerBinding},
    error::BindingError,
    protocol::{
        operator_field, search_upper_field, search_value_field, split_range_value, OperatorCode,
        RangeEnd,
    },
};
use tracing::{debug, error};

use crate::page::{PageDom, PickerLaunch, PickerWidget};

pub const DEFAULT_MAX_PENDING: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingApplied {
    pub form: FormId,
    pub fields: Vec<(FieldName, String)>,
    pub submitted: bool,
}

pub struct PickerCallbackStack {
    page: Arc<dyn PageDom>,
    widget: Arc<dyn PickerWidget>,
    pending: Vec<PickerBinding>,
    max_pending: usize,
}

impl PickerCallbackStack {
    pub fn new(page: Arc<dyn PageDom>, widget: Arc<dyn PickerWidget>) -> Self {
        Self::with_max_pending(page, widget, DEFAULT_MAX_PENDING)
    }

    /// Allows up to `max_pending` nested launches; they resolve LIFO.
    pub fn with_max_pending(
        page: Arc<dyn PageDom>,
        widget: Arc<dyn PickerWidget>,
        max_pending: usize,
    ) -> Self {
        Self {
            page,
            widget,
            pending: Vec::new(),
            max_pending: max_pending.max(1),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_armed(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn launch_single(
        &mut self,
        form: impl Into<FormId>,
        field: impl Into<FieldName>,
    ) -> Result<(), BindingError> {
        self.launch(PickerBinding::single(form, field))
    }

    pub fn launch_range(
        &mut self,
        form: impl Into<FormId>,
        lower: impl Into<FieldName>,
        upper: impl Into<FieldName>,
    ) -> Result<(), BindingError> {
        self.launch(PickerBinding::range(form, lower, upper))
    }

    /// Range launch opened from the upper field; a single value lands there.
    pub fn launch_range_upper(
        &mut self,
        form: impl Into<FormId>,
        lower: impl Into<FieldName>,
        upper: impl Into<FieldName>,
    ) -> Result<(), BindingError> {
        self.launch(PickerBinding::range_from_upper(form, lower, upper))
    }

    pub fn launch_single_with_operator(
        &mut self,
        form: impl Into<FormId>,
        field: impl Into<FieldName>,
        operator_field: impl Into<FieldName>,
        operator_value: impl Into<String>,
        auto_submit: bool,
    ) -> Result<(), BindingError> {
        self.launch(
            PickerBinding::single(form, field)
                .with_operator(operator_field, operator_value)
                .with_auto_submit(auto_submit),
        )
    }

    /// Simple-search picker: fills `VL<name>` and submits the form.
    pub fn launch_search_single(
        &mut self,
        form: impl Into<FormId>,
        name: &str,
    ) -> Result<(), BindingError> {
        self.launch(PickerBinding::single(form, search_value_field(name)).with_auto_submit(true))
    }

    /// Range-search picker over `VL<name>`/`VF<name>`, tagging `OP<name>`.
    pub fn launch_search_range(
        &mut self,
        form: impl Into<FormId>,
        name: &str,
        end: RangeEnd,
    ) -> Result<(), BindingError> {
        let lower = search_value_field(name);
        let upper = search_upper_field(name);
        let binding = match end {
            RangeEnd::Lower => PickerBinding::range(form, lower, upper),
            RangeEnd::Upper => PickerBinding::range_from_upper(form, lower, upper),
        };
        self.launch(binding.with_operator(operator_field(name), end.operator().code()))
    }

    fn launch(&mut self, binding: PickerBinding) -> Result<(), BindingError> {
        if self.pending.len() >= self.max_pending {
            error!(
                form = %binding.form(),
                pending = self.pending.len(),
                "picker launched while another is outstanding"
            );
            return Err(BindingError::PickerAlreadyOutstanding {
                depth: self.pending.len(),
            });
        }

        let launch = if binding.is_range() {
            PickerLaunch::range(binding.form().clone())
        } else {
            PickerLaunch::single(binding.form().clone())
        };
        debug!(form = %binding.form(), field = %binding.primary_field(), "picker launched");
        self.pending.push(binding);
        self.widget.open(&launch);
        Ok(())
    }

    pub fn resolve_single(&mut self, value: &str) -> Result<BindingApplied, BindingError> {
        let binding = self.pop()?;
        self.page
            .set_field(binding.form(), binding.primary_field(), value);
        let fields = vec![(binding.primary_field().clone(), value.to_string())];
        let operator_value = binding.operator().map(|op| op.value.clone());
        Ok(self.finish(&binding, fields, operator_value.as_deref()))
    }

    pub fn resolve_range(&mut self, pair: &str) -> Result<BindingApplied, BindingError> {
        let binding = self.pop()?;
        let Some(range) = binding.range_fields() else {
            error!(form = %binding.form(), "range result for single-value binding");
            return Err(BindingError::NotRangeBinding {
                form: binding.form().clone(),
            });
        };
        let (lower, upper) = split_range_value(pair)?;

        self.page.set_field(binding.form(), &range.lower, lower);
        self.page.set_field(binding.form(), &range.upper, upper);
        let fields = vec![
            (range.lower.clone(), lower.to_string()),
            (range.upper.clone(), upper.to_string()),
        ];
        Ok(self.finish(&binding, fields, Some(OperatorCode::Range.code())))
    }

    fn pop(&mut self) -> Result<PickerBinding, BindingError> {
        self.pending.pop().ok_or_else(|| {
            error!("picker resolved with no pending binding");
            BindingError::NoPendingBinding
        })
    }

    /// Auto-submit is terminal; otherwise the operator field, if any, is set.
    fn finish(
        &self,
        binding: &PickerBinding,
        mut fields: Vec<(FieldName, String)>,
        operator_value: Option<&str>,
    ) -> BindingApplied {
        let form = binding.form().clone();
        if binding.auto_submit() {
            self.page.submit_form(&form);
            return BindingApplied {
                form,
                fields,
                submitted: true,
            };
        }

        if let (Some(operator), Some(value)) = (binding.operator(), operator_value) {
            self.page.set_field(&form, &operator.field, value);
            fields.push((operator.field.clone(), value.to_string()));
        }

        BindingApplied {
            form,
            fields,
            submitted: false,
        }
    }
}

#[cfg(test)]
#[path = "tests/picker_tests.rs"]
mod tests;
