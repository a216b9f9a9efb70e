use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::PageError;

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

name_newtype!(FormId);
name_newtype!(ContainerId);
name_newtype!(FieldName);

/// Ordered name/value pairs of a form, serialized verbatim for POST bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<N, V> FromIterator<(N, V)> for FormData
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFields {
    pub lower: FieldName,
    pub upper: FieldName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorAssignment {
    pub field: FieldName,
    pub value: String,
}

/// Field binding recorded when a picker dialog is launched. Range bindings
/// always carry both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerBinding {
    form: FormId,
    primary: FieldName,
    range: Option<RangeFields>,
    operator: Option<OperatorAssignment>,
    auto_submit: bool,
}

impl PickerBinding {
    pub fn single(form: impl Into<FormId>, field: impl Into<FieldName>) -> Self {
        Self {
            form: form.into(),
            primary: field.into(),
            range: None,
            operator: None,
            auto_submit: false,
        }
    }

    /// Range binding whose single-value fallback targets the lower field.
    pub fn range(
        form: impl Into<FormId>,
        lower: impl Into<FieldName>,
        upper: impl Into<FieldName>,
    ) -> Self {
        let lower = lower.into();
        Self {
            form: form.into(),
            primary: lower.clone(),
            range: Some(RangeFields {
                lower,
                upper: upper.into(),
            }),
            operator: None,
            auto_submit: false,
        }
    }

    /// Range binding whose single-value fallback targets the upper field.
    pub fn range_from_upper(
        form: impl Into<FormId>,
        lower: impl Into<FieldName>,
        upper: impl Into<FieldName>,
    ) -> Self {
        let upper = upper.into();
        Self {
            form: form.into(),
            primary: upper.clone(),
            range: Some(RangeFields {
                lower: lower.into(),
                upper,
            }),
            operator: None,
            auto_submit: false,
        }
    }

    pub fn with_operator(mut self, field: impl Into<FieldName>, value: impl Into<String>) -> Self {
        self.operator = Some(OperatorAssignment {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_auto_submit(mut self, auto_submit: bool) -> Self {
        self.auto_submit = auto_submit;
        self
    }

    pub fn form(&self) -> &FormId {
        &self.form
    }

    pub fn primary_field(&self) -> &FieldName {
        &self.primary
    }

    pub fn range_fields(&self) -> Option<&RangeFields> {
        self.range.as_ref()
    }

    pub fn operator(&self) -> Option<&OperatorAssignment> {
        self.operator.as_ref()
    }

    pub fn auto_submit(&self) -> bool {
        self.auto_submit
    }

    pub fn is_range(&self) -> bool {
        self.range.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationRequest {
    /// 1-based; may be out of range since it comes from user input.
    pub requested_page: i64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl PaginationRequest {
    pub fn new(requested_page: i64, page_size: u64, total_pages: u64) -> Self {
        Self {
            requested_page,
            page_size,
            total_pages,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.row_offset().is_ok()
    }

    /// Zero-based count of rows to skip: `(requested_page - 1) * page_size`.
    pub fn row_offset(&self) -> Result<u64, PageError> {
        if self.page_size == 0 {
            return Err(PageError::InvalidPageSize);
        }
        let in_range = u64::try_from(self.requested_page)
            .map(|page| page >= 1 && page <= self.total_pages)
            .unwrap_or(false);
        if !in_range {
            return Err(PageError::OutOfRange {
                requested: self.requested_page,
                total_pages: self.total_pages,
            });
        }

        let page_index = self.requested_page.unsigned_abs() - 1;
        page_index
            .checked_mul(self.page_size)
            .ok_or(PageError::OffsetOverflow {
                requested: self.requested_page,
                page_size: self.page_size,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_binding_sets_both_ends_and_primary() {
        let binding = PickerBinding::range("fo_orders", "from", "to");
        let range = binding.range_fields().expect("range fields");
        assert_eq!(range.lower.as_str(), "from");
        assert_eq!(range.upper.as_str(), "to");
        assert_eq!(binding.primary_field().as_str(), "from");

        let upper = PickerBinding::range_from_upper("fo_orders", "from", "to");
        assert_eq!(upper.primary_field().as_str(), "to");
    }

    #[test]
    fn single_binding_has_no_range() {
        let binding = PickerBinding::single("fo_orders", "due").with_auto_submit(true);
        assert!(!binding.is_range());
        assert!(binding.auto_submit());
        assert!(binding.operator().is_none());
    }

    #[test]
    fn form_data_encodes_in_insertion_order() {
        let form: FormData = [("b", "2"), ("a", "x y"), ("b", "3")].into_iter().collect();
        assert_eq!(form.encode(), "b=2&a=x+y&b=3");
        assert_eq!(form.get("b"), Some("2"));
    }

    #[test]
    fn row_offset_rejects_out_of_range_pages() {
        assert_eq!(
            PaginationRequest::new(0, 20, 5).row_offset(),
            Err(PageError::OutOfRange {
                requested: 0,
                total_pages: 5
            })
        );
        assert!(PaginationRequest::new(6, 20, 5).row_offset().is_err());
        assert!(PaginationRequest::new(-3, 20, 5).row_offset().is_err());
        assert!(PaginationRequest::new(1, 20, 0).row_offset().is_err());
        assert_eq!(
            PaginationRequest::new(1, 0, 5).row_offset(),
            Err(PageError::InvalidPageSize)
        );
    }

    #[test]
    fn row_offset_for_valid_pages() {
        assert_eq!(PaginationRequest::new(1, 20, 5).row_offset(), Ok(0));
        assert_eq!(PaginationRequest::new(5, 20, 5).row_offset(), Ok(80));
    }
}
