use thiserror::Error;

use crate::domain::FormId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("picker resolved with no pending binding")]
    NoPendingBinding,
    #[error("picker already outstanding (pending={depth}); resolve it before launching another")]
    PickerAlreadyOutstanding { depth: usize },
    #[error("range value {value:?} is not two values separated by '|'")]
    MalformedRange { value: String },
    #[error("range value delivered to single-value binding on form {form}")]
    NotRangeBinding { form: FormId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page {requested} outside 1..={total_pages}")]
    OutOfRange { requested: i64, total_pages: u64 },
    #[error("page input {input:?} is not a number")]
    NotANumber { input: String },
    #[error("page size must be positive")]
    InvalidPageSize,
    #[error("row offset overflows for page {requested} with page size {page_size}")]
    OffsetOverflow { requested: i64, page_size: u64 },
}
