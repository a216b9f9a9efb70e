//! Wire conventions shared between list pages and the endpoints that render them.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

use crate::{
    domain::{ContainerId, FieldName, FormId},
    error::BindingError,
};

pub const FILTER_FIELD: &str = "filtro";
pub const SORT_FIELD: &str = "SSORT";
/// Query parameter carrying the row offset on navigation URLs.
pub const ROW_START_PARAM: &str = "rstart";
pub const OPERATOR_FIELD_PREFIX: &str = "OP";
pub const SEARCH_VALUE_PREFIX: &str = "VL";
pub const SEARCH_UPPER_PREFIX: &str = "VF";
pub const RANGE_DELIMITER: char = '|';
pub const DIALOG_BODY_CONTAINER: &str = "rigel_dialog_body";
pub const PAGE_INPUT_PREFIX: &str = "id_in_";
pub const RESOLVE_SINGLE_CALLBACK: &str = "picker.resolve_single";
pub const RESOLVE_RANGE_CALLBACK: &str = "picker.resolve_range";
pub const PAGE_NOT_ALLOWED: &str = "Page value not allowed.";
pub const ENTER_KEY_CODE: u32 = 13;

const ERROR_KEY: &str = "ERROR";
const MESSAGE_KEY: &str = "message";
const RELOAD_KEY: &str = "reload";
const RELOAD_SENTINEL: &str = "1";

static TITLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- header: (.+?) -->").expect("Invalid title marker regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Values written to the `filtro` field before a programmatic submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Reapply,
    Clear,
}

impl FilterAction {
    pub fn code(self) -> &'static str {
        match self {
            Self::Reapply => "2",
            Self::Clear => "3",
        }
    }
}

/// Operator codes written to `OP<field>` by range-search pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCode {
    LowerBound,
    Range,
}

impl OperatorCode {
    pub fn code(self) -> &'static str {
        match self {
            Self::LowerBound => "2",
            Self::Range => "8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Lower,
    Upper,
}

impl RangeEnd {
    pub fn operator(self) -> OperatorCode {
        match self {
            Self::Lower => OperatorCode::LowerBound,
            Self::Upper => OperatorCode::Range,
        }
    }
}

pub fn operator_field(name: &str) -> FieldName {
    FieldName(format!("{OPERATOR_FIELD_PREFIX}{name}"))
}

pub fn search_value_field(name: &str) -> FieldName {
    FieldName(format!("{SEARCH_VALUE_PREFIX}{name}"))
}

pub fn search_upper_field(name: &str) -> FieldName {
    FieldName(format!("{SEARCH_UPPER_PREFIX}{name}"))
}

pub fn dialog_form(kind: &str) -> FormId {
    FormId(format!("fo{kind}"))
}

pub fn dialog_body() -> ContainerId {
    ContainerId::from(DIALOG_BODY_CONTAINER)
}

pub fn page_input_element(name: &str) -> String {
    format!("{PAGE_INPUT_PREFIX}{name}")
}

/// Element names of an embedded "tool" panel identified by `unique`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContainers {
    pub form: FormId,
    pub search: ContainerId,
    pub data: ContainerId,
    pub body: ContainerId,
}

impl ToolContainers {
    pub fn new(unique: &str) -> Self {
        Self {
            form: FormId(format!("fo_{unique}")),
            search: ContainerId(format!("search_{unique}")),
            data: ContainerId(format!("data_{unique}")),
            body: ContainerId(format!("body_{unique}")),
        }
    }
}

/// Next `SSORT` value after clicking `column`: the same column flips the
/// direction, any other column starts ascending. A current value with no
/// representable opposite counts as unsorted.
pub fn toggle_sort(current: i64, column: i64) -> i64 {
    match current.checked_neg() {
        Some(flipped) if current.abs() == column => flipped,
        _ => column,
    }
}

/// Captures `TEXT` from the first `<!-- header: TEXT -->` marker.
///
/// This is a fixed-literal match, not a markup parser: the capture is
/// non-greedy and ends at the first ` -->`.
pub fn extract_title_marker(body: &str) -> Option<&str> {
    TITLE_MARKER
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|capture| capture.as_str())
}

/// Appends `key=value` to `base`, using `&` when a query is already present.
pub fn with_query(base: &str, key: &str, value: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    format!("{base}{separator}{key}={encoded}")
}

pub fn page_url(base_uri: &str, row_offset: u64) -> String {
    with_query(base_uri, ROW_START_PARAM, &row_offset.to_string())
}

pub fn split_range_value(value: &str) -> Result<(&str, &str), BindingError> {
    match value.split_once(RANGE_DELIMITER) {
        Some((lower, upper)) if !upper.contains(RANGE_DELIMITER) => Ok((lower, upper)),
        _ => Err(BindingError::MalformedRange {
            value: value.to_string(),
        }),
    }
}

pub fn is_submit_key(key_code: u32) -> bool {
    key_code == ENTER_KEY_CODE
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub error: Option<String>,
    pub info: Option<String>,
    pub reload: bool,
    pub payload: Value,
}

impl RequestOutcome {
    /// Reads the recognized keys; a missing or empty key means "not set".
    pub fn from_json(payload: Value) -> Self {
        let (error, info, reload) = match &payload {
            Value::Object(map) => (
                non_empty_string(map.get(ERROR_KEY)),
                non_empty_string(map.get(MESSAGE_KEY)),
                map.get(RELOAD_KEY).is_some_and(is_reload_sentinel),
            ),
            _ => (None, None, false),
        };

        Self {
            error,
            info,
            reload,
            payload,
        }
    }

    pub fn classify(self) -> ActionOutcome {
        if let Some(message) = self.error {
            ActionOutcome::Failed { message }
        } else if self.reload {
            ActionOutcome::Reload { info: self.info }
        } else {
            ActionOutcome::Success {
                info: self.info,
                payload: self.payload,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Failed { message: String },
    Reload { info: Option<String> },
    Success { info: Option<String>, payload: Value },
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn is_reload_sentinel(value: &Value) -> bool {
    match value {
        Value::String(text) => text == RELOAD_SENTINEL,
        Value::Number(number) => number.as_i64() == Some(1),
        Value::Bool(flag) => *flag,
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
