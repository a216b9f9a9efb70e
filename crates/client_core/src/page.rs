//! Collaborators the page provides: markup access, notifications, dialog
//! title, top-level navigation and the external picker widget.

use shared::{
    domain::{ContainerId, FieldName, FormData, FormId},
    protocol::{RESOLVE_RANGE_CALLBACK, RESOLVE_SINGLE_CALLBACK},
};

pub trait PageDom: Send + Sync {
    fn field_value(&self, form: &FormId, field: &FieldName) -> Option<String>;
    fn set_field(&self, form: &FormId, field: &FieldName, value: &str);
    fn submit_form(&self, form: &FormId);
    fn serialize_form(&self, form: &FormId) -> FormData;
    fn clear_inputs(&self, form: &FormId);
    fn element_value(&self, element_id: &str) -> Option<String>;
    fn replace_html(&self, container: &ContainerId, html: &str);
    fn set_visible(&self, container: &ContainerId, visible: bool);

    fn clear_container(&self, container: &ContainerId) {
        self.replace_html(container, "");
    }
}

pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
    /// Server-signaled advisory; handling continues.
    fn info(&self, message: &str);
    fn alert(&self, message: &str);
}

pub trait TitleSink: Send + Sync {
    fn set_dialog_title(&self, title: &str);
}

pub trait Navigator: Send + Sync {
    fn navigate_to(&self, url: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Single,
    Range,
}

/// What the picker widget is asked to open, and which resolver it must call back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerLaunch {
    pub form: FormId,
    pub kind: PickerKind,
    pub single_callback: &'static str,
    pub range_callback: Option<&'static str>,
}

impl PickerLaunch {
    pub fn single(form: FormId) -> Self {
        Self {
            form,
            kind: PickerKind::Single,
            single_callback: RESOLVE_SINGLE_CALLBACK,
            range_callback: None,
        }
    }

    pub fn range(form: FormId) -> Self {
        Self {
            form,
            kind: PickerKind::Range,
            single_callback: RESOLVE_SINGLE_CALLBACK,
            range_callback: Some(RESOLVE_RANGE_CALLBACK),
        }
    }
}

/// External modal picker. It answers later, out of band, by invoking one of
/// the callbacks named in the launch.
pub trait PickerWidget: Send + Sync {
    fn open(&self, launch: &PickerLaunch);
}
