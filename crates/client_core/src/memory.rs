//! Headless page that keeps markup and form state in memory and records
//! every effect the core produces.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use shared::domain::{ContainerId, FieldName, FormData, FormId};
use tracing::debug;

use crate::page::{Navigator, Notifier, PageDom, PickerLaunch, PickerWidget, TitleSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error(String),
    Info(String),
    Alert(String),
}

#[derive(Default)]
struct MemoryPageState {
    forms: HashMap<FormId, Vec<(String, String)>>,
    elements: HashMap<String, String>,
    containers: HashMap<ContainerId, String>,
    hidden: HashSet<ContainerId>,
    submissions: Vec<FormId>,
    notifications: Vec<Notification>,
    titles: Vec<String>,
    navigations: Vec<String>,
    picker_launches: Vec<PickerLaunch>,
}

#[derive(Default)]
pub struct MemoryPage {
    state: Mutex<MemoryPageState>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form<'a>(
        self,
        form: impl Into<FormId>,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        {
            let mut state = self.lock();
            let entry = state.forms.entry(form.into()).or_default();
            for (name, value) in fields {
                entry.push((name.to_string(), value.to_string()));
            }
        }
        self
    }

    pub fn with_element(self, element_id: &str, value: &str) -> Self {
        self.set_element(element_id, value);
        self
    }

    pub fn set_element(&self, element_id: &str, value: &str) {
        self.lock()
            .elements
            .insert(element_id.to_string(), value.to_string());
    }

    pub fn field(&self, form: &str, field: &str) -> Option<String> {
        self.field_value(&FormId::from(form), &FieldName::from(field))
    }

    pub fn container(&self, container: &str) -> Option<String> {
        self.lock()
            .containers
            .get(&ContainerId::from(container))
            .cloned()
    }

    pub fn is_visible(&self, container: &str) -> bool {
        !self.lock().hidden.contains(&ContainerId::from(container))
    }

    pub fn submissions(&self) -> Vec<FormId> {
        self.lock().submissions.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.lock().titles.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn picker_launches(&self) -> Vec<PickerLaunch> {
        self.lock().picker_launches.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryPageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PageDom for MemoryPage {
    fn field_value(&self, form: &FormId, field: &FieldName) -> Option<String> {
        self.lock().forms.get(form).and_then(|fields| {
            fields
                .iter()
                .find(|(name, _)| name == field.as_str())
                .map(|(_, value)| value.clone())
        })
    }

    fn set_field(&self, form: &FormId, field: &FieldName, value: &str) {
        let mut state = self.lock();
        let fields = state.forms.entry(form.clone()).or_default();
        match fields.iter_mut().find(|(name, _)| name == field.as_str()) {
            Some((_, current)) => *current = value.to_string(),
            None => fields.push((field.0.clone(), value.to_string())),
        }
    }

    fn submit_form(&self, form: &FormId) {
        debug!(form = %form, "form submitted");
        self.lock().submissions.push(form.clone());
    }

    fn serialize_form(&self, form: &FormId) -> FormData {
        self.lock()
            .forms
            .get(form)
            .map(|fields| fields.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn clear_inputs(&self, form: &FormId) {
        if let Some(fields) = self.lock().forms.get_mut(form) {
            for (_, value) in fields.iter_mut() {
                value.clear();
            }
        }
    }

    fn element_value(&self, element_id: &str) -> Option<String> {
        self.lock().elements.get(element_id).cloned()
    }

    fn replace_html(&self, container: &ContainerId, html: &str) {
        self.lock()
            .containers
            .insert(container.clone(), html.to_string());
    }

    fn set_visible(&self, container: &ContainerId, visible: bool) {
        let mut state = self.lock();
        if visible {
            state.hidden.remove(container);
        } else {
            state.hidden.insert(container.clone());
        }
    }
}

impl Notifier for MemoryPage {
    fn error(&self, message: &str) {
        self.lock()
            .notifications
            .push(Notification::Error(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.lock()
            .notifications
            .push(Notification::Info(message.to_string()));
    }

    fn alert(&self, message: &str) {
        self.lock()
            .notifications
            .push(Notification::Alert(message.to_string()));
    }
}

impl TitleSink for MemoryPage {
    fn set_dialog_title(&self, title: &str) {
        self.lock().titles.push(title.to_string());
    }
}

impl Navigator for MemoryPage {
    fn navigate_to(&self, url: &str) {
        self.lock().navigations.push(url.to_string());
    }
}

impl PickerWidget for MemoryPage {
    fn open(&self, launch: &PickerLaunch) {
        self.lock().picker_launches.push(launch.clone());
    }
}
