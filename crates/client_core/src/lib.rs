//! Client-side orchestration for server-rendered list and form pages:
//! fragment refreshes, JSON action calls, picker result correlation and
//! page jumps.

use std::sync::Arc;

use serde_json::Value;
use shared::protocol::{is_submit_key, page_input_element, page_url};
use tracing::info;

pub mod bridge;
pub mod fragment;
pub mod list_form;
pub mod memory;
pub mod page;
pub mod pagination;
pub mod picker;

pub use bridge::{
    handle_action_response, ActionDisposition, BridgeConfig, BridgeError, BridgeRequest,
    RequestBridge, TransportError,
};
pub use fragment::{FragmentRequest, FragmentStatus, FragmentUpdater};
pub use list_form::ListForm;
pub use memory::{MemoryPage, Notification};
pub use page::{Navigator, Notifier, PageDom, PickerKind, PickerLaunch, PickerWidget, TitleSink};
pub use pagination::PaginationController;
pub use picker::{BindingApplied, PickerCallbackStack};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTarget {
    TopLevel { base_uri: String },
    Tool { unique: String, base_uri: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageJump {
    Rejected,
    Navigated { url: String },
    Refreshed { url: String, status: FragmentStatus },
}

#[derive(Clone)]
pub struct PageCollaborators {
    pub page: Arc<dyn PageDom>,
    pub notifier: Arc<dyn Notifier>,
    pub titles: Arc<dyn TitleSink>,
    pub navigator: Arc<dyn Navigator>,
    pub picker: Arc<dyn PickerWidget>,
}

impl PageCollaborators {
    /// One object playing every collaborator role, e.g. [`MemoryPage`].
    pub fn from_single<P>(page: Arc<P>) -> Self
    where
        P: PageDom + Notifier + TitleSink + Navigator + PickerWidget + 'static,
    {
        Self {
            page: page.clone(),
            notifier: page.clone(),
            titles: page.clone(),
            navigator: page.clone(),
            picker: page,
        }
    }
}

/// Everything one page view owns. Dropped with the page; nothing persists.
pub struct PageSession {
    bridge: Arc<RequestBridge>,
    fragments: FragmentUpdater,
    pickers: PickerCallbackStack,
    pagination: PaginationController,
    list_forms: ListForm,
    page: Arc<dyn PageDom>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl PageSession {
    pub fn new(
        bridge: Arc<RequestBridge>,
        collaborators: PageCollaborators,
        picker_max_pending: usize,
    ) -> Self {
        let PageCollaborators {
            page,
            notifier,
            titles,
            navigator,
            picker,
        } = collaborators;

        Self {
            fragments: FragmentUpdater::new(Arc::clone(&bridge), Arc::clone(&page), titles),
            pickers: PickerCallbackStack::with_max_pending(
                Arc::clone(&page),
                picker,
                picker_max_pending,
            ),
            pagination: PaginationController::new(Arc::clone(&notifier)),
            list_forms: ListForm::new(Arc::clone(&page)),
            bridge,
            page,
            notifier,
            navigator,
        }
    }

    pub fn bridge(&self) -> &Arc<RequestBridge> {
        &self.bridge
    }

    pub fn fragments(&self) -> &FragmentUpdater {
        &self.fragments
    }

    pub fn pickers(&mut self) -> &mut PickerCallbackStack {
        &mut self.pickers
    }

    pub fn list_forms(&self) -> &ListForm {
        &self.list_forms
    }

    /// Runs a JSON action endpoint and applies the response contract.
    /// `None` means the request failed in transport and was only logged.
    pub async fn run_action<R, S>(
        &self,
        request: &BridgeRequest,
        on_reload: R,
        on_success: S,
    ) -> Option<ActionDisposition>
    where
        R: FnOnce(),
        S: FnOnce(Value),
    {
        let outcome = self.bridge.execute_async(request).await?;
        Some(handle_action_response(
            outcome,
            self.notifier.as_ref(),
            on_reload,
            on_success,
        ))
    }

    /// Jumps to the page typed into `id_in_<input_name>`.
    pub async fn goto(
        &self,
        target: &PageTarget,
        input_name: &str,
        page_size: u64,
        total_pages: u64,
    ) -> PageJump {
        let input = self
            .page
            .element_value(&page_input_element(input_name))
            .unwrap_or_default();
        self.goto_page(target, &input, page_size, total_pages).await
    }

    pub async fn goto_page(
        &self,
        target: &PageTarget,
        input: &str,
        page_size: u64,
        total_pages: u64,
    ) -> PageJump {
        let Some(offset) =
            self.pagination
                .jump_from_input(input, page_size, total_pages, |offset| offset)
        else {
            return PageJump::Rejected;
        };

        match target {
            PageTarget::TopLevel { base_uri } => {
                let url = page_url(base_uri, offset);
                info!(%url, "navigating list");
                self.navigator.navigate_to(&url);
                PageJump::Navigated { url }
            }
            PageTarget::Tool { unique, base_uri } => {
                let url = page_url(base_uri, offset);
                let status = self.fragments.jump_tool(unique, &url).await;
                PageJump::Refreshed { url, status }
            }
        }
    }

    pub async fn goto_on_enter(
        &self,
        target: &PageTarget,
        input_name: &str,
        page_size: u64,
        total_pages: u64,
        key_code: u32,
    ) -> Option<PageJump> {
        if !is_submit_key(key_code) {
            return None;
        }
        Some(self.goto(target, input_name, page_size, total_pages).await)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
