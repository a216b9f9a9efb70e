//! In-place replacement of page fragments with server-rendered markup.
//!
//! Each dispatch takes a ticket for its target container; a response is
//! applied only while its ticket is still the latest one issued for that
//! container, so an older request finishing late never overwrites newer content.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::{
    domain::{ContainerId, FormData},
    protocol::{
        dialog_body, dialog_form, extract_title_marker, with_query, FilterAction, HttpMethod,
        ToolContainers, FILTER_FIELD,
    },
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    bridge::{log_transport_failure, BridgeRequest, RequestBridge},
    page::{PageDom, TitleSink},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRequest {
    pub target: ContainerId,
    /// Emptied before dispatch so stale content is not shown in flight.
    pub clear: Option<ContainerId>,
    pub endpoint: String,
    pub method: HttpMethod,
    pub body: Option<FormData>,
}

impl FragmentRequest {
    pub fn get(target: ContainerId, endpoint: impl Into<String>) -> Self {
        Self {
            target,
            clear: None,
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            body: None,
        }
    }

    pub fn post(target: ContainerId, endpoint: impl Into<String>, body: FormData) -> Self {
        Self {
            target,
            clear: None,
            endpoint: endpoint.into(),
            method: HttpMethod::Post,
            body: Some(body),
        }
    }

    pub fn clearing(mut self, container: ContainerId) -> Self {
        self.clear = Some(container);
        self
    }

    fn bridge_request(&self) -> BridgeRequest {
        BridgeRequest {
            endpoint: self.endpoint.clone(),
            method: self.method,
            body: self.body.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentStatus {
    Applied { title: Option<String> },
    /// A newer request for the same container was dispatched meanwhile.
    Superseded,
    Failed,
}

pub struct FragmentUpdater {
    bridge: Arc<RequestBridge>,
    page: Arc<dyn PageDom>,
    titles: Arc<dyn TitleSink>,
    next_ticket: AtomicU64,
    latest: Mutex<HashMap<ContainerId, u64>>,
}

impl FragmentUpdater {
    pub fn new(
        bridge: Arc<RequestBridge>,
        page: Arc<dyn PageDom>,
        titles: Arc<dyn TitleSink>,
    ) -> Self {
        Self {
            bridge,
            page,
            titles,
            next_ticket: AtomicU64::new(1),
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub async fn update_fragment(&self, request: &FragmentRequest) -> FragmentStatus {
        if let Some(clear) = &request.clear {
            self.page.clear_container(clear);
        }
        let ticket = self.issue_ticket(&request.target).await;

        let bridge_request = request.bridge_request();
        let html = match self.bridge.fetch_text(&bridge_request).await {
            Ok(html) => html,
            Err(err) => {
                log_transport_failure(&bridge_request, &err);
                return FragmentStatus::Failed;
            }
        };

        // Held through the write so a newer ticket cannot land in between.
        let latest = self.latest.lock().await;
        if latest.get(&request.target) != Some(&ticket) {
            debug!(
                container = %request.target,
                ticket,
                "dropping response superseded by a newer request"
            );
            return FragmentStatus::Superseded;
        }
        self.page.replace_html(&request.target, &html);
        drop(latest);

        let title = extract_title_marker(&html).map(str::to_owned);
        if let Some(title) = &title {
            self.titles.set_dialog_title(title);
        }
        debug!(container = %request.target, ticket, title = ?title, "fragment applied");

        FragmentStatus::Applied { title }
    }

    async fn issue_ticket(&self, container: &ContainerId) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.latest.lock().await.insert(container.clone(), ticket);
        ticket
    }

    pub async fn submit_tool(&self, unique: &str, url: &str) -> FragmentStatus {
        let tool = ToolContainers::new(unique);
        let body = self.page.serialize_form(&tool.form);
        self.update_fragment(&FragmentRequest::post(tool.body, url, body).clearing(tool.search))
            .await
    }

    pub async fn search_tool(&self, unique: &str, url: &str) -> FragmentStatus {
        let tool = ToolContainers::new(unique);
        let body = self.page.serialize_form(&tool.form);
        self.update_fragment(&FragmentRequest::post(tool.body, url, body).clearing(tool.data))
            .await
    }

    pub async fn jump_tool(&self, unique: &str, url: &str) -> FragmentStatus {
        let tool = ToolContainers::new(unique);
        self.update_fragment(&FragmentRequest::get(tool.body, url))
            .await
    }

    pub async fn clear_tool_search(&self, unique: &str, url: &str) -> FragmentStatus {
        let url = with_query(url, FILTER_FIELD, FilterAction::Clear.code());
        self.jump_tool(unique, &url).await
    }

    pub fn show_tool_search(&self, unique: &str) {
        let tool = ToolContainers::new(unique);
        self.page.set_visible(&tool.data, false);
        self.page.set_visible(&tool.search, true);
    }

    pub fn hide_tool_search(&self, unique: &str) {
        let tool = ToolContainers::new(unique);
        self.page.set_visible(&tool.search, false);
        self.page.set_visible(&tool.data, true);
    }

    pub async fn submit_direct_list(&self, kind: &str, url: &str) -> FragmentStatus {
        self.submit_dialog_form(kind, url).await
    }

    pub async fn submit_direct_form(&self, kind: &str, url: &str) -> FragmentStatus {
        self.submit_dialog_form(kind, url).await
    }

    pub async fn jump_direct_list(&self, url: &str) -> FragmentStatus {
        self.update_fragment(&FragmentRequest::get(dialog_body(), url))
            .await
    }

    async fn submit_dialog_form(&self, kind: &str, url: &str) -> FragmentStatus {
        let body = self.page.serialize_form(&dialog_form(kind));
        self.update_fragment(&FragmentRequest::post(dialog_body(), url, body))
            .await
    }
}

#[cfg(test)]
#[path = "tests/fragment_tests.rs"]
mod tests;
