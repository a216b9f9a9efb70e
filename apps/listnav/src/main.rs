use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    handle_action_response, ActionDisposition, BridgeRequest, FragmentRequest, FragmentStatus,
    MemoryPage, Notification, PageCollaborators, PageJump, PageSession, PageTarget,
    RequestBridge,
};
use serde_json::Value;
use shared::domain::{ContainerId, FormData};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

const CLI_CONTAINER: &str = "listnav";

#[derive(Parser, Debug)]
#[command(about = "Drive server-rendered list pages from the command line")]
struct Args {
    /// Overrides the configured base url.
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a markup fragment; `--field` switches to a form POST.
    Fragment {
        endpoint: String,
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Call a JSON action endpoint.
    Action {
        endpoint: String,
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// Use the blocking request mode.
        #[arg(long)]
        sync: bool,
    },
    /// Jump to a page of a list or of a tool panel.
    Page {
        #[arg(long)]
        base_uri: String,
        #[arg(long)]
        requested: String,
        #[arg(long)]
        total_pages: u64,
        #[arg(long)]
        page_size: Option<u64>,
        /// Tool panel id; refreshes `body_<tool>` instead of navigating.
        #[arg(long)]
        tool: Option<String>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

fn form_data(fields: &[(String, String)]) -> FormData {
    fields
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

fn request_for(endpoint: String, fields: &[(String, String)]) -> BridgeRequest {
    if fields.is_empty() {
        BridgeRequest::get(endpoint)
    } else {
        BridgeRequest::post(endpoint, form_data(fields))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(base_url) = args.base_url.clone() {
        settings.base_url = base_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    debug!(?settings, "loaded settings");

    let bridge = Arc::new(
        RequestBridge::new(settings.bridge_config())
            .with_context(|| format!("invalid base url {}", settings.base_url))?,
    );
    let page = Arc::new(MemoryPage::new());

    match args.command {
        Command::Action {
            endpoint,
            fields,
            sync: true,
        } => {
            let request = request_for(endpoint, &fields);
            let Some(outcome) = bridge.execute_sync(&request) else {
                bail!("request to {} failed; see log", request.endpoint);
            };
            let disposition =
                handle_action_response(outcome, page.as_ref(), report_reload, print_payload);
            report(&page, disposition);
            Ok(())
        }
        command => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to build runtime")?;
            runtime.block_on(run(command, bridge, page, &settings))
        }
    }
}

async fn run(
    command: Command,
    bridge: Arc<RequestBridge>,
    page: Arc<MemoryPage>,
    settings: &Settings,
) -> Result<()> {
    let session = PageSession::new(
        bridge,
        PageCollaborators::from_single(page.clone()),
        settings.picker_max_pending,
    );

    match command {
        Command::Fragment { endpoint, fields } => {
            let target = ContainerId::from(CLI_CONTAINER);
            let request = if fields.is_empty() {
                FragmentRequest::get(target, endpoint)
            } else {
                FragmentRequest::post(target, endpoint, form_data(&fields))
            };
            match session.fragments().update_fragment(&request).await {
                FragmentStatus::Applied { title } => {
                    if let Some(title) = title {
                        println!("title: {title}");
                    }
                    println!("{}", page.container(CLI_CONTAINER).unwrap_or_default());
                }
                FragmentStatus::Superseded => println!("response superseded"),
                FragmentStatus::Failed => bail!("fragment request failed; see log"),
            }
        }
        Command::Action {
            endpoint, fields, ..
        } => {
            let request = request_for(endpoint, &fields);
            let Some(disposition) = session
                .run_action(&request, report_reload, print_payload)
                .await
            else {
                bail!("request to {} failed; see log", request.endpoint);
            };
            report(&page, disposition);
        }
        Command::Page {
            base_uri,
            requested,
            total_pages,
            page_size,
            tool,
        } => {
            let page_size = page_size.unwrap_or(settings.page_size);
            let target = match tool {
                Some(unique) => PageTarget::Tool { unique, base_uri },
                None => PageTarget::TopLevel { base_uri },
            };
            match session
                .goto_page(&target, &requested, page_size, total_pages)
                .await
            {
                PageJump::Rejected => {
                    print_notifications(&page);
                    bail!("page {requested} rejected");
                }
                PageJump::Navigated { url } => println!("navigate: {url}"),
                PageJump::Refreshed { url, status } => {
                    println!("refreshed from {url}: {status:?}");
                    if let PageTarget::Tool { unique, .. } = &target {
                        let body = format!("body_{unique}");
                        println!("{}", page.container(&body).unwrap_or_default());
                    }
                }
            }
        }
    }

    Ok(())
}

fn report_reload() {
    println!("reload requested");
}

fn print_payload(payload: Value) {
    match serde_json::to_string_pretty(&payload) {
        Ok(rendered) => println!("{rendered}"),
        Err(_) => println!("{payload}"),
    }
}

fn report(page: &MemoryPage, disposition: ActionDisposition) {
    print_notifications(page);
    debug!(?disposition, "action handled");
}

fn print_notifications(page: &MemoryPage) {
    for notification in page.notifications() {
        match notification {
            Notification::Error(message) => eprintln!("error: {message}"),
            Notification::Info(message) => println!("info: {message}"),
            Notification::Alert(message) => eprintln!("alert: {message}"),
        }
    }
}
