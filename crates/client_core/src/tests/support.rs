//! Local list-page server used by the network tests.

use std::{collections::HashMap, sync::mpsc, time::Duration};

use axum::{
    extract::Query,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const SLOW_RESPONSE_DELAY: Duration = Duration::from_millis(250);

async fn orders_fragment() -> Html<&'static str> {
    Html("<!-- header: Orders List --><table><tr><td>1</td></tr></table>")
}

async fn plain_fragment() -> Html<&'static str> {
    Html("<p>plain</p>")
}

async fn echo_form(body: String) -> Html<String> {
    Html(format!("<!-- header: Search Results --><pre>{body}</pre>"))
}

async fn echo_query(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    let mut pairs: Vec<_> = params.into_iter().collect();
    pairs.sort();
    let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    Html(format!("<p>{}</p>", rendered.join(";")))
}

async fn slow_fragment() -> Html<&'static str> {
    tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
    Html("<p>slow</p>")
}

async fn fast_fragment() -> Html<&'static str> {
    Html("<p>fast</p>")
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn action_error() -> Json<Value> {
    Json(json!({"ERROR": "not found"}))
}

async fn action_reload() -> Json<Value> {
    Json(json!({"reload": "1"}))
}

async fn action_ok() -> Json<Value> {
    Json(json!({"foo": 1}))
}

async fn action_advice() -> Json<Value> {
    Json(json!({"message": "check the dates", "rows": 3}))
}

async fn action_echo(body: String) -> Json<Value> {
    Json(json!({"received": body}))
}

async fn not_json() -> Html<&'static str> {
    Html("<p>not json</p>")
}

fn page_router() -> Router {
    Router::new()
        .route("/fragment/orders", get(orders_fragment))
        .route("/fragment/plain", get(plain_fragment))
        .route("/fragment/echo", post(echo_form))
        .route("/fragment/query", get(echo_query))
        .route("/fragment/slow", get(slow_fragment))
        .route("/fragment/fast", get(fast_fragment))
        .route("/broken", get(broken).post(broken))
        .route("/action/error", get(action_error))
        .route("/action/reload", get(action_reload))
        .route("/action/ok", get(action_ok))
        .route("/action/advice", get(action_advice))
        .route("/action/echo", post(action_echo))
        .route("/action/not-json", get(not_json))
}

pub async fn spawn_page_server() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, page_router()).await;
    });
    format!("http://{addr}")
}

/// Same server on its own thread and runtime, for blocking-client tests.
pub fn spawn_page_server_thread() -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("server runtime");
        runtime.block_on(async move {
            let url = spawn_page_server().await;
            tx.send(url).expect("send server url");
            std::future::pending::<()>().await;
        });
    });
    rx.recv().expect("server url")
}
