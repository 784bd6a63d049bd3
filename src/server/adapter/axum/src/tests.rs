/* src/server/adapter/axum/src/tests.rs */

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use trellis_server::{BoxError, LoaderResult, Outcome, RegistryLoader, RouteExports, TrellisServer};

use super::*;

fn app_dir(files: &[&str]) -> tempfile::TempDir {
  let dir = tempfile::tempdir().unwrap();
  for f in files {
    let path = dir.path().join("pages").join(f);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
  }
  dir
}

fn loader() -> RegistryLoader {
  RegistryLoader::new()
    .module("index.rs", |_| {
      Ok(RouteExports::new().loader(|_| async move {
        Ok(LoaderResult::new().prop("greeting", json!("hi")).into())
      }))
    })
    .module("old.rs", |_| {
      Ok(RouteExports::new().loader(|ctx| async move { Ok(ctx.redirect("/", true)) }))
    })
    .module("login.rs", |_| {
      Ok(RouteExports::new().loader(|ctx| async move { Ok(ctx.redirect("/", false)) }))
    })
    .module("api/posts/[id].rs", |_| {
      Ok(RouteExports::new().get(|ctx| async move {
        Ok(ctx.response(json!({"id": ctx.param("id")}), 201))
      }))
    })
    .module("api/broken.rs", |_| {
      Ok(RouteExports::new().get(|_| async move { Err::<Outcome, BoxError>("disk full".into()) }))
    })
}

fn router(dir: &Path) -> axum::Router {
  TrellisServer::new(dir).loader(loader()).start().unwrap().into_axum_router()
}

const FILES: &[&str] = &["index.rs", "old.rs", "login.rs", "api/posts/[id].rs", "api/broken.rs"];

async fn send(router: axum::Router, method: &str, uri: &str) -> Response {
  let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
  router.oneshot(req).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = resp.into_body().collect().await.unwrap().to_bytes();
  serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn api_response_keeps_status_and_body() {
  let dir = app_dir(FILES);
  let resp = send(router(dir.path()), "GET", "/api/posts/42").await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert_eq!(json_body(resp).await, json!({"id": "42"}));
}

#[tokio::test]
async fn permanent_redirect_is_301_with_location() {
  let dir = app_dir(FILES);
  let resp = send(router(dir.path()), "GET", "/old").await;
  assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
  assert_eq!(resp.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn temporary_redirect_is_302() {
  let dir = app_dir(FILES);
  let resp = send(router(dir.path()), "GET", "/login").await;
  assert_eq!(resp.status(), StatusCode::FOUND);
  assert_eq!(resp.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn page_renders_initial_data_as_json_by_default() {
  let dir = app_dir(FILES);
  let resp = send(router(dir.path()), "GET", "/").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    json_body(resp).await,
    json!({
      "pathname": "/",
      "params": {},
      "props": {"greeting": "hi"},
      "metadata": null,
      "className": "",
    })
  );
}

#[tokio::test]
async fn custom_renderer_receives_page_data() {
  let dir = app_dir(FILES);
  let app = TrellisServer::new(dir.path()).loader(loader()).start().unwrap();
  let router = app.into_axum_router_with(|data: trellis_server::InitialData| {
    axum::response::Html(format!("<h1>{}</h1>", data.props["greeting"].as_str().unwrap_or("")))
      .into_response()
  });
  let resp = send(router, "GET", "/").await;
  let bytes = resp.into_body().collect().await.unwrap().to_bytes();
  assert_eq!(&bytes[..], b"<h1>hi</h1>");
}

#[tokio::test]
async fn unmatched_path_is_404() {
  let dir = app_dir(FILES);
  let resp = send(router(dir.path()), "GET", "/missing/page").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn missing_method_is_405_with_allow() {
  let dir = app_dir(FILES);
  let resp = send(router(dir.path()), "DELETE", "/api/posts/1").await;
  assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
  assert_eq!(resp.headers()[header::ALLOW], "GET");
  assert_eq!(json_body(resp).await["error"]["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn handler_error_is_500_envelope() {
  let dir = app_dir(FILES);
  let resp = send(router(dir.path()), "GET", "/api/broken").await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body = json_body(resp).await;
  assert_eq!(body["ok"], false);
  assert_eq!(body["error"]["code"], "HANDLER_EXECUTION_ERROR");
  assert!(body["error"]["message"].as_str().unwrap().contains("disk full"));
}
