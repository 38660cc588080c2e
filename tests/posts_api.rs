//! Endpoint contract tests for the posts API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use report_api::config::{Config, RenderConfig, ServerConfig, StorageConfig};
use report_api::store::PostStore;
use report_api::{app, AppState};

const SEED: &str = r##"[
  {
    "idNum": 5,
    "link": "report5.html",
    "img": "/img/activity-default.jpg",
    "contentMd": "# River cleanup",
    "title": "River cleanup",
    "date": "2025-05-01"
  }
]"##;

fn test_state(dir: &TempDir) -> AppState {
    let data_path = dir.path().join("posts.json");
    std::fs::write(&data_path, SEED).unwrap();

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        storage: StorageConfig {
            data_path: data_path.clone(),
            uploads_dir: dir.path().join("img"),
            default_image: "/img/activity-default.jpg".to_string(),
        },
        render: RenderConfig {
            template_path: dir.path().join("report.html"),
            pages_dir: dir.path().join("pages"),
        },
    };

    AppState {
        store: Arc::new(PostStore::new(data_path, &config.storage.default_image)),
        config,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn list_returns_the_full_collection() {
    let dir = TempDir::new().unwrap();
    let app = app(test_state(&dir));

    let response = app
        .oneshot(Request::get("/api/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let posts = body_json(response).await;
    assert_eq!(posts.as_array().unwrap().len(), 1);
    assert_eq!(posts[0]["idNum"], 5);
    assert_eq!(posts[0]["title"], "River cleanup");
}

#[tokio::test]
async fn get_one_found_and_not_found() {
    let dir = TempDir::new().unwrap();
    let app = app(test_state(&dir));

    let response = app
        .clone()
        .oneshot(Request::get("/api/posts/5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let post = body_json(response).await;
    assert_eq!(post["link"], "report5.html");

    let response = app
        .oneshot(Request::get("/api/posts/999").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error = body_json(response).await;
    assert_eq!(error["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn urlencoded_create_assigns_next_id_and_link() {
    let dir = TempDir::new().unwrap();
    let app = app(test_state(&dir));

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/posts")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("title=X"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(reply["success"], true);
    assert_eq!(reply["id"], 6);

    let response = app
        .oneshot(Request::get("/api/posts/6").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let post = body_json(response).await;
    assert_eq!(post["idNum"], 6);
    assert_eq!(post["link"], "report6.html");
    assert_eq!(post["img"], "/img/activity-default.jpg");
    assert_eq!(post["title"], "X");
}

#[tokio::test]
async fn multipart_create_stores_the_upload() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);
    let uploads_dir = state.config.storage.uploads_dir.clone();
    let app = app(state);

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"title\"\r\n\r\n\
         Picnic\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         fake-jpeg-bytes\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/posts")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/api/posts/6").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let post = body_json(response).await;
    assert_eq!(post["title"], "Picnic");

    let img = post["img"].as_str().unwrap();
    assert!(img.starts_with("/img/"));
    assert!(img.ends_with("-photo.jpg"));

    let stored = uploads_dir.join(img.trim_start_matches("/img/"));
    assert!(stored.exists());
}

#[tokio::test]
async fn update_merges_partial_fields() {
    let dir = TempDir::new().unwrap();
    let app = app(test_state(&dir));

    let response = app
        .clone()
        .oneshot(
            Request::put("/api/posts/5")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("title=Renamed"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/api/posts/5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let post = body_json(response).await;
    assert_eq!(post["title"], "Renamed");
    assert_eq!(post["date"], "2025-05-01");
    assert_eq!(post["contentMd"], "# River cleanup");
    assert_eq!(post["img"], "/img/activity-default.jpg");
    assert_eq!(post["link"], "report5.html");
}

#[tokio::test]
async fn update_missing_id_returns_404() {
    let dir = TempDir::new().unwrap();
    let app = app(test_state(&dir));

    let response = app
        .oneshot(
            Request::put("/api/posts/999")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("title=X"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error = body_json(response).await;
    assert_eq!(error["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn delete_removes_the_record_and_its_page_file() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);
    let pages_dir = state.config.render.pages_dir.clone();
    std::fs::create_dir_all(&pages_dir).unwrap();
    let page = pages_dir.join("report5.html");
    std::fs::write(&page, "<html></html>").unwrap();
    let app = app(state);

    let response = app
        .clone()
        .oneshot(Request::delete("/api/posts/5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(reply["success"], true);
    assert!(!page.exists());

    let response = app
        .oneshot(Request::get("/api/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let posts = body_json(response).await;
    assert_eq!(posts.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn delete_succeeds_when_the_page_file_is_absent() {
    let dir = TempDir::new().unwrap();
    let app = app(test_state(&dir));

    let response = app
        .clone()
        .oneshot(Request::delete("/api/posts/5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/api/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let posts = body_json(response).await;
    assert_eq!(posts.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn delete_missing_id_returns_404_and_keeps_the_document() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);
    let data_path = state.config.storage.data_path.clone();
    let before = std::fs::read(&data_path).unwrap();
    let app = app(state);

    let response = app
        .oneshot(
            Request::delete("/api/posts/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let after = std::fs::read(&data_path).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn storage_failures_map_to_500_with_a_generic_message() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);
    std::fs::write(&state.config.storage.data_path, "not json").unwrap();
    let app = app(state);

    let response = app
        .oneshot(Request::get("/api/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await;
    assert_eq!(error["error"]["code"], "STORAGE_ERROR");
    assert_eq!(error["error"]["message"], "Storage error occurred");
}

#[tokio::test]
async fn health_check_responds() {
    let dir = TempDir::new().unwrap();
    let app = app(test_state(&dir));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
