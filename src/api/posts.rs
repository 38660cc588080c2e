use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    routing::get,
    Form, Json, Router,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>> {
    let posts = state.store.list_all().await?;
    Ok(Json(posts))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>> {
    let post = state.store.get(&id).await?;
    Ok(Json(post))
}

async fn create_post(State(state): State<AppState>, req: Request) -> Result<Json<Value>> {
    let body = read_post_body(&state, req).await?;
    let post = state.store.create(body.fields, body.image).await?;
    tracing::info!(id = post.id_num, link = %post.link, "post created");

    Ok(Json(json!({
        "success": true,
        "message": format!("Post {} has been created", post.id_num),
        "id": post.id_num,
    })))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<Json<Value>> {
    let body = read_post_body(&state, req).await?;
    let post = state.store.update(&id, body.fields, body.image).await?;
    tracing::info!(id = post.id_num, "post updated");

    Ok(Json(json!({
        "success": true,
        "message": format!("Post {} has been updated", post.id_num),
    })))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let deleted = state.store.delete(&id).await?;

    let page = state.config.render.pages_dir.join(&deleted.link);
    match tokio::fs::remove_file(&page).await {
        Ok(()) => tracing::info!(page = %page.display(), "removed generated page"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(page = %page.display(), "no generated page to remove");
        }
        Err(err) => {
            tracing::warn!(page = %page.display(), error = %err, "failed to remove generated page");
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Post {} has been deleted", deleted.id_num),
    })))
}

/// Text fields plus the stored path of an uploaded image, decoded from
/// either a multipart or a url-encoded request body.
struct PostBody {
    fields: Map<String, Value>,
    image: Option<String>,
}

async fn read_post_body(state: &AppState, req: Request) -> Result<PostBody> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|err| AppError::BadRequest(err.to_string()))?;

        let mut fields = Map::new();
        let mut image = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::BadRequest(err.to_string()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == "image" {
                let Some(file_name) = field
                    .file_name()
                    .map(str::to_owned)
                    .filter(|file_name| !file_name.is_empty())
                else {
                    continue;
                };
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                image = Some(save_upload(state, &file_name, &data).await?);
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                fields.insert(name, Value::String(text));
            }
        }
        Ok(PostBody { fields, image })
    } else {
        let Form(params) = Form::<HashMap<String, String>>::from_request(req, &())
            .await
            .map_err(|err| AppError::BadRequest(err.to_string()))?;
        let fields = params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Ok(PostBody {
            fields,
            image: None,
        })
    }
}

/// Store an uploaded image under the uploads directory, prefixing the file
/// name with a timestamp so repeated uploads never collide.
async fn save_upload(state: &AppState, original: &str, data: &[u8]) -> Result<String> {
    let base = std::path::Path::new(original)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");
    let file_name = format!("{}-{}", Utc::now().timestamp_millis(), base);

    let uploads_dir = &state.config.storage.uploads_dir;
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    tokio::fs::write(uploads_dir.join(&file_name), data)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(format!("/img/{}", file_name))
}
