//! Debug endpoints: `/__csp` and `/__ls`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CspEcho {
    pub header: String,
    pub value: String,
}

/// Echo the CSP header this process sends.
pub async fn csp_echo(State(state): State<AppState>) -> Json<CspEcho> {
    Json(CspEcho {
        header: state.security.csp_header().as_str().to_string(),
        value: state.security.csp().as_str().to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub dir: Option<String>,
}

/// A failed listing: 500 with `{err, dir}`.
#[derive(Debug, Error)]
#[error("{err}")]
pub struct ListingError {
    pub err: String,
    pub dir: PathBuf,
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        tracing::warn!(dir = %self.dir.display(), error = %self.err, "Directory listing failed");
        let body = Json(serde_json::json!({
            "err": self.err,
            "dir": self.dir.display().to_string(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// List entry names under `<dataset_dir>/<dir>`, sorted.
pub async fn list_dataset(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<String>>, ListingError> {
    let sub = query.dir.unwrap_or_default();
    let dir = state.dataset_dir.join(&sub);

    if !is_contained(&sub) {
        return Err(ListingError {
            err: "path escapes the dataset directory".to_string(),
            dir,
        });
    }

    read_names(&dir)
        .await
        .map(Json)
        .map_err(|e| ListingError {
            err: e.to_string(),
            dir,
        })
}

fn is_contained(sub: &str) -> bool {
    Path::new(sub)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

async fn read_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
