//! Browser-facing server for the virtual try-on app.
//!
//! Serves a single page with one file picker per image slot and a trigger,
//! and a `POST /api/tryon` multipart endpoint that runs the pipeline and
//! answers with either a data-URL image or an error message.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use fitroom::{sniff_mime, Controller, GeminiClient, ImageAsset, ImageSlot, Phase};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Uploads are capped at 20 MiB total across the three slots.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

struct AppState {
    client: GeminiClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fitroom=info")),
        )
        .init();

    // Missing API credential is fatal at startup, not a runtime condition
    let client = GeminiClient::builder().build()?;
    let state = Arc::new(AppState { client });

    let app = Router::new()
        .route("/", get(index))
        .route("/api/tryon", post(try_on))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    let addr = std::env::var("FITROOM_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "fitroom listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct TryOnResponse {
    image: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

async fn try_on(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TryOnResponse>, ApiError> {
    let mut controller = Controller::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let slot = match field.name() {
            Some("person") => ImageSlot::Person,
            Some("top") => ImageSlot::Top,
            Some("bottom") => ImageSlot::Bottom,
            _ => continue,
        };

        let declared = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
        if bytes.is_empty() {
            // Unfilled optional picker submitted by the form
            continue;
        }

        // Fall back to magic bytes when the browser sent no usable type
        let mime = declared
            .filter(|m| !m.is_empty() && m != "application/octet-stream")
            .or_else(|| sniff_mime(&bytes).map(str::to_string))
            .unwrap_or_default();

        let ticket = controller.begin_read(slot);
        controller.finish_read(ticket, ImageAsset::from_bytes(&bytes, &mime));
        if let Some(message) = controller.error_message() {
            return Err(api_error(StatusCode::BAD_REQUEST, message));
        }
    }

    controller.submit(&state.client).await;

    match controller.phase() {
        Phase::Succeeded => Ok(Json(TryOnResponse {
            image: controller
                .result()
                .unwrap_or_default()
                .to_string(),
        })),
        Phase::Failed => Err(api_error(
            StatusCode::BAD_GATEWAY,
            controller.error_message().unwrap_or("try-on failed"),
        )),
        // Idle after submit means a validation failure
        _ => Err(api_error(
            StatusCode::BAD_REQUEST,
            controller
                .error_message()
                .unwrap_or("missing required images"),
        )),
    }
}

// Deliberately unstyled; the page is a thin shell over /api/tryon.
const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Fitroom - virtual try-on</title>
</head>
<body>
<h1>Virtual try-on</h1>
<form id="tryon-form">
  <p><label>Person photo <input type="file" name="person" accept="image/*"></label></p>
  <p><label>Top <input type="file" name="top" accept="image/*"></label></p>
  <p><label>Bottom <input type="file" name="bottom" accept="image/*"></label></p>
  <p><button id="trigger" type="submit" disabled>Try it on</button></p>
</form>
<p id="status" role="status"></p>
<img id="result" alt="" style="max-width: 512px">
<script>
const form = document.getElementById('tryon-form');
const trigger = document.getElementById('trigger');
const status = document.getElementById('status');
const result = document.getElementById('result');

function refreshTrigger() {
  const has = name => form.elements[name].files.length > 0;
  trigger.disabled = !has('person') || (!has('top') && !has('bottom'));
}
form.addEventListener('change', refreshTrigger);

form.addEventListener('submit', async (event) => {
  event.preventDefault();
  trigger.disabled = true;
  status.textContent = 'Creating your new look...';
  result.removeAttribute('src');
  try {
    const response = await fetch('/api/tryon', { method: 'POST', body: new FormData(form) });
    const body = await response.json();
    if (response.ok) {
      status.textContent = '';
      result.src = body.image;
    } else {
      status.textContent = body.error;
    }
  } catch (err) {
    status.textContent = 'An unexpected error occurred.';
  } finally {
    refreshTrigger();
  }
});
</script>
</body>
</html>
"#;
