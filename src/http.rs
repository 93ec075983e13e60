use crate::{
    config::Config,
    engine::Engine,
    error::{Error, Field},
    markup::Materializer,
    naming,
    render::{Rendered, Renderer},
    request::{Flow, Payload, RenderRequest},
    response::RenderResult,
    STATIC_MOUNT,
};
use axum::{
    body::Bytes,
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::Html,
    routing::{get, get_service, post},
    Json, Router,
};
use std::{io, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>wkpdf</title>
</head>
<body>
<h1>wkpdf</h1>
<p>POST <code>/url-to-pdf</code> with <code>{"url": "...", "title": "..."}</code></p>
<p>POST <code>/html-to-pdf</code> with <code>{"html": "...", "title": "..."}</code></p>
<p>Generated files are served from <code>/static/</code>.</p>
</body>
</html>
"#;

/// Everything a request handler needs, shared across requests.
#[derive(Clone)]
pub struct AppState {
    materializer: Materializer,
    renderer: Renderer,
}

impl AppState {
    pub fn new(config: &Config, engine: Arc<dyn Engine>) -> Self {
        Self {
            materializer: Materializer::new(&config.output_dir, config.public_url.clone()),
            renderer: Renderer::new(engine, &config.output_dir, config.render_timeout),
        }
    }

    /// Resolves the request to an address, materializing inline markup when
    /// no address was given, then renders it.
    pub async fn render(&self, request: RenderRequest) -> Result<Rendered, Error> {
        let stem = match request.output_stem {
            Some(stem) => stem,
            None => naming::fresh_stem(&request.title),
        };

        let address = match (request.address, request.markup) {
            (Some(address), _) => address,
            (None, Some(markup)) => self.materializer.materialize(&markup, &stem).await?,
            (None, None) => return Err(Error::MissingField(Field::Url)),
        };

        self.renderer.render(&address, &stem).await
    }
}

pub fn router(config: &Config, state: AppState) -> Router {
    let static_files = get_service(ServeDir::new(&config.output_dir)).handle_error(
        |err: io::Error| async move {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("unhandled internal error: {err}"),
            )
        },
    );

    Router::new()
        .route("/", get(index))
        .route("/url-to-pdf", post(url_to_pdf))
        .route("/html-to-pdf", post(html_to_pdf))
        .nest(&format!("/{STATIC_MOUNT}"), static_files)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn url_to_pdf(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<RenderResult>), Error> {
    handle(&state, Flow::Address, &headers, &body).await
}

async fn html_to_pdf(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<RenderResult>), Error> {
    handle(&state, Flow::Markup, &headers, &body).await
}

async fn handle(
    state: &AppState,
    flow: Flow,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(StatusCode, Json<RenderResult>), Error> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| Error::Parse("content type is not valid ASCII".into()))
        })
        .transpose()?;

    let request = Payload::decode(content_type, body)?.validate(flow)?;
    let stem = naming::fresh_stem(&request.title);
    info!(
        flow = ?flow,
        title = %request.title,
        stem = %stem,
        "Render request accepted"
    );

    let rendered = state.render(request.with_stem(stem)).await?;
    Ok((
        StatusCode::CREATED,
        Json(RenderResult::success(rendered.relative_path)),
    ))
}
