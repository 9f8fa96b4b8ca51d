//! The operator-facing web surface: one form page, one generate action,
//! download endpoints, and the housekeeping trigger.
//!
//! Every failure is mapped to a single human-readable banner; the process
//! stays usable for the next attempt regardless of what went wrong.

use axum::{
    Router,
    extract::{Form, Path as UrlPath, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::api::{self, GenerationError, HostedClient, OllamaClient};
use crate::error::AppError;
use crate::housekeeping::{self, MAX_EXPORT_AGE};
use crate::models::{
    Backend, ExportArtifactSet, GeneratedDocument, OutlineRequest, ProductFormat, Tone,
};
use crate::outputs::{self, bundle};
use crate::prompt;
use crate::utils::estimated_hosted_cost_usd;

/// Shared application state, created once at startup and passed to all
/// handlers. Holds configuration and the outbound HTTP client; all other
/// state is per-request.
pub struct AppState {
    pub export_dir: PathBuf,
    pub http: reqwest::Client,
    pub ollama_url: String,
    pub ollama_model: String,
    pub hosted_url: String,
    pub hosted_model: String,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .route("/files/:name", get(download_file))
        .route("/bundle", get(download_bundle))
        .route("/clean", post(clean))
        .with_state(state)
}

/// The raw form submission, exactly as posted by the browser.
#[derive(Debug, Deserialize)]
pub struct OutlineForm {
    #[serde(default)]
    pub idea: String,
    #[serde(default)]
    pub audience: String,
    pub format: ProductFormat,
    pub tone: Tone,
    pub backend: Backend,
    #[serde(default)]
    pub api_key: String,
}

impl OutlineForm {
    /// Validate the submission into an [`OutlineRequest`].
    ///
    /// Rejection happens here, before any prompt is built or any network
    /// call is made.
    pub fn into_request(self) -> Result<OutlineRequest, AppError> {
        let idea = self.idea.trim().to_string();
        if idea.is_empty() {
            return Err(AppError::Validation(
                "Please enter a product idea.".to_string(),
            ));
        }
        let api_key = match self.backend {
            Backend::Hosted => {
                let key = self.api_key.trim().to_string();
                if key.is_empty() {
                    return Err(AppError::Validation(
                        "An API key is required for the hosted backend.".to_string(),
                    ));
                }
                Some(key)
            }
            Backend::Local => None,
        };
        Ok(OutlineRequest {
            idea,
            audience: self.audience.trim().to_string(),
            format: self.format,
            tone: self.tone,
            backend: self.backend,
            api_key,
        })
    }
}

struct GenerationOutcome {
    request: OutlineRequest,
    document: GeneratedDocument,
    artifacts: ExportArtifactSet,
}

/// Run the full pipeline for one submission: validate, build the prompt,
/// generate with retries, export the artifact set.
#[instrument(level = "info", skip_all)]
async fn run_generation(state: &AppState, form: OutlineForm) -> Result<GenerationOutcome, AppError> {
    let request = form.into_request()?;
    let prompt_text = prompt::build_prompt(&request);
    info!(backend = ?request.backend, "Starting generation");

    let raw_text = match request.backend {
        Backend::Local => {
            let client = OllamaClient::new(
                state.http.clone(),
                state.ollama_url.clone(),
                state.ollama_model.clone(),
            );
            api::generate_with_backoff(client, &prompt_text).await?
        }
        Backend::Hosted => {
            let key = request.api_key.clone().unwrap_or_default();
            let client = HostedClient::new(
                state.http.clone(),
                state.hosted_url.clone(),
                state.hosted_model.clone(),
                key,
            );
            api::generate_with_backoff(client, &prompt_text).await?
        }
    };

    let document = GeneratedDocument::new(raw_text, &request.idea);
    let artifacts = outputs::write_set(&document, &state.export_dir).await?;
    info!(slug = %document.slug, "Generation exported");
    Ok(GenerationOutcome {
        request,
        document,
        artifacts,
    })
}

/// Map an error kind to the single message shown to the operator.
fn operator_message(err: &AppError) -> String {
    match err {
        AppError::Validation(msg) => msg.clone(),
        AppError::Generation(GenerationError::MalformedResponse(_)) => {
            "The backend answered but its response could not be read. Try again.".to_string()
        }
        AppError::Generation(GenerationError::Status(status)) if status.is_client_error() => {
            "The backend rejected the request. Check the model name and API key.".to_string()
        }
        AppError::Generation(_) => {
            "Could not reach the generation backend. Check that it is running and try again."
                .to_string()
        }
        AppError::Export(_) | AppError::Io(_) => {
            "The outline was generated but could not be written to disk.".to_string()
        }
    }
}

async fn index() -> Html<String> {
    Html(render_form_page(None))
}

async fn generate(State(state): State<Arc<AppState>>, Form(form): Form<OutlineForm>) -> Response {
    match run_generation(&state, form).await {
        Ok(outcome) => Html(render_result_page(&outcome)).into_response(),
        Err(e) => {
            error!(error = %e, "Generation action failed");
            Html(render_form_page(Some(&operator_message(&e)))).into_response()
        }
    }
}

async fn clean(State(state): State<Arc<AppState>>) -> Html<String> {
    let notice = match housekeeping::purge_older_than(&state.export_dir, MAX_EXPORT_AGE) {
        Ok(outcome) if outcome.failed == 0 => {
            format!("Old files removed ({} deleted).", outcome.deleted)
        }
        Ok(outcome) => format!(
            "Old files removed ({} deleted, {} skipped).",
            outcome.deleted, outcome.failed
        ),
        Err(e) => {
            error!(error = %e, "Housekeeping failed");
            "Could not scan the export directory.".to_string()
        }
    };
    Html(render_form_page(Some(&notice)))
}

/// Serve one export file as an attachment.
async fn download_file(
    State(state): State<Arc<AppState>>,
    UrlPath(name): UrlPath<String>,
) -> Result<Response, (StatusCode, String)> {
    if !is_safe_filename(&name) {
        return Err((StatusCode::BAD_REQUEST, "invalid file name".to_string()));
    }
    let path = state.export_dir.join(&name);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, "file not found".to_string()))?;
    Ok(attachment(&name, content_type_for(&name), bytes))
}

#[derive(Debug, Deserialize)]
struct BundleQuery {
    slug: String,
    ts: String,
}

/// Build the zip bundle for one generation and serve it from memory.
async fn download_bundle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BundleQuery>,
) -> Result<Response, (StatusCode, String)> {
    if !is_valid_slug(&query.slug) || !is_valid_timestamp(&query.ts) {
        return Err((StatusCode::BAD_REQUEST, "invalid bundle key".to_string()));
    }
    let set = ExportArtifactSet::from_parts(&state.export_dir, &query.slug, &query.ts);
    let bytes = bundle::build_bundle(&set).map_err(|e| {
        error!(error = %e, "Bundle build failed");
        (StatusCode::NOT_FOUND, "bundle files not found".to_string())
    })?;
    Ok(attachment(&set.bundle_name(), "application/zip", bytes))
}

fn attachment(name: &str, content_type: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// A download name may only be a direct child of the export directory.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 40
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_valid_timestamp(ts: &str) -> bool {
    !ts.is_empty() && ts.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_')
}

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("md") => "text/markdown; charset=utf-8",
        _ => "text/plain; charset=utf-8",
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:.8rem}input[type=text],input[type=password],select{width:100%;padding:.4rem}\
textarea{width:100%;font-family:monospace}.notice{border:1px solid #888;background:#f6f6ef;padding:.6rem;margin:1rem 0}\
button{margin-top:1rem;padding:.5rem 1.2rem}.downloads a{margin-right:1rem}";

fn render_form_page(notice: Option<&str>) -> String {
    let mut page = String::new();
    page.push_str("<!doctype html><html><head><meta charset=\"utf-8\">");
    page.push_str("<title>Seedling</title><style>");
    page.push_str(PAGE_STYLE);
    page.push_str("</style></head><body><h1>🌱 Seedling</h1>");
    page.push_str(
        "<p>Tell us what you are dreaming up. Describe your product idea, who it is for, \
         and how it should feel, and Seedling will draft a title, an outline, and the first \
         marketing angles, ready to download and build on.</p>",
    );
    if let Some(notice) = notice {
        page.push_str("<div class=\"notice\">");
        page.push_str(&escape_html(notice));
        page.push_str("</div>");
    }
    page.push_str("<form method=\"post\" action=\"/generate\">");
    page.push_str(
        "<label>Product idea<input type=\"text\" name=\"idea\" placeholder=\"AI Cookbook\"></label>",
    );
    page.push_str("<label>Who is it for?<input type=\"text\" name=\"audience\"></label>");

    page.push_str("<label>Format<select name=\"format\">");
    for format in ProductFormat::ALL {
        let label = escape_html(format.label());
        page.push_str(&format!("<option value=\"{label}\">{label}</option>"));
    }
    page.push_str("</select></label>");

    page.push_str("<label>Tone<select name=\"tone\">");
    for tone in Tone::ALL {
        let label = escape_html(tone.label());
        page.push_str(&format!("<option value=\"{label}\">{label}</option>"));
    }
    page.push_str("</select></label>");

    page.push_str("<label>Backend<select name=\"backend\">");
    page.push_str(&format!(
        "<option value=\"local\">{}</option><option value=\"hosted\">{}</option>",
        escape_html(Backend::Local.label()),
        escape_html(Backend::Hosted.label()),
    ));
    page.push_str("</select></label>");

    page.push_str(
        "<label>API key (hosted backend only)\
         <input type=\"password\" name=\"api_key\" autocomplete=\"off\"></label>",
    );
    page.push_str("<button type=\"submit\">🌱 Generate Outline</button></form>");

    page.push_str(
        "<form method=\"post\" action=\"/clean\"><button type=\"submit\">🗑️ Clean Old Files</button></form>",
    );
    page.push_str("</body></html>");
    page
}

fn render_result_page(outcome: &GenerationOutcome) -> String {
    let doc = &outcome.document;
    let set = &outcome.artifacts;
    let mut page = String::new();
    page.push_str("<!doctype html><html><head><meta charset=\"utf-8\">");
    page.push_str("<title>Seedling — outline ready</title><style>");
    page.push_str(PAGE_STYLE);
    page.push_str("</style></head><body><h1>🌱 Here is what your idea wants to become</h1>");
    page.push_str(
        "<p>Every heading below can grow into a chapter, a course module, or an email series. \
         Download the outline in the format that fits your workflow.</p>",
    );
    if outcome.request.backend == Backend::Hosted {
        page.push_str(&format!(
            "<p class=\"notice\">Estimated cost: ~${:.3} USD</p>",
            estimated_hosted_cost_usd(&outcome.request.idea)
        ));
    }
    page.push_str(&format!(
        "<textarea readonly rows=\"20\">{}</textarea>",
        escape_html(&doc.raw_text)
    ));
    page.push_str("<h2>📦 Downloads</h2><p class=\"downloads\">");
    for (label, name) in [
        ("📄 .txt", &set.txt_name),
        ("📄 .pdf", &set.pdf_name),
        ("📄 .md", &set.md_name),
    ] {
        page.push_str(&format!(
            "<a href=\"/files/{}\" download>{label}</a>",
            escape_html(name)
        ));
    }
    page.push_str(&format!(
        "<a href=\"/bundle?slug={}&amp;ts={}\" download>📦 Bundle.zip</a>",
        escape_html(&set.slug),
        escape_html(&set.timestamp)
    ));
    page.push_str("</p><p><a href=\"/\">← Start another idea</a></p>");
    page.push_str("</body></html>");
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(idea: &str, backend: Backend, api_key: &str) -> OutlineForm {
        OutlineForm {
            idea: idea.to_string(),
            audience: "home cooks".to_string(),
            format: ProductFormat::Ebook,
            tone: Tone::Conversational,
            backend,
            api_key: api_key.to_string(),
        }
    }

    #[test]
    fn test_empty_idea_is_rejected_before_any_network_call() {
        let err = form("   ", Backend::Local, "").into_request().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_hosted_backend_requires_api_key() {
        let err = form("AI Cookbook", Backend::Hosted, " ")
            .into_request()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let request = form("AI Cookbook", Backend::Hosted, "sk-test")
            .into_request()
            .unwrap();
        assert_eq!(request.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_local_backend_ignores_api_key_field() {
        let request = form("AI Cookbook", Backend::Local, "leftover")
            .into_request()
            .unwrap();
        assert_eq!(request.api_key, None);
    }

    #[test]
    fn test_form_decodes_from_urlencoded_body() {
        let body = "idea=AI+Cookbook&audience=home+cooks&format=eBook&tone=Conversational&backend=local&api_key=";
        let form: OutlineForm = serde_urlencoded::from_str(body).unwrap();
        assert_eq!(form.idea, "AI Cookbook");
        assert_eq!(form.format, ProductFormat::Ebook);
        assert_eq!(form.tone, Tone::Conversational);
        assert_eq!(form.backend, Backend::Local);
    }

    #[test]
    fn test_operator_messages_by_error_kind() {
        let validation = AppError::Validation("Please enter a product idea.".to_string());
        assert_eq!(operator_message(&validation), "Please enter a product idea.");

        let auth = AppError::Generation(GenerationError::Status(StatusCode::UNAUTHORIZED));
        assert!(operator_message(&auth).contains("rejected"));

        let transient =
            AppError::Generation(GenerationError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(operator_message(&transient).contains("Could not reach"));

        let malformed =
            AppError::Generation(GenerationError::MalformedResponse("eof".to_string()));
        assert!(operator_message(&malformed).contains("could not be read"));
    }

    #[test]
    fn test_safe_filename_rejects_traversal() {
        assert!(is_safe_filename("seedling_idea_outline_2026-08-23_10-00-00.txt"));
        assert!(!is_safe_filename("../secrets"));
        assert!(!is_safe_filename("a/b.txt"));
        assert!(!is_safe_filename("a\\b.txt"));
        assert!(!is_safe_filename(""));
    }

    #[test]
    fn test_bundle_key_validation() {
        assert!(is_valid_slug("AI_Cookbook-1"));
        assert!(!is_valid_slug("bad/slug"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug(&"a".repeat(41)));
        assert!(is_valid_timestamp("2026-08-23_10-00-00"));
        assert!(!is_valid_timestamp("2026-08-23T10:00:00"));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a.pdf"), "application/pdf");
        assert_eq!(content_type_for("a.zip"), "application/zip");
        assert_eq!(content_type_for("a.md"), "text/markdown; charset=utf-8");
        assert_eq!(content_type_for("a.txt"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_form_page_lists_every_choice() {
        let page = render_form_page(None);
        for format in ProductFormat::ALL {
            assert!(page.contains(format.label()), "missing {}", format.label());
        }
        for tone in Tone::ALL {
            assert!(page.contains(tone.label()));
        }
        assert!(page.contains("Clean Old Files"));
    }

    #[test]
    fn test_result_page_escapes_outline_and_links_all_downloads() {
        let document = GeneratedDocument {
            raw_text: "<script>alert(1)</script>".to_string(),
            slug: "idea".to_string(),
            timestamp: "2026-08-23_10-00-00".to_string(),
        };
        let artifacts = crate::models::artifact_set_for(&document, std::path::Path::new("outputs"));
        let outcome = GenerationOutcome {
            request: form("idea", Backend::Local, "").into_request().unwrap(),
            document,
            artifacts,
        };
        let page = render_result_page(&outcome);
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("/files/seedling_idea_outline_2026-08-23_10-00-00.txt"));
        assert!(page.contains("/files/seedling_idea_outline_2026-08-23_10-00-00.pdf"));
        assert!(page.contains("/files/seedling_idea_outline_2026-08-23_10-00-00.md"));
        assert!(page.contains("/bundle?slug=idea&amp;ts=2026-08-23_10-00-00"));
    }
}
