use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::downloader::{download_filename, to_csv};
use crate::error::Result;
use crate::filter::{FilterCriteria, FilterOutcome, apply_filters, simulate_delete};
use crate::loader::{allowed_file, load_table, secure_filename};
use crate::mailer::{EmailSender, MailError, Mailer};
use crate::render::{Page, Templates, table_html};
use crate::session::{Category, SessionStore, Upload};
use crate::summary::{datewise_summary, summary_subject};
use crate::table::Table;

pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub templates: Templates,
    pub mailer: Option<Arc<dyn EmailSender>>,
}

impl AppState {
    /// Build the shared state and make sure the upload folder exists
    pub fn new(config: Config, mailer: Option<Arc<dyn EmailSender>>) -> Result<Self> {
        match std::fs::create_dir_all(&config.upload_dir) {
            Ok(()) => tracing::info!(path = %config.upload_dir.display(), "upload folder ready"),
            Err(e) => tracing::error!(
                path = %config.upload_dir.display(),
                error = %e,
                "could not create upload folder"
            ),
        }

        Ok(AppState {
            config,
            sessions: SessionStore::new(),
            templates: Templates::new()?,
            mailer,
        })
    }

    /// Build the state with an SMTP mailer when `MAIL_*` settings are present
    ///
    /// A mail transport that cannot be built is logged and left out, so the
    /// rest of the app still starts.
    pub fn from_config(config: Config) -> Result<Self> {
        let mailer = match &config.mail {
            Some(mail) => match Mailer::new(mail) {
                Ok(mailer) => Some(Arc::new(mailer) as Arc<dyn EmailSender>),
                Err(e) => {
                    tracing::error!(error = %e, "could not set up SMTP transport");
                    None
                }
            },
            None => {
                tracing::warn!("email server is not configured; summaries cannot be sent");
                None
            }
        };
        Self::new(config, mailer)
    }
}

#[derive(Deserialize)]
struct EmailForm {
    #[serde(default)]
    recipient_email: String,
}

#[derive(Deserialize)]
struct FilterForm {
    #[serde(default)]
    action: String,
    #[serde(default)]
    filter_date: String,
    #[serde(default)]
    filter_restaurant: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_file))
        .route("/display", get(display_data))
        .route("/email", post(email_summary))
        .route("/filter_action", post(filter_action))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_config(config)?);
    let addr = state.config.bind_addr();

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let (jar, sid) = state.sessions.resolve(jar);
    let page = render_index(&state, &sid, Page::default())?;
    Ok((jar, page).into_response())
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, sid) = state.sessions.resolve(jar);
    let sessions = &state.sessions;

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return upload_failed(&state, &sid, jar, e),
        };
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(data) => upload = Some((original_name, data)),
            Err(e) => return upload_failed(&state, &sid, jar, e),
        }
    }

    let Some((original_name, data)) = upload else {
        sessions.flash(&sid, Category::Warning, "No file part in the request.");
        return redirect_home(jar);
    };
    if original_name.is_empty() {
        sessions.flash(&sid, Category::Warning, "No file selected for upload.");
        return redirect_home(jar);
    }

    let filename = secure_filename(&original_name);
    if !allowed_file(&original_name) || !allowed_file(&filename) {
        sessions.flash(
            &sid,
            Category::Warning,
            "Invalid file type. Only CSV files (.csv) are allowed.",
        );
        return redirect_home(jar);
    }

    let path = state.config.upload_dir.join(&filename);
    match tokio::fs::write(&path, &data).await {
        Ok(()) => {
            tracing::info!(file = %filename, path = %path.display(), bytes = data.len(), "file uploaded");
            sessions.set_upload(&sid, Upload { filename: filename.clone(), path });
            sessions.flash(
                &sid,
                Category::Success,
                format!("File \"{}\" uploaded successfully!", filename),
            );
        }
        Err(e) => {
            tracing::error!(file = %filename, error = %e, "error saving uploaded file");
            sessions.flash(&sid, Category::Danger, format!("Error saving file: {}", e));
            sessions.clear_upload(&sid);
        }
    }

    redirect_home(jar)
}

fn upload_failed(state: &AppState, sid: &str, jar: CookieJar, err: MultipartError) -> Response {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(limit = state.config.max_upload_bytes, "upload exceeds size limit");
        return (
            jar,
            (status, "Request Entity Too Large: the uploaded file exceeds 16 MB."),
        )
            .into_response();
    }

    tracing::error!(error = %err, "could not read upload");
    state
        .sessions
        .flash(sid, Category::Danger, format!("Error saving file: {}", err));
    state.sessions.clear_upload(sid);
    redirect_home(jar)
}

async fn display_data(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let (jar, sid) = state.sessions.resolve(jar);

    let Some(upload) = current_upload(
        &state,
        &sid,
        "No file has been uploaded yet, or the file was moved/deleted.",
    ) else {
        return Ok(redirect_home(jar));
    };
    tracing::info!(file = %upload.filename, "displaying data");

    let Some(table) = read_upload(&state, &sid, &upload) else {
        return Ok(redirect_home(jar));
    };

    let preview_rows = state.config.preview_rows;
    let page = if table.is_empty() {
        let message = format!(
            "File '{}' is empty or could not be read properly.",
            upload.filename
        );
        state.sessions.flash(&sid, Category::Info, message.clone());
        Page {
            message: Some(message),
            ..Page::default()
        }
    } else {
        Page {
            message: Some(format!(
                "Displaying first {} rows of {}.",
                table.len().min(preview_rows),
                upload.filename
            )),
            data_html: Some(table_html(&table.head(preview_rows))),
            ..Page::default()
        }
    };

    Ok((jar, render_index(&state, &sid, page)?).into_response())
}

async fn email_summary(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<EmailForm>,
) -> Response {
    let (jar, sid) = state.sessions.resolve(jar);
    let sessions = &state.sessions;

    let Some(upload) = current_upload(
        &state,
        &sid,
        "No file uploaded or file not found. Please upload again.",
    ) else {
        return redirect_home(jar);
    };

    let recipient = form.recipient_email.trim();
    if recipient.is_empty() {
        sessions.flash(&sid, Category::Warning, "Recipient email address is required.");
        return redirect_home(jar);
    }

    tracing::info!(file = %upload.filename, recipient, "email summary requested");
    let Some(table) = read_upload(&state, &sid, &upload) else {
        return redirect_home(jar);
    };

    let summary = datewise_summary(&table, &upload.filename);
    if let Some(warning) = summary.warning {
        sessions.flash(&sid, Category::Warning, warning);
    }

    let subject = summary_subject(&upload.filename);
    match send_email(&state, recipient, subject, summary.text).await {
        Ok(()) => sessions.flash(
            &sid,
            Category::Success,
            format!("Summary email sent successfully to {}!", recipient),
        ),
        Err(e) => {
            let category = match e {
                MailError::NotConfigured => Category::Warning,
                _ => Category::Danger,
            };
            tracing::error!(error = %e, "email not sent");
            sessions.flash(&sid, category, e.user_message());
        }
    }

    redirect_home(jar)
}

async fn send_email(
    state: &AppState,
    recipient: &str,
    subject: String,
    body: String,
) -> std::result::Result<(), MailError> {
    let Some(mailer) = state.mailer.clone() else {
        return Err(MailError::NotConfigured);
    };

    let recipient = recipient.to_string();
    // lettre's SmtpTransport blocks
    tokio::task::spawn_blocking(move || mailer.send(&recipient, &subject, &body))
        .await
        .map_err(|e| MailError::Worker(e.to_string()))?
}

async fn filter_action(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<FilterForm>,
) -> Result<Response> {
    let (jar, sid) = state.sessions.resolve(jar);
    let sessions = &state.sessions;

    let Some(upload) = current_upload(
        &state,
        &sid,
        "No file uploaded or file not found. Please upload again.",
    ) else {
        return Ok(redirect_home(jar));
    };

    tracing::info!(
        file = %upload.filename,
        action = %form.action,
        date = %form.filter_date,
        restaurant = %form.filter_restaurant,
        "filter action requested"
    );
    let Some(table) = read_upload(&state, &sid, &upload) else {
        return Ok(redirect_home(jar));
    };

    if table.is_empty() {
        sessions.flash(
            &sid,
            Category::Info,
            format!("The file '{}' is empty. No filtering possible.", upload.filename),
        );
        return Ok(redirect_home(jar));
    }

    let criteria = FilterCriteria::new(Some(form.filter_date), Some(form.filter_restaurant));
    let outcome = apply_filters(&table, &criteria);
    for warning in &outcome.warnings {
        sessions.flash(&sid, Category::Warning, warning.clone());
    }

    let description = outcome.describe();
    tracing::info!(
        file = %upload.filename,
        matched = outcome.matched_count(),
        "{}",
        description
    );

    match form.action.as_str() {
        "download" => {
            if outcome.matched.is_empty() {
                let message = format!(
                    "No data matched the filters. Nothing to download. {}",
                    description
                );
                sessions.flash(&sid, Category::Info, message.clone());
                let page = Page {
                    filter_message: Some(message),
                    ..Page::default()
                };
                return Ok((jar, render_index(&state, &sid, page)?).into_response());
            }

            let filtered = table.select(&outcome.matched);
            let bytes = match to_csv(&filtered) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(file = %upload.filename, error = %e, "error creating download file");
                    sessions.flash(
                        &sid,
                        Category::Danger,
                        format!("Error preparing download file: {}", e),
                    );
                    return Ok(redirect_home(jar));
                }
            };

            let download_name = download_filename(&upload.filename);
            sessions.flash(
                &sid,
                Category::Success,
                format!("Prepared download for {} rows. {}", filtered.len(), description),
            );
            tracing::info!(rows = filtered.len(), file = %download_name, "sending filtered download");

            Ok(csv_attachment(jar, &download_name, bytes))
        }
        "delete" => {
            let page = if outcome.matched.is_empty() {
                let message = format!(
                    "No rows matched the filters. Nothing was 'deleted'. {}",
                    description
                );
                tracing::info!(file = %upload.filename, "simulated deletion matched no rows");
                sessions.flash(&sid, Category::Info, message.clone());
                Page {
                    filter_message: Some(message),
                    ..Page::default()
                }
            } else {
                deletion_page(&state, &sid, &table, &outcome, &description)
            };
            Ok((jar, render_index(&state, &sid, page)?).into_response())
        }
        other => {
            tracing::warn!(action = other, "invalid action received");
            sessions.flash(&sid, Category::Danger, "Invalid action specified.");
            Ok(redirect_home(jar))
        }
    }
}

fn deletion_page(
    state: &AppState,
    sid: &str,
    table: &Table,
    outcome: &FilterOutcome,
    description: &str,
) -> Page {
    let preview_rows = state.config.preview_rows;
    let remaining = simulate_delete(table, outcome);
    let deleted = table.len() - remaining.len();

    tracing::info!(deleted, remaining = remaining.len(), "simulated deletion");
    state.sessions.flash(
        sid,
        Category::Info,
        format!(
            "'Deleted' {} rows matching filters (simulation). Displaying remaining {} rows. {}",
            deleted,
            remaining.len(),
            description
        ),
    );

    Page {
        filter_message: Some(format!(
            "Showing remaining {} rows (previewing first {}) after simulating deletion of {} rows. {}",
            remaining.len(),
            remaining.len().min(preview_rows),
            deleted,
            description
        )),
        filtered_data_html: Some(table_html(&remaining.head(preview_rows))),
        ..Page::default()
    }
}

fn csv_attachment(jar: CookieJar, filename: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        filename,
        urlencoding::encode(filename)
    );

    (
        jar,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// The session's upload, if its file is still on disk
///
/// A missing upload queues `missing_message` and forgets the stale entry.
fn current_upload(state: &AppState, sid: &str, missing_message: &str) -> Option<Upload> {
    match state.sessions.upload(sid) {
        Some(upload) if upload.path.exists() => Some(upload),
        _ => {
            tracing::warn!("no uploaded file in session or file does not exist");
            state.sessions.flash(sid, Category::Warning, missing_message);
            state.sessions.clear_upload(sid);
            None
        }
    }
}

fn read_upload(state: &AppState, sid: &str, upload: &Upload) -> Option<Table> {
    match load_table(&upload.path) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::error!(file = %upload.filename, error = %e, "error reading CSV");
            state.sessions.flash(
                sid,
                Category::Danger,
                format!("Error reading file '{}': {}", upload.filename, e),
            );
            state.sessions.clear_upload(sid);
            None
        }
    }
}

fn render_index(state: &AppState, sid: &str, mut page: Page) -> Result<Html<String>> {
    page.flashes = state.sessions.take_flashes(sid);
    page.filename = state.sessions.upload(sid).map(|u| u.filename);
    Ok(Html(state.templates.index(&page)?))
}

fn redirect_home(jar: CookieJar) -> Response {
    (jar, Redirect::to("/")).into_response()
}
