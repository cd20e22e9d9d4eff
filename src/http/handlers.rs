use axum::{
    extract::{multipart::{Multipart, MultipartRejection}, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::accounts::MAX_PASSWORD_LEN;
use crate::app::engagement::EngagementService;
use crate::app::media::{ImageUpload, MediaService};
use crate::app::reports::{CreateReport, ReportService};
use crate::config::risk_catalog::{RiskType, RISK_TYPES};
use crate::domain::account::Identity;
use crate::domain::engagement::Comment;
use crate::domain::report::{Report, ReportCard, ReportFilter, ResolvedFilter};
use crate::http::session::{cleared_session_cookie, session_cookie};
use crate::http::{resolve, AppError, AppForm, AppPath, AppQuery, Viewer};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "store ping failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

fn report_service(state: &AppState) -> ReportService {
    let media = MediaService::new(state.images.clone(), &state.upload);
    ReportService::new(state.store.clone(), media)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub username: Option<String>,
    pub is_admin: bool,
}

pub async fn session_status(viewer: Option<Viewer>) -> Json<SessionResponse> {
    match viewer {
        Some(Viewer(identity)) => Json(SessionResponse {
            authenticated: true,
            is_admin: identity.is_admin(),
            username: Some(identity.username),
        }),
        None => Json(SessionResponse {
            authenticated: false,
            username: None,
            is_admin: false,
        }),
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
}

pub async fn login(
    State(state): State<AppState>,
    AppForm(form): AppForm<LoginForm>,
) -> Result<Response, AppError> {
    let session = state.auth.login(&form.username).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to login");
        AppError::internal("failed to login")
    })?;

    let session = session.ok_or_else(|| AppError::bad_request("username must be 1-50 characters"))?;
    tracing::info!(username = %session.identity.username, "user logged in");

    let cookie = session_cookie(&session, state.auth.session_ttl_hours());
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

#[derive(Deserialize)]
pub struct AdminLoginForm {
    pub admin_user: String,
    pub admin_pass: String,
}

pub async fn admin_login(
    State(state): State<AppState>,
    AppForm(form): AppForm<AdminLoginForm>,
) -> Result<Response, AppError> {
    if form.admin_user.trim().is_empty() || form.admin_pass.is_empty() {
        return Err(AppError::bad_request("admin_user and admin_pass are required"));
    }
    if form.admin_pass.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }

    let session = state
        .auth
        .admin_login(&form.admin_user, &form.admin_pass)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to verify admin login");
            AppError::internal("failed to login")
        })?;

    let session = match session {
        Some(session) => session,
        None => {
            tracing::warn!(username = %form.admin_user.trim(), "rejected admin login");
            return Err(AppError::unauthorized("invalid credentials"));
        }
    };
    tracing::info!(username = %session.identity.username, "admin logged in");

    let cookie = session_cookie(&session, state.auth.session_ttl_hours());
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

pub async fn logout() -> Response {
    ([(header::SET_COOKIE, cleared_session_cookie())], Redirect::to("/login")).into_response()
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ListQuery {
    pub risk_type: Option<String>,
    pub solucionado: Option<String>,
}

#[derive(Serialize)]
pub struct ListFilters {
    pub risk_type: Option<String>,
    pub solucionado: ResolvedFilter,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub items: Vec<ReportCard>,
    pub filters: ListFilters,
    pub viewer: Identity,
}

pub async fn list_reports(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let filter = ReportFilter::from_query(query.risk_type.as_deref(), query.solucionado.as_deref())
        .ok_or_else(|| AppError::bad_request("solucionado must be one of: no, si, todos"))?;

    let items = report_service(&state)
        .list_reports(&viewer, &filter)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list reports");
            AppError::internal("failed to list reports")
        })?;

    Ok(Json(ListResponse {
        items,
        filters: ListFilters {
            risk_type: filter.risk_type,
            solucionado: filter.resolved,
        },
        viewer,
    }))
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub risk_types: &'static [RiskType],
    pub max_upload_bytes: usize,
}

pub async fn new_report_form(
    _viewer: Viewer,
    State(state): State<AppState>,
) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        risk_types: &RISK_TYPES,
        max_upload_bytes: state.upload.max_bytes,
    })
}

pub async fn create_report(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Report>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::bad_request(format!("invalid multipart body: {}", rejection.body_text()))
    })?;
    let mut risk_type = None;
    let mut description = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "risk_type" => risk_type = Some(field.text().await.map_err(multipart_error)?),
            "descripcion" | "description" => {
                description = Some(field.text().await.map_err(multipart_error)?)
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                // browsers send an empty part when no file was picked
                if !file_name.is_empty() || !data.is_empty() {
                    image = Some(ImageUpload { file_name, data });
                }
            }
            _ => {}
        }
    }

    let risk_type = risk_type.ok_or_else(|| AppError::bad_request("risk_type is required"))?;
    let description =
        description.ok_or_else(|| AppError::bad_request("descripcion is required"))?;

    let outcome = report_service(&state)
        .create_report(
            &viewer,
            CreateReport {
                risk_type,
                description,
                image,
            },
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %viewer.username, "failed to create report");
            AppError::internal("failed to create report")
        })?;

    let report = resolve(outcome, "report not found")?;
    tracing::info!(
        report_id = report.id,
        username = %report.username,
        score = report.score,
        "report created"
    );
    Ok(Json(report))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::payload_too_large("image exceeds the upload limit");
    }
    AppError::bad_request(format!("invalid multipart body: {}", err.body_text()))
}

pub async fn get_report(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
) -> Result<Json<ReportCard>, AppError> {
    let outcome = report_service(&state)
        .get_report(&viewer, id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = id, "failed to fetch report");
            AppError::internal("failed to fetch report")
        })?;

    Ok(Json(resolve(outcome, "report not found")?))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

pub async fn delete_report(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, AppError> {
    let outcome = report_service(&state)
        .delete_report(&viewer, id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = id, "failed to delete report");
            AppError::internal("failed to delete report")
        })?;

    if let Err(err) = resolve(outcome, "report not found") {
        if err.status() == StatusCode::FORBIDDEN {
            tracing::warn!(report_id = id, username = %viewer.username, "report delete denied");
        }
        return Err(err);
    }
    tracing::info!(report_id = id, username = %viewer.username, "report deleted");
    Ok(Json(DeletedResponse { deleted: true }))
}

// ---------------------------------------------------------------------------
// Likes and comments
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LikeResponse {
    pub success: bool,
    pub likes: i64,
    pub liked: bool,
}

async fn toggle_like(state: &AppState, viewer: &Identity, id: i64) -> Result<LikeResponse, AppError> {
    let outcome = EngagementService::new(state.store.clone())
        .toggle_like(viewer, id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = id, username = %viewer.username, "failed to toggle like");
            AppError::internal("failed to toggle like")
        })?;

    resolve(
        outcome.map(|toggle| LikeResponse {
            success: true,
            likes: toggle.likes,
            liked: toggle.liked,
        }),
        "report not found",
    )
}

pub async fn like_report(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    toggle_like(&state, &viewer, id).await?;
    Ok(Redirect::to("/"))
}

pub async fn like_report_ajax(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
) -> Result<Json<LikeResponse>, AppError> {
    Ok(Json(toggle_like(&state, &viewer, id).await?))
}

#[derive(Deserialize)]
pub struct CommentForm {
    pub comment_text: String,
}

async fn add_comment(
    state: &AppState,
    viewer: &Identity,
    id: i64,
    text: &str,
) -> Result<Comment, AppError> {
    let outcome = EngagementService::new(state.store.clone())
        .add_comment(viewer, id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = id, username = %viewer.username, "failed to add comment");
            AppError::internal("failed to add comment")
        })?;

    resolve(outcome, "report not found")
}

pub async fn comment_report(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    AppForm(form): AppForm<CommentForm>,
) -> Result<Redirect, AppError> {
    add_comment(&state, &viewer, id, &form.comment_text).await?;
    Ok(Redirect::to("/"))
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: Comment,
}

pub async fn comment_report_ajax(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    AppForm(form): AppForm<CommentForm>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = add_comment(&state, &viewer, id, &form.comment_text).await?;
    Ok(Json(CommentResponse {
        success: true,
        comment,
    }))
}

pub async fn delete_comment(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, AppError> {
    let outcome = EngagementService::new(state.store.clone())
        .delete_comment(&viewer, id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = id, "failed to delete comment");
            AppError::internal("failed to delete comment")
        })?;

    resolve(outcome, "comment not found")?;
    Ok(Json(DeletedResponse { deleted: true }))
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ScoreForm {
    pub score: String,
}

pub async fn update_score(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    AppForm(form): AppForm<ScoreForm>,
) -> Result<Json<Report>, AppError> {
    let score: i32 = form
        .score
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request("score must be an integer"))?;

    let outcome = report_service(&state)
        .update_score(&viewer, id, score)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = id, "failed to update score");
            AppError::internal("failed to update score")
        })?;

    let report = resolve(outcome, "report not found")?;
    tracing::info!(report_id = id, score = report.score, admin = %viewer.username, "score updated");
    Ok(Json(report))
}

pub async fn mark_resolved(
    AppPath(id): AppPath<i64>,
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
) -> Result<Json<Report>, AppError> {
    let outcome = report_service(&state)
        .mark_resolved(&viewer, id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, report_id = id, "failed to mark report resolved");
            AppError::internal("failed to mark report resolved")
        })?;

    let report = resolve(outcome, "report not found")?;
    tracing::info!(report_id = id, admin = %viewer.username, "report resolved");
    Ok(Json(report))
}
