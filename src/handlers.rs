use crate::board::{Board, BoardState};
use crate::errors::AppError;
use crate::models::{
    BoardQuery, BoardResponse, BoardStats, DeleteForm, DeleteQuery, HitForm, Notice, PasscodeForm,
    RateForm,
};
use crate::state::{AppState, SharedBoard};
use crate::storage::LocalPrefs;
use crate::ui::{render_index, Modal, PageView};
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    response::{Html, Redirect},
    Form, Json,
};
use chrono::Utc;
use tracing::warn;

/// Looks up the browser's board; a board seen for the first time is loaded.
async fn open(state: &AppState, headers: &HeaderMap) -> (LocalPrefs, SharedBoard) {
    let prefs = LocalPrefs::from_headers(headers);
    let (board, created) = state.session(&prefs).await;
    if created {
        if let Err(err) = board.load().await {
            board.report(Err(err)).await;
        }
    }
    (prefs, board)
}

fn page(prefs: &LocalPrefs, state: &mut BoardState, view: Option<&str>) -> (HeaderMap, Html<String>) {
    let notices = state.take_notices();
    let stats = state.stats();
    let modal = match (view, state.editing()) {
        (Some("edit"), Some(hit)) => Modal::Edit(hit),
        (Some("edit" | "admin"), _) => Modal::Login,
        _ => Modal::Closed,
    };
    let html = render_index(&PageView {
        hits: state.hits(),
        gate: state.gate(),
        stats: &stats,
        notices: &notices,
        modal,
        now: Utc::now(),
    });
    (prefs.write(state.is_admin()), Html(html))
}

async fn redirect(prefs: &LocalPrefs, board: &Board, to: &str) -> (HeaderMap, Redirect) {
    let is_admin = board.state().await.is_admin();
    (prefs.write(is_admin), Redirect::to(to))
}

async fn respond(prefs: &LocalPrefs, board: &Board, notice: Option<Notice>) -> (HeaderMap, Json<BoardResponse>) {
    let state = board.state().await;
    let body = BoardResponse {
        notice,
        is_admin: state.is_admin(),
        hits: state.hits().to_vec(),
    };
    (prefs.write(state.is_admin()), Json(body))
}

/// A form body that failed to parse becomes a toast instead of a bare 422.
async fn form_or_toast<T>(board: &Board, form: Result<Form<T>, FormRejection>) -> Option<T> {
    match form {
        Ok(Form(form)) => Some(form),
        Err(rejection) => {
            warn!("unreadable form body: {rejection}");
            board.push_notice(Notice::error(rejection.body_text())).await;
            None
        }
    }
}

/// Page load: fetch the newest hits and render them.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> (HeaderMap, Html<String>) {
    let prefs = LocalPrefs::from_headers(&headers);
    let (board, _) = state.session(&prefs).await;
    if let Err(err) = board.load().await {
        board.report(Err(err)).await;
    }
    let mut board_state = board.state().await;
    page(&prefs, &mut board_state, None)
}

/// Re-render from the board's current state.
pub async fn show_board(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BoardQuery>,
) -> (HeaderMap, Html<String>) {
    let (prefs, board) = open(&state, &headers).await;
    let mut board_state = board.state().await;
    page(&prefs, &mut board_state, query.view.as_deref())
}

pub async fn create_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<HitForm>, FormRejection>,
) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    if let Some(form) = form_or_toast(&board, form).await {
        let outcome = board.create(form.fields()).await;
        board.report(outcome).await;
    }
    redirect(&prefs, &board, "/board").await
}

pub async fn rate_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    form: Result<Form<RateForm>, FormRejection>,
) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    if let Some(form) = form_or_toast(&board, form).await {
        let outcome = board.rate(id, form.rating).await;
        board.report(outcome).await;
    }
    redirect(&prefs, &board, "/board").await
}

pub async fn start_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    match board.start_edit(id).await {
        Ok(()) => redirect(&prefs, &board, "/board?view=edit").await,
        Err(err) => {
            board.report(Err(err)).await;
            redirect(&prefs, &board, "/board").await
        }
    }
}

pub async fn delete_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    if let Some(form) = form_or_toast(&board, form).await {
        let confirmed = form.confirmed.as_deref() == Some("yes");
        let outcome = board.delete(id, confirmed).await;
        board.report(outcome).await;
    }
    redirect(&prefs, &board, "/board").await
}

pub async fn admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<PasscodeForm>, FormRejection>,
) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    let Some(form) = form_or_toast(&board, form).await else {
        return redirect(&prefs, &board, "/board?view=admin").await;
    };
    let outcome = board.login(&form.passcode).await;
    let to = if outcome.is_ok() { "/board" } else { "/board?view=admin" };
    board.report(outcome).await;
    redirect(&prefs, &board, to).await
}

pub async fn admin_logout(State(state): State<AppState>, headers: HeaderMap) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    let notice = board.logout().await;
    board.push_notice(notice).await;
    redirect(&prefs, &board, "/board").await
}

pub async fn save_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<HitForm>, FormRejection>,
) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    let Some(form) = form_or_toast(&board, form).await else {
        return redirect(&prefs, &board, "/board?view=edit").await;
    };
    let outcome = board.update(form.fields()).await;
    let to = if outcome.is_ok() { "/board?view=admin" } else { "/board?view=edit" };
    board.report(outcome).await;
    redirect(&prefs, &board, to).await
}

pub async fn cancel_edit(State(state): State<AppState>, headers: HeaderMap) -> (HeaderMap, Redirect) {
    let (prefs, board) = open(&state, &headers).await;
    board.cancel_edit().await;
    redirect(&prefs, &board, "/board?view=admin").await
}

pub async fn api_list_hits(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (HeaderMap, Json<BoardResponse>) {
    let (prefs, board) = open(&state, &headers).await;
    respond(&prefs, &board, None).await
}

pub async fn api_reload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<BoardResponse>), AppError> {
    let prefs = LocalPrefs::from_headers(&headers);
    let (board, _) = state.session(&prefs).await;
    board.load().await?;
    Ok(respond(&prefs, &board, None).await)
}

pub async fn api_stats(State(state): State<AppState>, headers: HeaderMap) -> Json<BoardStats> {
    let (_, board) = open(&state, &headers).await;
    let stats = board.state().await.stats();
    Json(stats)
}

pub async fn api_create_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<HitForm>, JsonRejection>,
) -> Result<(HeaderMap, Json<BoardResponse>), AppError> {
    let Json(form) = payload?;
    let (prefs, board) = open(&state, &headers).await;
    let notice = board.create(form.fields()).await?;
    Ok(respond(&prefs, &board, Some(notice)).await)
}

pub async fn api_update_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    payload: Result<Json<HitForm>, JsonRejection>,
) -> Result<(HeaderMap, Json<BoardResponse>), AppError> {
    let Json(form) = payload?;
    let (prefs, board) = open(&state, &headers).await;
    board.start_edit(id).await?;
    let outcome = board.update(form.fields()).await;
    if outcome.is_err() {
        board.cancel_edit().await;
    }
    let notice = outcome?;
    Ok(respond(&prefs, &board, Some(notice)).await)
}

pub async fn api_delete_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Result<(HeaderMap, Json<BoardResponse>), AppError> {
    let (prefs, board) = open(&state, &headers).await;
    let notice = board.delete(id, query.confirm).await?;
    Ok(respond(&prefs, &board, Some(notice)).await)
}

pub async fn api_rate_hit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    payload: Result<Json<RateForm>, JsonRejection>,
) -> Result<(HeaderMap, Json<BoardResponse>), AppError> {
    let Json(form) = payload?;
    let (prefs, board) = open(&state, &headers).await;
    let notice = board.rate(id, form.rating).await?;
    Ok(respond(&prefs, &board, Some(notice)).await)
}

pub async fn api_admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PasscodeForm>, JsonRejection>,
) -> Result<(HeaderMap, Json<BoardResponse>), AppError> {
    let Json(form) = payload?;
    let (prefs, board) = open(&state, &headers).await;
    let notice = board.login(&form.passcode).await?;
    Ok(respond(&prefs, &board, Some(notice)).await)
}

pub async fn api_admin_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (HeaderMap, Json<BoardResponse>) {
    let (prefs, board) = open(&state, &headers).await;
    let notice = board.logout().await;
    respond(&prefs, &board, Some(notice)).await
}
