use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    auth::extract::{AuthUser, BearerToken},
    error::AppError,
    models::user::{CreateUser, LoginPayload, UpdateUser, UserResponse},
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(payload) = payload?;
    let user = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let auth = state.users.login(payload).await?;
    let bearer = format!("Bearer {}", auth.access_token);
    Ok(([(AUTHORIZATION, bearer)], Json(auth)))
}

pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    state.sessions.logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser { claims }: AuthUser,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Json(changes) = payload?;
    let user = state.users.update_user(&claims, changes).await?;
    Ok(Json(user))
}

pub async fn refresh(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, AppError> {
    let renewed = state.sessions.refresh_access_token(&token).await?;
    let bearer = format!("Bearer {}", renewed.access_token);
    Ok(([(AUTHORIZATION, bearer)], Json(renewed)))
}

pub async fn revoke(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    state.sessions.revoke_by_token(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
