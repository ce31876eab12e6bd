//! Route handlers for the illustrative `/api/v1/users` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use coresvc_core::ports::tx_manager::TxManagerExt;
use coresvc_core::{AuthContext, Id};

use crate::dto::{CreateUserRequest, DataEnvelope, PaginationMeta, PaginationQuery, UserResponse};
use crate::error::ProblemResponse;
use crate::extractors::StrictJson;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

fn request_id(extensions: &axum::http::Extensions) -> String {
    extensions
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone())
}

pub async fn create(
    State(state): State<AppState>,
    auth: axum::Extension<AuthContext>,
    extensions: axum::http::Extensions,
    StrictJson(body): StrictJson<CreateUserRequest>,
) -> Response {
    let request_id_value = request_id(&extensions);
    match state
        .create_user
        .execute(&auth, body.into(), request_id_value.clone())
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(DataEnvelope::single(UserResponse::from(user)))).into_response(),
        Err(error) => ProblemResponse {
            error,
            request_id: request_id_value,
            problem_base_url: state.config.problem_base_url.clone(),
        }
        .into_response(),
    }
}

pub async fn get(
    State(state): State<AppState>,
    auth: axum::Extension<AuthContext>,
    extensions: axum::http::Extensions,
    Path(id): Path<String>,
) -> Response {
    let request_id_value = request_id(&extensions);
    let Ok(id) = id.parse::<Id>() else {
        return ProblemResponse {
            error: coresvc_core::AppError::BadRequest("invalid user id".to_string()),
            request_id: request_id_value,
            problem_base_url: state.config.problem_base_url.clone(),
        }
        .into_response();
    };

    let get_user = &state.get_user;
    let result = state
        .tx
        .with_tx(|q| {
            let auth = auth.0.clone();
            async move { get_user.execute(&auth, q, id).await }
        })
        .await;

    match result {
        Ok(user) => Json(DataEnvelope::single(UserResponse::from(user))).into_response(),
        Err(error) => ProblemResponse {
            error,
            request_id: request_id_value,
            problem_base_url: state.config.problem_base_url.clone(),
        }
        .into_response(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: axum::Extension<AuthContext>,
    extensions: axum::http::Extensions,
    Query(query): Query<PaginationQuery>,
) -> Response {
    let request_id_value = request_id(&extensions);
    let params = query.into_list_params();

    let list_users = &state.list_users;
    let result = state
        .tx
        .with_tx(|q| {
            let auth = auth.0.clone();
            async move { list_users.execute(&auth, q, params).await }
        })
        .await;

    match result {
        Ok((users, total)) => {
            let data = users.into_iter().map(UserResponse::from).collect::<Vec<_>>();
            let pagination = PaginationMeta::new(params, total);
            Json(DataEnvelope::list(data, pagination)).into_response()
        }
        Err(error) => ProblemResponse {
            error,
            request_id: request_id_value,
            problem_base_url: state.config.problem_base_url.clone(),
        }
        .into_response(),
    }
}
