use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use std::str::FromStr;
use uuid::Uuid;

use super::types::ErrorResponse;
use crate::domain::{Actor, Role, UserId};

/// 認証ヘッダのエラー
#[derive(Debug)]
pub enum AuthError {
    MissingActorId,
    InvalidActorId,
    MissingActorRole,
    InvalidActorRole,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingActorId => "x-actor-id header is required",
            AuthError::InvalidActorId => "x-actor-id header must be a UUID",
            AuthError::MissingActorRole => "x-actor-role header is required",
            AuthError::InvalidActorRole => {
                "x-actor-role header must be reader, librarian or admin"
            }
        };

        let body = Json(ErrorResponse::new("UNAUTHORIZED", message));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// リクエストヘッダから操作主体を構成するエクストラクタ
///
/// 上流の認証ゲートウェイが検証済みの x-actor-id / x-actor-role
/// ヘッダを信頼する。本システム自身は資格情報を検証しない。
/// ヘッダが欠けている・不正な場合は401を返す。
#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get("x-actor-id")
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingActorId)?;
        let actor_id = Uuid::parse_str(actor_id).map_err(|_| AuthError::InvalidActorId)?;

        let role = parts
            .headers
            .get("x-actor-role")
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingActorRole)?;
        let role = Role::from_str(role).map_err(|_| AuthError::InvalidActorRole)?;

        Ok(Actor::new(UserId::from_uuid(actor_id), role))
    }
}
