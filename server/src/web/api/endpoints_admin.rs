use crate::auth_session::SessionToken;
use crate::web::api::{APIError, SESSION_TOKEN_MAX_AGE};
use crate::web::client_accounts::{self, NewClientAccount};
use crate::web::AppState;
use actix_web::error::JsonPayloadError;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{post, web, HttpRequest, Responder};
use villa_planner_api_types::{CreateUserAndEventRequest, CreateUserAndEventResponse};

/// Create a client account (backend user) together with the client's draft event.
///
/// The caller authenticates with `Authorization: Bearer <token>`, where the token may either be
/// one of our session tokens or an access token of the managed backend's auth service. The JSON
/// body is only parsed after the caller has been authenticated.
#[post("/admin/create-user-and-event")]
async fn create_user_and_event(
    body: web::Bytes,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, APIError> {
    let token = bearer_token(&req).ok_or(APIError::MissingBearerToken)?;
    let session_token = resolve_bearer_token(&state, token).await?;
    let auth = client_accounts::admin_auth_token(&state, session_token).await?;

    let data: CreateUserAndEventRequest = serde_json::from_slice(&body)
        .map_err(|e| APIError::InvalidJson(JsonPayloadError::Deserialize(e)))?;
    let account = NewClientAccount::try_from(data).map_err(APIError::InvalidData)?;
    let (user_id, event_id) = client_accounts::create_client_account(&state, auth, account).await?;

    Ok(web::Json(CreateUserAndEventResponse {
        ok: true,
        user_id,
        event_id,
    }))
}

/// Extract the token from the `Authorization: Bearer <token>` header, if present and not empty.
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Get the session of the user identified by the bearer token.
///
/// Our own session tokens are checked locally. Any other token is resolved by the backend's auth
/// service.
async fn resolve_bearer_token(state: &AppState, token: &str) -> Result<SessionToken, APIError> {
    if let Ok(session_token) = SessionToken::from_string(token, &state.secret, SESSION_TOKEN_MAX_AGE)
    {
        return Ok(session_token);
    }
    match state.backend.get_user(token).await {
        Ok(user) => Ok(SessionToken::new(user.id)),
        Err(e) if e.is_client_error() => Err(APIError::InvalidBearerToken),
        Err(e) => Err(APIError::BackendUnavailable(e.to_string())),
    }
}
