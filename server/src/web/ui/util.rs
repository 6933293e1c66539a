use crate::auth_session::SessionToken;
use crate::web::ui::error::AppError;
use crate::web::ui::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::AppState;
use actix_web::cookie::Cookie;
use actix_web::HttpRequest;

pub const SESSION_COOKIE_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(30 * 86400);
pub const SESSION_COOKIE_NAME: &str = "villa-planner-session";

/// Extract the session token from the session token cookie and validate it
///
/// Returns [AppError::NotLoggedIn] if there is no valid session, which makes the error page
/// middleware redirect the user to the login page.
pub fn extract_session_token(
    app_state: &AppState,
    request: &HttpRequest,
) -> Result<SessionToken, AppError> {
    SessionToken::from_string(
        request
            .cookie(SESSION_COOKIE_NAME)
            .ok_or(AppError::NotLoggedIn {
                session_error: None,
            })?
            .value(),
        &app_state.secret,
        SESSION_COOKIE_MAX_AGE,
    )
    .map_err(|session_error| AppError::NotLoggedIn {
        session_error: Some(session_error),
    })
}

/// Extract and validate the session token from the session token cookie, if present. Invalid
/// sessions are ignored.
pub fn extract_session_token_if_present(
    app_state: &AppState,
    request: &HttpRequest,
) -> Option<SessionToken> {
    extract_session_token(app_state, request).ok()
}

pub fn create_session_cookie(session_token: &SessionToken, secret: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session_token.as_string(secret));
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(actix_web::cookie::SameSite::Lax);
    cookie.set_expires(actix_web::cookie::time::OffsetDateTime::now_utc() + SESSION_COOKIE_MAX_AGE);
    cookie
}

pub fn session_removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// Check that a redirect target (e.g. from a `next` query parameter) points to a page of this
/// application. Only absolute paths without host are accepted.
pub fn local_redirect_target(target: &str) -> Option<&str> {
    if target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\") {
        Some(target)
    } else {
        None
    }
}

/// Turn the recoverable errors of a form action into an error flash message for the user.
///
/// Returns `Ok(Some(value))` if the action succeeded, `Ok(None)` if it failed with a recoverable
/// error ([AppError::EventLocked], [AppError::ApartmentFull], [AppError::InvalidData]), which has
/// been added as flash message, and the original error otherwise.
pub fn flash_recoverable_error<T>(
    req: &HttpRequest,
    result: Result<T, AppError>,
) -> Result<Option<T>, AppError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e @ (AppError::EventLocked(_) | AppError::ApartmentFull(_) | AppError::InvalidData(_))) => {
            req.add_flash_message(FlashMessage::new(FlashType::Error, e.to_string()));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_local_redirect_target() {
        assert_eq!(local_redirect_target("/events/123"), Some("/events/123"));
        assert_eq!(local_redirect_target("/"), Some("/"));
        assert_eq!(local_redirect_target("//evil.example.com/"), None);
        assert_eq!(local_redirect_target("/\\evil.example.com/"), None);
        assert_eq!(local_redirect_target("https://evil.example.com/"), None);
        assert_eq!(local_redirect_target(""), None);
    }

    #[test]
    fn test_flash_recoverable_error() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            flash_recoverable_error(&req, Ok::<_, AppError>(5)),
            Ok(Some(5))
        ));
        assert!(matches!(
            flash_recoverable_error::<()>(
                &req,
                Err(AppError::ApartmentFull("Apartment apt_1 is full".to_owned()))
            ),
            Ok(None)
        ));
        assert!(matches!(
            flash_recoverable_error::<()>(&req, Err(AppError::EntityNotFound)),
            Err(AppError::EntityNotFound)
        ));
        let flashes = req.get_and_clear_flashes();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].message, "Apartment apt_1 is full");
    }
}
