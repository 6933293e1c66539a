use crate::web::ui::error::AppError;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::Redirect;
use actix_web::{get, web, HttpRequest, Responder};

/// Entry page: send the user to the login page or to their start page, depending on their role
#[get("/")]
pub async fn index(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let Some(session_token) = util::extract_session_token_if_present(&state, &req) else {
        return Ok(Redirect::to(req.url_for_static("login_form")?.to_string()).see_other());
    };
    let auth = web::block(move || -> Result<_, AppError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_global_auth_token_for_session(&session_token)?)
    })
    .await??;

    let target = if auth.is_admin() {
        req.url_for_static("admin_events_list")?
    } else {
        req.url_for_static("client_home")?
    };
    Ok(Redirect::to(target.to_string()).see_other())
}
