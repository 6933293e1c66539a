use crate::data_store::models::Event;
use crate::data_store::StoreError;
use crate::web::ui::base_template::{BaseTemplateContext, UserNavigation};
use crate::web::ui::error::AppError;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::{Html, Redirect};
use actix_web::{get, web, Either, HttpRequest, Responder};
use askama::Template;

/// Start page of clients, showing their event
#[get("/events")]
pub async fn client_home(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let (is_admin, full_name, event) = web::block(move || -> Result<_, AppError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_global_auth_token_for_session(&session_token)?;
        let full_name = match store.get_profile(&session_token) {
            Ok(profile) => profile.full_name,
            Err(StoreError::NotExisting) => None,
            Err(e) => return Err(e.into()),
        };
        Ok((
            auth.is_admin(),
            full_name,
            store.get_own_event(&session_token)?,
        ))
    })
    .await??;

    if is_admin {
        return Ok(Either::Left(
            Redirect::to(req.url_for_static("admin_events_list")?.to_string()).see_other(),
        ));
    }

    let tmpl = ClientHomeTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "My event",
            event: event.as_ref(),
            user: UserNavigation::Client,
        },
        full_name: full_name.as_deref(),
        event: event.as_ref(),
    };
    Ok(Either::Right(Html::new(tmpl.render()?)))
}

#[derive(Template)]
#[template(path = "client_home.html")]
struct ClientHomeTemplate<'a> {
    base: BaseTemplateContext<'a>,
    full_name: Option<&'a str>,
    event: Option<&'a Event>,
}

impl ClientHomeTemplate<'_> {
    fn planner_url(&self, event: &Event) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("planner", [event.id.to_string()])?
            .to_string())
    }
}
