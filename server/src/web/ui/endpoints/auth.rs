use crate::auth_session::SessionToken;
use crate::web::ui::base_template::{BaseTemplateContext, UserNavigation};
use crate::web::ui::error::AppError;
use crate::web::ui::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::form_values::{FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    FormFieldTemplate, InputConfiguration, InputType,
};
use crate::web::ui::util;
use crate::web::ui::validation::EmailAddress;
use crate::web::AppState;
use actix_web::http::header::{self, ContentType};
use actix_web::web::{Form, Html, Redirect};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use serde::{Deserialize, Serialize};

/// Query parameters of the login page
#[derive(Deserialize, Serialize, Default, Debug)]
pub struct LoginQueryData {
    /// Local path to redirect to after successful login
    pub next: Option<String>,
}

#[get("/login")]
pub async fn login_form(
    query: web::Query<LoginQueryData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let form_data = LoginFormData::default();
    let tmpl = LoginFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Login",
            event: None,
            user: UserNavigation::Anonymous,
        },
        form_data: &form_data,
        next: query.next.as_deref(),
        error: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/login")]
pub async fn login(
    query: web::Query<LoginQueryData>,
    state: web::Data<AppState>,
    data: Form<LoginFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let mut form_data = data.into_inner();
    let email = form_data.email.validate();

    let error = match email {
        Some(_) if form_data.password.is_empty() => Some("Please enter your password."),
        Some(email) => {
            match state
                .backend
                .sign_in_with_password(&email.into_inner(), &form_data.password)
                .await
            {
                Ok(user) => {
                    log::info!("User {} logged in", user.id);
                    let session_token = SessionToken::new(user.id);
                    let target = query
                        .next
                        .as_deref()
                        .and_then(util::local_redirect_target)
                        .unwrap_or("/");
                    return Ok(HttpResponse::SeeOther()
                        .cookie(util::create_session_cookie(&session_token, &state.secret))
                        .append_header((header::LOCATION, target.to_owned()))
                        .finish());
                }
                Err(e) if e.is_client_error() => {
                    log::debug!("Login failed: {}", e);
                    Some("Invalid email address or password.")
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => None,
    };

    form_data.password.clear();
    let tmpl = LoginFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Login",
            event: None,
            user: UserNavigation::Anonymous,
        },
        form_data: &form_data,
        next: query.next.as_deref(),
        error,
    };
    Ok(HttpResponse::UnprocessableEntity()
        .content_type(ContentType::html())
        .body(tmpl.render()?))
}

#[post("/logout")]
pub async fn logout(req: HttpRequest) -> Result<impl Responder, AppError> {
    req.add_flash_message(FlashMessage::new(
        FlashType::Success,
        "You have been logged out.",
    ));
    Ok(Redirect::to(req.url_for_static("login_form")?.to_string())
        .see_other()
        .customize()
        .add_cookie(&util::session_removal_cookie()))
}

#[derive(Deserialize, Default)]
pub struct LoginFormData {
    email: FormValue<EmailAddress>,
    #[serde(default)]
    password: String,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a LoginFormData,
    next: Option<&'a str>,
    error: Option<&'a str>,
}

impl LoginFormTemplate<'_> {
    fn post_url(&self) -> Result<String, AppError> {
        let mut url = self.base.request.url_for_static("login")?;
        if let Some(next) = self.next {
            url.query_pairs_mut().append_pair("next", next);
        }
        Ok(url.to_string())
    }
}
