//! This module provides functionality to generate nice-looking error pages for errors returned from
//! handler functions.
//!
//! This is achieved by an actix-web middleware that replaces the original HTTP response in the case
//! of an error. In contrast to rendering the error page in our [actix_web::ResponseError]
//! implementation, this allows us to access the HTTP Request, e.g. for generating URLs to static
//! files and other pages.
use crate::web::ui::base_template::{BaseTemplateContext, UserNavigation};
use crate::web::ui::endpoints::auth::LoginQueryData;
use crate::web::ui::error::AppError;
use actix_web::body::EitherBody;
use actix_web::http::{header, Method, StatusCode};
use actix_web::web::Html;
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError};
use askama::Template;

/// An actix-web middleware for generating nice error pages
///
/// The middleware replaces the existing HTTP response (typically generated from the error's
/// ResponseError implementation) with a nice error page, when an error has been returned by the
/// endpoint handler function. The nice error page is generated from askama templates, extending the
/// "base.html" template to keep the application's look & feel. In case, rendering the template
/// fails (maybe, something is really borked in the application), we fall back to a plain text
/// representation of the error.
///
/// If the error, returned from the endpoint handler, is an [AppError], we try to use the semantic
/// information to provide a descriptive and helpful error page to the user. Otherwise, we simply
/// show the string representation of the error. [AppError::NotLoggedIn] is answered with a
/// redirect to the login page instead.
///
/// Typical usage:
/// ```ignore
/// use crate::web::ui::error::AppError;
///
/// let service = actix_web::web::scope("")
///     .service(my_endpoint)
///     .wrap(actix_web::middleware::from_fn(error_page_middleware));
///
/// #[actix_web::get("/my_endpoint")]
/// async fn my_endpoint() -> Result<impl actix_web::Responder, AppError> {
///     todo!()
/// }
/// ```
pub async fn error_page_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<EitherBody<B, String>>, actix_web::Error> {
    let response = next.call(req).await?;

    let Some(error) = response.response().error() else {
        return Ok(response.map_body(|_, body| EitherBody::left(body)));
    };
    let response_body = if let Some(app_error) = error.as_error::<AppError>() {
        if let AppError::NotLoggedIn { .. } = app_error {
            generate_login_redirect(response.request())
        } else {
            generate_app_error_page(app_error, response.request())
        }
    } else {
        generate_generic_error_page(error.as_response_error(), response.request())
    };
    let (req, _res) = response.into_parts();
    Ok(actix_web::dev::ServiceResponse::new(
        req,
        response_body.map_body(|_, body| EitherBody::right(body)),
    ))
}

/// Redirect the user to the login page, returning to the current page after login (if it can be
/// returned to with a GET request).
fn generate_login_redirect(http_request: &HttpRequest) -> HttpResponse<String> {
    let query = LoginQueryData {
        next: (http_request.method() == Method::GET).then(|| {
            http_request
                .uri()
                .path_and_query()
                .map(|p| p.as_str().to_owned())
                .unwrap_or_else(|| "/".to_owned())
        }),
    };
    let location = match serde_urlencoded::to_string(&query) {
        Ok(q) if !q.is_empty() => format!("/login?{}", q),
        _ => "/login".to_owned(),
    };
    let mut response = HttpResponse::with_body(StatusCode::SEE_OTHER, String::new());
    // The query is url-encoded, so the location is always a valid header value.
    if let Ok(location) = header::HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

/// Generate a nice error page with additional information and help for the given [AppError].
fn generate_app_error_page(
    app_error: &AppError,
    http_request: &HttpRequest,
) -> HttpResponse<String> {
    let tmpl = AppErrorTemplate {
        base: BaseTemplateContext {
            request: http_request,
            page_title: "Error",
            event: None,
            user: UserNavigation::Anonymous,
        },
        error: app_error,
        url: &http_request.full_url(),
        timestamp: chrono::Local::now(),
    };
    render_template_or_show_error_as_string(tmpl, app_error, http_request)
}

/// Generate a nice error page for the given `error`, using its string representation.
fn generate_generic_error_page(
    error: &dyn ResponseError,
    http_request: &HttpRequest,
) -> HttpResponse<String> {
    let tmpl = ErrorTemplate {
        base: BaseTemplateContext {
            request: http_request,
            page_title: "Error",
            event: None,
            user: UserNavigation::Anonymous,
        },
        error,
        url: &http_request.full_url(),
        timestamp: chrono::Local::now(),
    };
    render_template_or_show_error_as_string(tmpl, error, http_request)
}

/// Try to render the given [askama::Template] structure and generate an HTTP response as an HTML
/// error page for the given error and create an HTTP response.
///
/// In case of an error while rendering the template, return a plain text HTTP response with the
/// error's string representation.
fn render_template_or_show_error_as_string(
    tmpl: impl Template,
    error: &dyn ResponseError,
    req: &HttpRequest,
) -> HttpResponse<String> {
    match tmpl.render() {
        Ok(body) => (Html::new(body), error.status_code()).respond_to(req),
        Err(err) => (
            format!(
                "Error: {}\n(Could not render nice error page: {})",
                error, err
            ),
            error.status_code(),
        )
            .respond_to(req),
    }
}

#[derive(Debug, Template)]
#[template(path = "app_error.html")]
struct AppErrorTemplate<'a> {
    base: BaseTemplateContext<'a>,
    error: &'a AppError,
    url: &'a url::Url,
    timestamp: chrono::DateTime<chrono::Local>,
}

#[derive(Debug, Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    base: BaseTemplateContext<'a>,
    error: &'a dyn ResponseError,
    url: &'a url::Url,
    timestamp: chrono::DateTime<chrono::Local>,
}

impl AppErrorTemplate<'_> {
    fn title(&self) -> &'static str {
        match self.error {
            AppError::PageNotFound | AppError::EntityNotFound => "Not found",
            AppError::PermissionDenied { .. } => "Not allowed",
            AppError::EventLocked(_) => "Guest list locked",
            AppError::ApartmentFull(_) => "Apartment full",
            AppError::InvalidData(_) => "Invalid input",
            AppError::NotLoggedIn { .. } => "Not logged in",
            AppError::TransactionConflict => "Please retry",
            AppError::BackendError(_)
            | AppError::DatabaseConnectionError(_)
            | AppError::InternalError(_) => "Internal error",
        }
    }

    /// A helpful hint for the user what to do next
    fn hint(&self) -> &'static str {
        match self.error {
            AppError::PageNotFound | AppError::EntityNotFound => {
                "The page or entry you requested does not exist (anymore). Please check the link."
            }
            AppError::PermissionDenied { .. } => {
                "Your account is not allowed to access this page. You may log in with another account."
            }
            AppError::EventLocked(_) => {
                "The guest list has already been submitted. Please contact the villa staff for changes."
            }
            AppError::ApartmentFull(_) => "Please choose another apartment.",
            AppError::InvalidData(_) => "Please go back and correct your input.",
            AppError::NotLoggedIn { .. } => "Please log in.",
            AppError::TransactionConflict => {
                "Someone else changed the guest list at the same time. Please go back and retry."
            }
            AppError::BackendError(_)
            | AppError::DatabaseConnectionError(_)
            | AppError::InternalError(_) => {
                "Something went wrong on our side. Please try again later or contact the villa staff."
            }
        }
    }

    fn show_login_link(&self) -> bool {
        matches!(self.error, AppError::PermissionDenied { .. })
    }
}
