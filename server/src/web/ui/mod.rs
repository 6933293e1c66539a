use crate::web::ui::error::AppError;
use crate::web::ui::error_page::error_page_middleware;
use crate::web::ui::flash::flash_middleware;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::middleware::from_fn;
use actix_web::{get, web, HttpResponse, Responder};
use rust_embed::Embed;

mod askama_filters;
mod base_template;
mod endpoints;
pub mod error;
mod error_page;
mod flash;
mod floor_plan;
mod form_values;
mod sub_templates;
mod util;
mod validation;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        get_ui_service()
            .wrap(from_fn(flash_middleware))
            .wrap(from_fn(error_page_middleware)),
    );
}

fn get_ui_service() -> actix_web::Scope {
    web::scope("")
        .service(static_resources)
        .service(endpoints::index::index)
        .service(endpoints::auth::login_form)
        .service(endpoints::auth::login)
        .service(endpoints::auth::logout)
        .service(endpoints::client_home::client_home)
        .service(endpoints::planner::planner)
        .service(endpoints::apartment::apartment_detail)
        .service(endpoints::apartment::refresh_photos)
        .service(endpoints::guests::create_guest)
        .service(endpoints::guests::move_guest)
        .service(endpoints::guests::delete_guest)
        .service(endpoints::guests::submit_guest_list)
        .service(endpoints::admin_events::admin_events_list)
        .service(endpoints::admin_events::new_client_event)
        .service(endpoints::admin_event::admin_event_summary)
        .service(endpoints::admin_event::set_status)
        .service(endpoints::admin_event::export_csv)
        .service(endpoints::admin_event::export_report)
        .default_service(web::to(not_found_handler))
}

#[derive(Embed)]
#[folder = "static/"]
struct Resources;

impl Resources {
    fn handle_embedded_file(path: &str) -> HttpResponse {
        match Self::get(path) {
            Some(content) => HttpResponse::Ok()
                .content_type(mime_guess::from_path(path).first_or_octet_stream().as_ref())
                .append_header(CacheControl(vec![CacheDirective::MaxAge(86400 * 365)]))
                .body(content.data.into_owned()),
            None => {
                HttpResponse::NotFound().body(format!("Static resource file '{}' not found", path))
            }
        }
    }
}

#[get("/static/{_:.*}")]
async fn static_resources(path: web::Path<String>) -> impl Responder {
    Resources::handle_embedded_file(path.as_str())
}

async fn not_found_handler() -> Result<&'static str, AppError> {
    Err(AppError::PageNotFound)
}
