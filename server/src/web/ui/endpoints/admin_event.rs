use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{ApartmentOccupancy, Event, EventStatus, Guest};
use crate::data_store::{EventId, GuestFilter};
use crate::export;
use crate::occupancy::OccupancyMap;
use crate::web::ui::base_template::{BaseTemplateContext, UserNavigation};
use crate::web::ui::error::AppError;
use crate::web::ui::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::form_values::{FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    InputConfiguration, InputSize, SelectEntry, SelectTemplate,
};
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::web::{Form, Html, Redirect};
use actix_web::{get, post, web, HttpRequest, HttpResponseBuilder, Responder};
use askama::Template;
use serde::Deserialize;

/// Event, guests and occupancy of an event, as required for the summary page and the exports
struct EventData {
    auth: AuthToken,
    event: Event,
    guests: Vec<Guest>,
    occupancy: OccupancyMap,
}

async fn load_event_data(
    state: &AppState,
    session_token: SessionToken,
    event_id: EventId,
) -> Result<EventData, AppError> {
    let store = state.store.clone();
    web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        auth.check_privilege(event_id, Privilege::ExportGuestList)?;
        let event = store.get_event(&auth, event_id)?;
        let guests = store.get_guests(&auth, event_id, GuestFilter::default())?;
        let occupancy = OccupancyMap::new(store.get_apartment_occupancy(&auth, event_id)?);
        Ok(EventData {
            auth,
            event,
            guests,
            occupancy,
        })
    })
    .await?
}

#[get("/admin/events/{event_id}")]
pub async fn admin_event_summary(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let data = load_event_data(&state, session_token, event_id).await?;

    let sections: Vec<SummarySection> = data
        .occupancy
        .iter()
        .map(|apartment| SummarySection {
            apartment,
            guests: data
                .guests
                .iter()
                .filter(|g| g.apartment_id.as_deref() == Some(&apartment.apartment_id))
                .collect(),
        })
        .collect();
    let unassigned: Vec<&Guest> = data
        .guests
        .iter()
        .filter(|g| g.apartment_id.is_none())
        .collect();
    let status_value: FormValue<EventStatus> = data.event.status.into();
    let status_entries: Vec<SelectEntry> = EventStatus::ALL
        .iter()
        .map(|s| SelectEntry {
            value: s.as_db_str().into(),
            text: s.name().into(),
        })
        .collect();

    let tmpl = AdminEventTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: &data.event.name,
            event: Some(&data.event),
            user: UserNavigation::for_auth_token(&data.auth),
        },
        event: &data.event,
        total_guests: data.guests.len(),
        sections: &sections,
        unassigned: &unassigned,
        status_value: &status_value,
        status_entries: &status_entries,
    };
    Ok(Html::new(tmpl.render()?))
}

#[derive(Deserialize)]
pub struct StatusFormData {
    status: FormValue<EventStatus>,
}

#[post("/admin/events/{event_id}/status")]
pub async fn set_status(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    data: Form<StatusFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let mut form_data = data.into_inner();
    let status = form_data
        .status
        .validate()
        .ok_or_else(|| AppError::InvalidData(form_data.status.errors().join(", ")))?;

    let store = state.store.clone();
    web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        store.set_event_status(&auth, event_id, status)?;
        Ok(())
    })
    .await??;

    log::info!("Status of event {} set to {}", event_id, status.as_db_str());
    req.add_flash_message(FlashMessage::new(
        FlashType::Success,
        format!("The event's status has been set to {}.", status.name()),
    ));
    Ok(Redirect::to(
        req.url_for("admin_event_summary", [event_id.to_string()])?
            .to_string(),
    )
    .see_other())
}

#[get("/admin/events/{event_id}/export.csv")]
pub async fn export_csv(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let data = load_event_data(&state, session_token, event_id).await?;

    Ok(HttpResponseBuilder::new(StatusCode::OK)
        .content_type("text/csv; charset=utf-8")
        .append_header(attachment(export::csv_filename(event_id)))
        .body(export::guests_csv(
            &data.event,
            &data.guests,
            &data.occupancy,
        )))
}

#[get("/admin/events/{event_id}/report.html")]
pub async fn export_report(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let data = load_event_data(&state, session_token, event_id).await?;

    Ok(HttpResponseBuilder::new(StatusCode::OK)
        .content_type("text/html; charset=utf-8")
        .append_header(attachment(export::report_filename(event_id)))
        .body(export::guests_report_html(
            &data.event,
            &data.guests,
            &data.occupancy,
        )?))
}

fn attachment(filename: String) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    }
}

struct SummarySection<'a> {
    apartment: &'a ApartmentOccupancy,
    guests: Vec<&'a Guest>,
}

#[derive(Template)]
#[template(path = "admin_event.html")]
struct AdminEventTemplate<'a> {
    base: BaseTemplateContext<'a>,
    event: &'a Event,
    total_guests: usize,
    sections: &'a [SummarySection<'a>],
    unassigned: &'a [&'a Guest],
    status_value: &'a FormValue<EventStatus>,
    status_entries: &'a Vec<SelectEntry<'a>>,
}

impl AdminEventTemplate<'_> {
    fn url(&self, name: &str) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(name, [self.event.id.to_string()])?
            .to_string())
    }

    fn status_select(&self) -> SelectTemplate<'_, EventStatus> {
        SelectTemplate::new(
            self.status_value,
            "status",
            self.status_entries,
            "Status",
            InputConfiguration::builder().size(InputSize::Small).build(),
        )
    }

    fn submitted_at(&self) -> Option<String> {
        self.event
            .submitted_at
            .map(|t| t.format("%d.%m.%Y %H:%M UTC").to_string())
    }
}

mod filters {
    pub use crate::web::ui::askama_filters::ellipsis;
}
