use crate::auth_session::SessionToken;
use crate::data_store::auth_token::Privilege;
use crate::data_store::models::{Event, EventStatus};
use crate::data_store::EventFilter;
use crate::web::client_accounts::{
    admin_auth_token, create_client_account, CreateClientError, NewClientAccount,
};
use crate::web::ui::base_template::{BaseTemplateContext, UserNavigation};
use crate::web::ui::error::AppError;
use crate::web::ui::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::form_values::{FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    FormFieldTemplate, InputConfiguration, InputSize, InputType,
};
use crate::web::ui::util;
use crate::web::ui::validation::{EmailAddress, IsoDate, MaybeEmpty, NonEmptyString, Password};
use crate::web::AppState;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::{Form, Redirect};
use actix_web::{get, post, web, Either, HttpRequest, HttpResponse, Responder};
use askama::Template;
use serde::Deserialize;
use villa_planner_api_types::CreateUserAndEventRequest;

/// Minimum number of characters of the event name filter
const MIN_FILTER_LENGTH: usize = 2;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AdminEventsQuery {
    #[serde(default)]
    q: Option<String>,
    /// "all" or one of the event status names
    #[serde(default)]
    status: Option<String>,
}

impl AdminEventsQuery {
    fn to_filter(&self) -> EventFilter {
        EventFilter {
            status: self
                .status
                .as_deref()
                .and_then(EventStatus::from_db_str),
            name_contains: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| q.chars().count() >= MIN_FILTER_LENGTH)
                .map(str::to_owned),
        }
    }
}

#[get("/admin/events")]
pub async fn admin_events_list(
    query: web::Query<AdminEventsQuery>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let query = query.into_inner();
    let events = load_events(&state, session_token, query.to_filter()).await?;
    render_events_page(
        &req,
        &events,
        &query,
        &NewClientEventFormData::default(),
        StatusCode::OK,
    )
}

#[post("/admin/events/new")]
pub async fn new_client_event(
    state: web::Data<AppState>,
    data: Form<NewClientEventFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let session_token = util::extract_session_token(&state, &req)?;
    let auth = admin_auth_token(&state, session_token.clone()).await?;
    let mut form_data = data.into_inner();

    let account = form_data.validate();
    let result = match account {
        Some(account) => Some(create_client_account(&state, auth, account).await),
        None => None,
    };

    match result {
        Some(Ok((_user_id, event_id))) => {
            req.add_flash_message(FlashMessage::new(
                FlashType::Success,
                format!(
                    "The client account for {} and the event have been created.",
                    form_data.email.string_value()
                ),
            ));
            Ok(Either::Left(
                Redirect::to(
                    req.url_for("admin_event_summary", [event_id.to_string()])?
                        .to_string(),
                )
                .see_other(),
            ))
        }
        Some(Err(CreateClientError::UserRejected(message))) => {
            req.add_flash_message(FlashMessage::new(
                FlashType::Error,
                format!("The client account could not be created: {}", message),
            ));
            let query = AdminEventsQuery::default();
            let events = load_events(&state, session_token, query.to_filter()).await?;
            Ok(Either::Right(render_events_page(
                &req,
                &events,
                &query,
                &form_data,
                StatusCode::UNPROCESSABLE_ENTITY,
            )?))
        }
        Some(Err(e)) => Err(e.into()),
        None => {
            req.add_flash_message(FlashMessage::new(
                FlashType::Error,
                "Invalid input. Please check the highlighted fields.",
            ));
            let query = AdminEventsQuery::default();
            let events = load_events(&state, session_token, query.to_filter()).await?;
            Ok(Either::Right(render_events_page(
                &req,
                &events,
                &query,
                &form_data,
                StatusCode::UNPROCESSABLE_ENTITY,
            )?))
        }
    }
}

async fn load_events(
    state: &AppState,
    session_token: SessionToken,
    filter: EventFilter,
) -> Result<Vec<Event>, AppError> {
    let store = state.store.clone();
    web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_global_auth_token_for_session(&session_token)?;
        auth.check_privilege(Privilege::ListAllEvents)?;
        Ok(store.get_events(&auth, filter)?)
    })
    .await?
}

fn render_events_page(
    req: &HttpRequest,
    events: &[Event],
    query: &AdminEventsQuery,
    form_data: &NewClientEventFormData,
    status: StatusCode,
) -> Result<HttpResponse, AppError> {
    let tmpl = AdminEventsTemplate {
        base: BaseTemplateContext {
            request: req,
            page_title: "Events",
            event: None,
            user: UserNavigation::Admin,
        },
        events,
        search: query.q.as_deref().unwrap_or(""),
        status_filter: query.status.as_deref().unwrap_or("all"),
        form_data,
    };
    Ok(HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(tmpl.render()?))
}

#[derive(Deserialize, Default)]
pub struct NewClientEventFormData {
    email: FormValue<EmailAddress>,
    password: FormValue<Password>,
    full_name: FormValue<MaybeEmpty<NonEmptyString>>,
    event_name: FormValue<NonEmptyString>,
    start_date: FormValue<MaybeEmpty<IsoDate>>,
    end_date: FormValue<MaybeEmpty<IsoDate>>,
}

impl NewClientEventFormData {
    fn validate(&mut self) -> Option<NewClientAccount> {
        let email = self.email.validate();
        let password = self.password.validate();
        let full_name = self.full_name.validate();
        let event_name = self.event_name.validate();
        let start_date = self.start_date.validate();
        let end_date = self.end_date.validate();

        let request = CreateUserAndEventRequest {
            email: email?.into_inner(),
            password: password?.into_inner(),
            full_name: full_name?.into_inner().map(|n| n.into_inner()),
            event_name: event_name?.into_inner(),
            start_date: start_date?.into_inner().map(|d| d.into_inner()),
            end_date: end_date?.into_inner().map(|d| d.into_inner()),
        };
        match NewClientAccount::try_from(request) {
            Ok(account) => Some(account),
            Err(e) => {
                // The remaining checks concern the event's dates
                self.end_date.add_error(e);
                None
            }
        }
    }
}

#[derive(Template)]
#[template(path = "admin_events.html")]
struct AdminEventsTemplate<'a> {
    base: BaseTemplateContext<'a>,
    events: &'a [Event],
    search: &'a str,
    status_filter: &'a str,
    form_data: &'a NewClientEventFormData,
}

impl AdminEventsTemplate<'_> {
    fn status_options(&self) -> [EventStatus; 3] {
        EventStatus::ALL
    }

    fn event_url(&self, event: &Event) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("admin_event_summary", [event.id.to_string()])?
            .to_string())
    }

    fn new_event_url(&self) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for_static("new_client_event")?
            .to_string())
    }

    fn list_url(&self) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for_static("admin_events_list")?
            .to_string())
    }
}
