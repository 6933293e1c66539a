use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{
    ApartmentOccupancy, ArrivalMode, Event, Guest, GuestType, NewGuest,
};
use crate::data_store::{ApartmentId, EventId, GuestFilter};
use crate::occupancy::OccupancyMap;
use crate::web::ui::base_template::{BaseTemplateContext, UserNavigation};
use crate::web::ui::error::AppError;
use crate::web::ui::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::form_values::{FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{
    FormFieldTemplate, HiddenInputTemplate, InputConfiguration, InputSize, InputType,
    SelectEntry, SelectTemplate,
};
use crate::web::ui::util;
use crate::web::ui::validation::{
    ChildAge, DateFromList, MaybeEmpty, NonEmptyString, NonNegativeInt32,
};
use crate::web::AppState;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::Redirect;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize, Debug, Default)]
pub struct ApartmentQuery {
    photo: Option<usize>,
}

#[get("/events/{event_id}/apartments/{apartment_id}")]
pub async fn apartment_detail(
    path: web::Path<(EventId, ApartmentId)>,
    query: web::Query<ApartmentQuery>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (event_id, apartment_id) = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let page_data = load_apartment_page_data(&state, session_token, event_id, apartment_id).await?;
    let form_data = GuestFormData::for_new_guest(&page_data.event, &page_data.apartment_id);
    render_apartment_page(
        &req,
        &state,
        &page_data,
        &form_data,
        query.photo.unwrap_or(0),
        StatusCode::OK,
    )
    .await
}

#[post("/events/{event_id}/apartments/{apartment_id}/refresh_photos")]
pub async fn refresh_photos(
    path: web::Path<(EventId, ApartmentId)>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (event_id, apartment_id) = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let store = state.store.clone();
    web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        store.get_event(&auth, event_id)?;
        Ok(())
    })
    .await??;

    state.backend.invalidate_photos(&apartment_id);
    req.add_flash_message(FlashMessage::new(
        FlashType::Info,
        "The photos have been reloaded.",
    ));
    Ok(Redirect::to(
        req.url_for(
            "apartment_detail",
            [event_id.to_string(), apartment_id.to_string()],
        )?
        .to_string(),
    )
    .see_other())
}

/// Everything from the data store, which is required for rendering the apartment page
pub struct ApartmentPageData {
    pub auth: AuthToken,
    pub event: Event,
    pub occupancy: OccupancyMap,
    pub apartment_id: ApartmentId,
    pub guests: Vec<Guest>,
}

/// Load the data for the apartment page of the user's session.
///
/// Returns [AppError::EntityNotFound] if the apartment does not exist.
pub async fn load_apartment_page_data(
    state: &AppState,
    session_token: SessionToken,
    event_id: EventId,
    apartment_id: ApartmentId,
) -> Result<ApartmentPageData, AppError> {
    let store = state.store.clone();
    web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        auth.check_privilege(event_id, Privilege::ShowGuestList)?;
        let event = store.get_event(&auth, event_id)?;
        let occupancy = OccupancyMap::new(store.get_apartment_occupancy(&auth, event_id)?);
        if occupancy.get(&apartment_id).is_none() {
            return Err(AppError::EntityNotFound);
        }
        let guests = store.get_guests(
            &auth,
            event_id,
            GuestFilter::builder()
                .in_apartment(apartment_id.clone())
                .build(),
        )?;
        Ok(ApartmentPageData {
            auth,
            event,
            occupancy,
            apartment_id,
            guests,
        })
    })
    .await?
}

/// Render the apartment page with the given state of the add-guest form.
///
/// The photo listing of the backend is not required for the page: if it fails, a warning is shown
/// instead of the photos.
pub async fn render_apartment_page(
    req: &HttpRequest,
    state: &AppState,
    page_data: &ApartmentPageData,
    form_data: &GuestFormData,
    photo: usize,
    status: StatusCode,
) -> Result<HttpResponse, AppError> {
    let photos = match state
        .backend
        .list_apartment_photos(&page_data.apartment_id)
        .await
    {
        Ok(photos) => photos,
        Err(e) => {
            log::warn!(
                "Could not list photos of {}: {}",
                page_data.apartment_id,
                e
            );
            req.add_flash_message(FlashMessage::new(
                FlashType::Warning,
                "The photos of the apartment could not be loaded.",
            ));
            vec![]
        }
    };
    let apartment = page_data
        .occupancy
        .get(&page_data.apartment_id)
        .ok_or(AppError::EntityNotFound)?;
    let event_id = page_data.event.id;

    let move_entries: Vec<SelectEntry> = std::iter::once(SelectEntry {
        value: "".into(),
        text: "Unassigned".into(),
    })
    .chain(
        page_data
            .occupancy
            .iter()
            .filter(|a| a.apartment_id != page_data.apartment_id)
            .map(|a| SelectEntry {
                value: a.apartment_id.as_str().into(),
                text: a.option_label().into(),
            }),
    )
    .collect();
    let move_default: FormValue<String> = "".to_owned().into();
    let checkin_entries: Vec<SelectEntry> = std::iter::once(SelectEntry {
        value: "".into(),
        text: "Not known yet".into(),
    })
    .chain(checkin_choices(&page_data.event).into_iter().map(|d| SelectEntry {
        value: d.format("%Y-%m-%d").to_string().into(),
        text: d.format("%d.%m.%Y").to_string().into(),
    }))
    .collect();

    let page_title = apartment.label();
    let guest_type_entries = guest_type_entries();
    let arrival_mode_entries = arrival_mode_entries();
    let tmpl = ApartmentTemplate {
        base: BaseTemplateContext {
            request: req,
            page_title: &page_title,
            event: Some(&page_data.event),
            user: UserNavigation::for_auth_token(&page_data.auth),
        },
        event: &page_data.event,
        apartment,
        guests: &page_data.guests,
        photos: &photos,
        photo: photo.min(photos.len().saturating_sub(1)),
        form_data,
        move_entries: &move_entries,
        move_default: &move_default,
        checkin_entries: &checkin_entries,
        guest_type_entries: &guest_type_entries,
        arrival_mode_entries: &arrival_mode_entries,
        can_edit: !page_data.event.is_locked()
            && page_data
                .auth
                .has_privilege(event_id, Privilege::EditGuestList),
    };
    Ok(HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(tmpl.render()?))
}

/// Possible check-in dates of guests: the day before the event and the first day of the event
fn checkin_choices(event: &Event) -> Vec<NaiveDate> {
    match event.start_date {
        Some(start) => start.pred_opt().into_iter().chain([start]).collect(),
        None => vec![],
    }
}

fn guest_type_entries() -> Vec<SelectEntry<'static>> {
    vec![
        SelectEntry {
            value: GuestType::Adult.as_db_str().into(),
            text: "Adult".into(),
        },
        SelectEntry {
            value: GuestType::Child.as_db_str().into(),
            text: "Child".into(),
        },
    ]
}

fn arrival_mode_entries() -> Vec<SelectEntry<'static>> {
    vec![
        SelectEntry {
            value: "".into(),
            text: "Not known yet".into(),
        },
        SelectEntry {
            value: ArrivalMode::Car.as_db_str().into(),
            text: "By car".into(),
        },
        SelectEntry {
            value: ArrivalMode::Transfer.as_db_str().into(),
            text: "Transfer".into(),
        },
    ]
}

/// Which submit button of the add-guest form has been used
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AddGuestTarget {
    /// Add the guest to the apartment of the page
    #[default]
    Apartment,
    /// Add the guest to the list of unassigned guests
    Unassigned,
}

#[derive(Deserialize, Default)]
pub struct GuestFormData {
    /// The apartment of the page, the form has been submitted from
    pub apartment_id: FormValue<String>,
    first_name: FormValue<NonEmptyString>,
    last_name: FormValue<NonEmptyString>,
    guest_type: FormValue<GuestType>,
    child_age: FormValue<MaybeEmpty<ChildAge>>,
    arrival_mode: FormValue<MaybeEmpty<ArrivalMode>>,
    checkin_date: FormValue<MaybeEmpty<DateFromList>>,
    extra_nights: FormValue<NonNegativeInt32>,
    allergies: FormValue<String>,
    notes: FormValue<String>,
    #[serde(default)]
    pub target: AddGuestTarget,
}

impl GuestFormData {
    pub fn for_new_guest(event: &Event, apartment_id: &str) -> Self {
        Self {
            apartment_id: apartment_id.to_owned().into(),
            checkin_date: MaybeEmpty(event.start_date.map(DateFromList)).into(),
            ..Self::default()
        }
    }

    /// Validate the form data and create the new guest (without apartment) from it.
    ///
    /// Check-out is always the last day of the event.
    pub fn validate(&mut self, event: &Event) -> Option<NewGuest> {
        let first_name = self.first_name.validate();
        let last_name = self.last_name.validate();
        let guest_type = self.guest_type.validate();
        let child_age = self.child_age.validate();
        let arrival_mode = self.arrival_mode.validate();
        let checkin_date = self.checkin_date.validate_with(&checkin_choices(event));
        let extra_nights = self.extra_nights.validate();
        let allergies = self.allergies.validate();
        let notes = self.notes.validate();

        let child_age = match (guest_type?, child_age?.into_inner()) {
            (GuestType::Child, None) => {
                self.child_age
                    .add_error("Please enter the age of the child.".to_owned());
                return None;
            }
            (GuestType::Child, Some(age)) => Some(age.into_inner()),
            (GuestType::Adult, _) => None,
        };

        Some(NewGuest {
            id: Uuid::now_v7(),
            event_id: event.id,
            apartment_id: None,
            first_name: first_name?.into_inner(),
            last_name: last_name?.into_inner(),
            guest_type: guest_type?,
            child_age,
            arrival_mode: arrival_mode?.into_inner(),
            checkin_date: checkin_date?.into_inner().map(|d| d.into_inner()),
            checkout_date: event.end_date,
            extra_nights: extra_nights?.into_inner(),
            allergies: non_empty(allergies?),
            notes: non_empty(notes?),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

#[derive(Template)]
#[template(path = "apartment.html")]
struct ApartmentTemplate<'a> {
    base: BaseTemplateContext<'a>,
    event: &'a Event,
    apartment: &'a ApartmentOccupancy,
    guests: &'a [Guest],
    photos: &'a [String],
    /// Index of the currently shown photo
    photo: usize,
    form_data: &'a GuestFormData,
    move_entries: &'a Vec<SelectEntry<'a>>,
    move_default: &'a FormValue<String>,
    checkin_entries: &'a Vec<SelectEntry<'a>>,
    guest_type_entries: &'a Vec<SelectEntry<'a>>,
    arrival_mode_entries: &'a Vec<SelectEntry<'a>>,
    can_edit: bool,
}

impl ApartmentTemplate<'_> {
    fn url(&self, name: &str, extra: &[String]) -> Result<String, AppError> {
        let mut elements = vec![self.event.id.to_string()];
        elements.extend_from_slice(extra);
        Ok(self.base.request.url_for(name, elements)?.to_string())
    }

    fn planner_url(&self) -> Result<String, AppError> {
        self.url("planner", &[])
    }

    fn page_url(&self) -> Result<String, AppError> {
        self.url("apartment_detail", &[self.apartment.apartment_id.clone()])
    }

    fn photo_url(&self, index: &usize) -> Result<String, AppError> {
        let mut url = self.base.request.url_for(
            "apartment_detail",
            [
                self.event.id.to_string(),
                self.apartment.apartment_id.clone(),
            ],
        )?;
        url.query_pairs_mut()
            .append_pair("photo", &index.to_string());
        Ok(url.to_string())
    }

    fn current_photo(&self) -> Option<&str> {
        self.photos.get(self.photo).map(|p| p.as_str())
    }

    fn previous_photo(&self) -> Option<usize> {
        self.photo.checked_sub(1)
    }

    fn next_photo(&self) -> Option<usize> {
        Some(self.photo + 1).filter(|i| *i < self.photos.len())
    }

    fn refresh_photos_url(&self) -> Result<String, AppError> {
        self.url("refresh_photos", &[self.apartment.apartment_id.clone()])
    }

    fn create_guest_url(&self) -> Result<String, AppError> {
        self.url("create_guest", &[])
    }

    fn move_url(&self, guest: &Guest) -> Result<String, AppError> {
        self.url("move_guest", &[guest.id.to_string()])
    }

    fn delete_url(&self, guest: &Guest) -> Result<String, AppError> {
        self.url("delete_guest", &[guest.id.to_string()])
    }

    fn move_select(&self) -> SelectTemplate<'_, String> {
        SelectTemplate::new(
            self.move_default,
            "apartment_id",
            self.move_entries,
            "Move to",
            InputConfiguration::builder().size(InputSize::Small).build(),
        )
    }

    fn is_full(&self) -> bool {
        !self.apartment.has_free_bed()
    }

    fn date(&self, date: &Option<NaiveDate>) -> String {
        date.map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| "–".to_owned())
    }
}
