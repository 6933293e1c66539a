//! Form actions for changing the guest list: adding, moving and removing guests and submitting the
//! final list

use crate::data_store::auth_token::Privilege;
use crate::data_store::{EventId, GuestId};
use crate::occupancy::{apartment_label, OccupancyMap};
use crate::web::ui::endpoints::apartment::{
    load_apartment_page_data, render_apartment_page, AddGuestTarget, GuestFormData,
};
use crate::web::ui::error::AppError;
use crate::web::ui::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::ui::form_values::FormValue;
use crate::web::ui::util;
use crate::web::ui::validation::{ApartmentFromList, MaybeEmpty};
use crate::web::AppState;
use actix_web::http::StatusCode;
use actix_web::web::{Form, Redirect};
use actix_web::{post, web, Either, HttpRequest, Responder, ResponseError};
use serde::Deserialize;

#[post("/events/{event_id}/guests")]
pub async fn create_guest(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    data: Form<GuestFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let mut form_data = data.into_inner();
    let apartment_id = form_data.apartment_id.string_value().to_owned();
    let page_data =
        load_apartment_page_data(&state, session_token, event_id, apartment_id.clone()).await?;

    let Some(mut guest) = form_data.validate(&page_data.event) else {
        req.add_flash_message(FlashMessage::new(
            FlashType::Error,
            "The guest could not be added. Please check the highlighted fields.",
        ));
        return Ok(Either::Left(
            render_apartment_page(
                &req,
                &state,
                &page_data,
                &form_data,
                0,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await?,
        ));
    };
    if form_data.target == AddGuestTarget::Apartment {
        guest.apartment_id = Some(apartment_id.clone());
    }
    let guest_name = format!("{} {}", guest.first_name, guest.last_name);
    let target_label = guest
        .apartment_id
        .as_deref()
        .map(apartment_label)
        .unwrap_or_else(|| "the unassigned guests".to_owned());

    let store = state.store.clone();
    let auth = page_data.auth.clone();
    let result = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        store.create_guest(&auth, guest)?;
        Ok(())
    })
    .await?;

    match result {
        Ok(()) => {
            req.add_flash_message(FlashMessage::new(
                FlashType::Success,
                format!("{} has been added to {}.", guest_name, target_label),
            ));
            Ok(Either::Right(
                Redirect::to(
                    req.url_for("apartment_detail", [event_id.to_string(), apartment_id])?
                        .to_string(),
                )
                .see_other(),
            ))
        }
        Err(e @ (AppError::EventLocked(_) | AppError::ApartmentFull(_) | AppError::InvalidData(_))) => {
            req.add_flash_message(FlashMessage::new(FlashType::Error, e.to_string()));
            Ok(Either::Left(
                render_apartment_page(&req, &state, &page_data, &form_data, 0, e.status_code())
                    .await?,
            ))
        }
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
pub struct MoveGuestFormData {
    /// The new apartment of the guest. Empty for making the guest unassigned.
    apartment_id: FormValue<MaybeEmpty<ApartmentFromList>>,
    #[serde(default)]
    return_to: Option<String>,
}

#[post("/events/{event_id}/guests/{guest_id}/move")]
pub async fn move_guest(
    path: web::Path<(EventId, GuestId)>,
    state: web::Data<AppState>,
    data: Form<MoveGuestFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (event_id, guest_id) = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let MoveGuestFormData {
        apartment_id: mut target_value,
        return_to,
    } = data.into_inner();

    let store = state.store.clone();
    let result = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        auth.check_privilege(event_id, Privilege::EditGuestList)?;
        let occupancy = OccupancyMap::new(store.get_apartment_occupancy(&auth, event_id)?);
        let apartment_ids: Vec<String> =
            occupancy.iter().map(|a| a.apartment_id.clone()).collect();
        let target = target_value
            .validate_with(&apartment_ids)
            .ok_or_else(|| AppError::InvalidData(target_value.errors().join(", ")))?
            .into_inner()
            .map(|a| a.into_inner());

        let guest = store.get_guest(&auth, event_id, guest_id)?;
        if let Some(apartment_id) = &target {
            if guest.apartment_id.as_ref() != Some(apartment_id) {
                occupancy.check_assignable(apartment_id)?;
            }
        }
        store.assign_guest(&auth, event_id, guest_id, target.clone())?;
        Ok((guest, target))
    })
    .await?;

    if let Some((guest, target)) = util::flash_recoverable_error(&req, result)? {
        let message = match target {
            Some(apartment_id) => format!(
                "{} {} has been moved to {}.",
                guest.first_name,
                guest.last_name,
                apartment_label(&apartment_id)
            ),
            None => format!(
                "{} {} is now unassigned.",
                guest.first_name, guest.last_name
            ),
        };
        req.add_flash_message(FlashMessage::new(FlashType::Success, message));
    }
    redirect_back(&req, event_id, return_to.as_deref())
}

#[derive(Deserialize)]
pub struct DeleteGuestFormData {
    #[serde(default)]
    return_to: Option<String>,
}

#[post("/events/{event_id}/guests/{guest_id}/delete")]
pub async fn delete_guest(
    path: web::Path<(EventId, GuestId)>,
    state: web::Data<AppState>,
    data: Form<DeleteGuestFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (event_id, guest_id) = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;

    let store = state.store.clone();
    let result = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        let guest = store.get_guest(&auth, event_id, guest_id)?;
        store.delete_guest(&auth, event_id, guest_id)?;
        Ok(guest)
    })
    .await?;

    if let Some(guest) = util::flash_recoverable_error(&req, result)? {
        req.add_flash_message(FlashMessage::new(
            FlashType::Success,
            format!(
                "{} {} has been removed from the guest list.",
                guest.first_name, guest.last_name
            ),
        ));
    }
    redirect_back(&req, event_id, data.return_to.as_deref())
}

#[post("/events/{event_id}/submit")]
pub async fn submit_guest_list(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;

    let store = state.store.clone();
    let result = web::block(move || -> Result<_, AppError> {
        let mut store = store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        store.submit_event(&auth, event_id)?;
        Ok(())
    })
    .await?;

    if util::flash_recoverable_error(&req, result)?.is_some() {
        log::info!("Guest list of event {} has been submitted", event_id);
        req.add_flash_message(FlashMessage::new(
            FlashType::Success,
            "Thank you! The guest list has been submitted to the villa staff.",
        ));
    }
    redirect_back(&req, event_id, None)
}

/// Redirect to the page, the form has been submitted from, or else to the event's planner page.
fn redirect_back(
    req: &HttpRequest,
    event_id: EventId,
    return_to: Option<&str>,
) -> Result<Redirect, AppError> {
    let target = match return_to.and_then(util::local_redirect_target) {
        Some(target) => target.to_owned(),
        None => req.url_for("planner", [event_id.to_string()])?.to_string(),
    };
    Ok(Redirect::to(target).see_other())
}
