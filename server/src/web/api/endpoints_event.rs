use crate::data_store::{EventId, GuestFilter};
use crate::occupancy::OccupancyMap;
use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{get, web, Responder};

#[get("/events/{event_id}")]
async fn get_event_info(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let event: villa_planner_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        Ok(store.get_event(&auth, event_id)?)
    })
    .await??
    .into();
    Ok(web::Json(event))
}

/// Occupancy of all apartments for the event, in display order
#[get("/events/{event_id}/occupancy")]
async fn get_occupancy(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let occupancy = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        Ok(OccupancyMap::new(
            store.get_apartment_occupancy(&auth, event_id)?,
        ))
    })
    .await??;
    let result: Vec<villa_planner_api_types::ApartmentOccupancy> =
        occupancy.iter().map(|a| a.clone().into()).collect();
    Ok(web::Json(result))
}

#[get("/events/{event_id}/guests")]
async fn list_guests(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let guests: Vec<villa_planner_api_types::Guest> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token, event_id)?;
        Ok(store.get_guests(&auth, event_id, GuestFilter::default())?)
    })
    .await??
    .into_iter()
    .map(|g| g.into())
    .collect();
    Ok(web::Json(guests))
}
