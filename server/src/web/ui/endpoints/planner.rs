use crate::data_store::auth_token::Privilege;
use crate::data_store::models::{Event, Guest};
use crate::data_store::{EventId, GuestFilter};
use crate::occupancy::OccupancyMap;
use crate::web::ui::base_template::{BaseTemplateContext, UserNavigation};
use crate::web::ui::error::AppError;
use crate::web::ui::floor_plan::{render_floor_plan, FloorPlan};
use crate::web::ui::form_values::FormValue;
use crate::web::ui::sub_templates::form_inputs::{
    InputConfiguration, InputSize, SelectEntry, SelectTemplate,
};
use crate::web::ui::util;
use crate::web::ui::validation::ApartmentFromList;
use crate::web::AppState;
use actix_web::web::Html;
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;
use serde::Deserialize;

/// Minimum number of characters of a guest search
const MIN_SEARCH_LENGTH: usize = 2;
/// Maximum number of guests listed as search result
const MAX_SEARCH_RESULTS: i64 = 30;

#[derive(Deserialize, Debug, Default)]
pub struct PlannerQuery {
    plan: Option<String>,
    q: Option<String>,
}

#[get("/events/{event_id}")]
pub async fn planner(
    path: web::Path<EventId>,
    query: web::Query<PlannerQuery>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_id = path.into_inner();
    let query = query.into_inner();
    let session_token = util::extract_session_token(&state, &req)?;
    let plan = query
        .plan
        .as_deref()
        .and_then(FloorPlan::from_query_value)
        .unwrap_or(FloorPlan::LakehouseGround);
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| q.chars().count() >= MIN_SEARCH_LENGTH)
        .map(str::to_owned);
    let search_too_short = query
        .q
        .as_deref()
        .is_some_and(|q| !q.trim().is_empty() && search.is_none());

    let search_clone = search.clone();
    let (auth, event, occupancy, unassigned, search_results) =
        web::block(move || -> Result<_, AppError> {
            let mut store = state.store.get_facade()?;
            let auth = store.get_auth_token_for_session(&session_token, event_id)?;
            auth.check_privilege(event_id, Privilege::ShowGuestList)?;
            let event = store.get_event(&auth, event_id)?;
            let occupancy =
                OccupancyMap::new(store.get_apartment_occupancy(&auth, event_id)?);
            let unassigned = store.get_guests(
                &auth,
                event_id,
                GuestFilter::builder()
                    .unassigned()
                    .order_by_creation()
                    .build(),
            )?;
            let search_results = search_clone
                .map(|search| {
                    store.get_guests(
                        &auth,
                        event_id,
                        GuestFilter::builder()
                            .name_contains(search)
                            .limit(MAX_SEARCH_RESULTS)
                            .build(),
                    )
                })
                .transpose()?;
            Ok((auth, event, occupancy, unassigned, search_results))
        })
        .await??;

    let floor_plan = render_floor_plan(&plan.load_svg()?, &occupancy, |apartment_id| {
        req.url_for("apartment_detail", [event_id.to_string(), apartment_id.to_owned()])
            .map(|url| url.to_string())
            .unwrap_or_default()
    });

    let assign_default: FormValue<ApartmentFromList> = occupancy
        .first_assignable()
        .map(|a| ApartmentFromList(a.apartment_id.clone()).into())
        .unwrap_or_default();
    let apartment_entries: Vec<SelectEntry> = occupancy
        .iter()
        .map(|a| SelectEntry {
            value: a.apartment_id.as_str().into(),
            text: a.option_label().into(),
        })
        .collect();

    let tmpl = PlannerTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: &event.name,
            event: Some(&event),
            user: UserNavigation::for_auth_token(&auth),
        },
        event: &event,
        plan,
        floor_plan: &floor_plan,
        occupancy: &occupancy,
        unassigned: &unassigned,
        assign_default: &assign_default,
        apartment_entries: &apartment_entries,
        search: search.as_deref().or(query.q.as_deref()).unwrap_or(""),
        search_too_short,
        search_results: search_results.as_deref(),
        can_edit: !event.is_locked() && auth.has_privilege(event_id, Privilege::EditGuestList),
        can_submit: !event.is_locked()
            && auth.has_privilege(event_id, Privilege::SubmitGuestList),
    };
    Ok(Html::new(tmpl.render()?))
}

#[derive(Template)]
#[template(path = "planner.html")]
struct PlannerTemplate<'a> {
    base: BaseTemplateContext<'a>,
    event: &'a Event,
    plan: FloorPlan,
    floor_plan: &'a str,
    occupancy: &'a OccupancyMap,
    unassigned: &'a [Guest],
    assign_default: &'a FormValue<ApartmentFromList>,
    apartment_entries: &'a Vec<SelectEntry<'a>>,
    search: &'a str,
    search_too_short: bool,
    search_results: Option<&'a [Guest]>,
    can_edit: bool,
    can_submit: bool,
}

impl PlannerTemplate<'_> {
    fn plan_tabs(&self) -> [FloorPlan; 3] {
        FloorPlan::ALL
    }

    fn plan_url(&self, plan: &FloorPlan) -> Result<String, AppError> {
        let mut url = self
            .base
            .request
            .url_for("planner", [self.event.id.to_string()])?;
        url.query_pairs_mut().append_pair("plan", plan.query_value());
        Ok(url.to_string())
    }

    fn planner_url(&self) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("planner", [self.event.id.to_string()])?
            .to_string())
    }

    fn apartment_url(&self, apartment_id: &str) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(
                "apartment_detail",
                [self.event.id.to_string(), apartment_id.to_owned()],
            )?
            .to_string())
    }

    fn move_url(&self, guest: &Guest) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(
                "move_guest",
                [self.event.id.to_string(), guest.id.to_string()],
            )?
            .to_string())
    }

    fn submit_url(&self) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("submit_guest_list", [self.event.id.to_string()])?
            .to_string())
    }

    fn apartment_label(&self, guest: &Guest) -> String {
        match &guest.apartment_id {
            Some(apartment_id) => crate::occupancy::apartment_label(apartment_id),
            None => "unassigned".to_owned(),
        }
    }

    fn assign_select(&self) -> SelectTemplate<'_, ApartmentFromList> {
        SelectTemplate::new(
            self.assign_default,
            "apartment_id",
            self.apartment_entries,
            "Apartment",
            InputConfiguration::builder().size(InputSize::Small).build(),
        )
    }

    fn total_guests(&self) -> i64 {
        self.occupancy.assigned_guests() + self.unassigned.len() as i64
    }

    /// Percentage of guests with an apartment
    fn progress_percent(&self) -> i64 {
        let total = self.total_guests();
        if total == 0 {
            0
        } else {
            self.occupancy.assigned_guests() * 100 / total
        }
    }
}
