use crate::cli::util::query_user_bool;
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::{AuthToken, GlobalAuthToken};
use crate::data_store::models::EventStatus;
use crate::data_store::{get_store_from_env, EventFilter, EventId, GuestPlanStore};

pub fn print_event_list(status: Option<EventStatus>) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let events = data_store.get_events(
        &auth_token,
        EventFilter {
            status,
            name_contains: None,
        },
    )?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "name", "status", "start", "end", "created", "submitted"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(events.into_iter().map(|event| {
            [
                event.id.to_string(),
                event.name,
                event.status.as_db_str().to_owned(),
                event
                    .start_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                event.end_date.map(|d| d.to_string()).unwrap_or_default(),
                event.created_at.format("%Y-%m-%d %H:%M").to_string(),
                event
                    .submitted_at
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ]
        }));

    println!("{table}");
    Ok(())
}

/// Change the lifecycle status of an event, after asking the user for confirmation when the
/// change re-opens a submitted or final guest list.
pub fn set_event_status(
    event_id: EventId,
    status: EventStatus,
    assume_yes: bool,
) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(event_id, &auth_key);
    let event = data_store.get_event(&auth_token, event_id)?;
    if event.status == status {
        println!("Event '{}' is already {}.", event.name, status.as_db_str());
        return Ok(());
    }

    if status == EventStatus::Draft
        && !assume_yes
        && !query_user_bool(
            &format!(
                "Re-open the {} guest list of '{}' for editing?",
                event.status.as_db_str(),
                event.name
            ),
            Some(false),
        )
    {
        return Err(CliError::Aborted);
    }

    data_store.set_event_status(&auth_token, event_id, status)?;
    log::info!(
        "Changed status of event {} from {} to {}",
        event_id,
        event.status.as_db_str(),
        status.as_db_str()
    );
    println!(
        "Status of event '{}' changed to {}.",
        event.name,
        status.as_db_str()
    );
    Ok(())
}
