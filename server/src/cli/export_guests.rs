use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::{get_store_from_env, EventId, GuestFilter, GuestPlanStore};
use crate::export::{self, ExportFormat};
use crate::occupancy::OccupancyMap;
use std::io::Write;
use std::path::PathBuf;

/// Export the guest list of an event as CSV or HTML report, to the given file or to stdout.
pub fn export_guests(
    event_id: EventId,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(event_id, &auth_key);
    let event = data_store.get_event(&auth_token, event_id)?;
    let guests = data_store.get_guests(&auth_token, event_id, GuestFilter::default())?;

    let occupancy = OccupancyMap::new(data_store.get_apartment_occupancy(&auth_token, event_id)?);

    let content = match format {
        ExportFormat::Csv => export::guests_csv(&event, &guests, &occupancy),
        ExportFormat::Html => export::guests_report_html(&event, &guests, &occupancy)
            .map_err(|e| CliError::FileError(format!("Could not render report: {}", e)))?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, content).map_err(|e| {
                CliError::FileError(format!("Could not write {:?}: {}", path, e))
            })?;
            log::info!("Exported {} guests to {:?}", guests.len(), path);
        }
        None => {
            std::io::stdout().write_all(content.as_bytes())?;
        }
    }
    Ok(())
}
