//! Export of an event's guest list as CSV file or as printable HTML report

use crate::data_store::models::{ApartmentOccupancy, ArrivalMode, Event, Guest, GuestType};
use crate::data_store::EventId;
use crate::occupancy::OccupancyMap;
use askama::Template;

/// Apartment label of guests without an apartment in the CSV export
pub const UNASSIGNED_LABEL: &str = "UNASSIGNED";

const CSV_HEADER: [&str; 17] = [
    "event_id",
    "event_name",
    "event_status",
    "structure",
    "floor",
    "apartment_id",
    "apartment_label",
    "first_name",
    "last_name",
    "guest_type",
    "child_age",
    "arrival_mode",
    "checkin_date",
    "checkout_date",
    "extra_nights",
    "allergies",
    "notes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Html,
}

pub fn csv_filename(event_id: EventId) -> String {
    format!("event_{}_guests.csv", event_id)
}

pub fn report_filename(event_id: EventId) -> String {
    format!("event_{}_report.html", event_id)
}

fn sorted_by_name<'a>(guests: impl IntoIterator<Item = &'a Guest>) -> Vec<&'a Guest> {
    let mut result: Vec<&Guest> = guests.into_iter().collect();
    result.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
    result
}

fn sorted_by_apartment_and_name<'a>(
    guests: impl IntoIterator<Item = &'a Guest>,
) -> Vec<&'a Guest> {
    let mut result = sorted_by_name(guests);
    result.sort_by(|a, b| a.apartment_id.cmp(&b.apartment_id));
    result
}

/// Quote a CSV cell, doubling any quote characters in the value.
fn csv_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn guest_type_str(guest_type: GuestType) -> &'static str {
    guest_type.as_db_str()
}

fn arrival_mode_str(arrival_mode: Option<ArrivalMode>) -> &'static str {
    arrival_mode.map(|m| m.as_db_str()).unwrap_or("")
}

/// Generate the CSV export of the guest list: a header row and exactly one row per guest, ordered
/// by last name.
pub fn guests_csv(event: &Event, guests: &[Guest], occupancy: &OccupancyMap) -> String {
    let mut result = CSV_HEADER
        .iter()
        .map(|h| csv_cell(h))
        .collect::<Vec<_>>()
        .join(",");
    result.push('\n');

    for guest in sorted_by_name(guests) {
        let apartment = guest
            .apartment_id
            .as_deref()
            .and_then(|apartment_id| occupancy.get(apartment_id));
        let apartment_label = match (&guest.apartment_id, apartment) {
            (Some(_), Some(a)) => a.label(),
            (Some(apartment_id), None) => crate::occupancy::apartment_label(apartment_id),
            (None, _) => UNASSIGNED_LABEL.to_owned(),
        };
        let row = [
            event.id.to_string(),
            event.name.clone(),
            event.status.as_db_str().to_owned(),
            apartment.map(|a| a.structure.clone()).unwrap_or_default(),
            apartment.map(|a| a.floor.to_string()).unwrap_or_default(),
            guest.apartment_id.clone().unwrap_or_default(),
            apartment_label,
            guest.first_name.clone(),
            guest.last_name.clone(),
            guest_type_str(guest.guest_type).to_owned(),
            guest.child_age.map(|a| a.to_string()).unwrap_or_default(),
            arrival_mode_str(guest.arrival_mode).to_owned(),
            guest
                .checkin_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            guest
                .checkout_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            guest.extra_nights.to_string(),
            guest.allergies.clone().unwrap_or_default(),
            guest.notes.clone().unwrap_or_default(),
        ];
        result.push_str(
            &row.iter()
                .map(|cell| csv_cell(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
        result.push('\n');
    }
    result
}

struct ReportSection<'a> {
    apartment: &'a ApartmentOccupancy,
    guests: Vec<&'a Guest>,
}

#[derive(Template)]
#[template(path = "export_report.html")]
struct GuestReportTemplate<'a> {
    event: &'a Event,
    total_guests: usize,
    sections: Vec<ReportSection<'a>>,
    /// Guests assigned to an apartment without occupancy information
    unknown_apartment: Vec<&'a Guest>,
    unassigned: Vec<&'a Guest>,
    generated_at: String,
}

impl GuestReportTemplate<'_> {
    fn child_age(&self, guest: &Guest) -> String {
        guest.child_age.map(|a| a.to_string()).unwrap_or_default()
    }

    fn arrival_mode(&self, guest: &Guest) -> &'static str {
        arrival_mode_str(guest.arrival_mode)
    }

    fn date(&self, date: &Option<chrono::NaiveDate>) -> String {
        date.map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_default()
    }

    fn unknown_apartment_labels(&self) -> String {
        let mut labels: Vec<String> = self
            .unknown_apartment
            .iter()
            .filter_map(|g| g.apartment_id.as_deref())
            .map(crate::occupancy::apartment_label)
            .collect();
        labels.dedup();
        labels.join(", ")
    }
}

/// Render the printable HTML report of the guest list: one section per apartment (in apartment
/// order), a section with guests of apartments missing in the occupancy information (if any) and
/// a final section with all unassigned guests.
pub fn guests_report_html(
    event: &Event,
    guests: &[Guest],
    occupancy: &OccupancyMap,
) -> askama::Result<String> {
    let sections = occupancy
        .iter()
        .map(|apartment| ReportSection {
            apartment,
            guests: sorted_by_name(
                guests
                    .iter()
                    .filter(|g| g.apartment_id.as_deref() == Some(&apartment.apartment_id)),
            ),
        })
        .collect();
    let tmpl = GuestReportTemplate {
        event,
        total_guests: guests.len(),
        sections,
        unknown_apartment: sorted_by_apartment_and_name(guests.iter().filter(|g| {
            g.apartment_id
                .as_deref()
                .is_some_and(|apartment_id| occupancy.get(apartment_id).is_none())
        })),
        unassigned: sorted_by_name(guests.iter().filter(|g| g.apartment_id.is_none())),
        generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
    };
    tmpl.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::models::EventStatus;
    use uuid::Uuid;

    fn event() -> Event {
        Event {
            id: Uuid::now_v7(),
            name: "Anna & Marco".to_owned(),
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 6, 12),
            end_date: chrono::NaiveDate::from_ymd_opt(2026, 6, 14),
            status: EventStatus::Submitted,
            created_at: chrono::Utc::now(),
            created_by: Uuid::now_v7(),
            submitted_at: None,
            submitted_by: None,
        }
    }

    fn guest(event_id: EventId, first: &str, last: &str, apartment: Option<&str>) -> Guest {
        Guest {
            id: Uuid::now_v7(),
            event_id,
            apartment_id: apartment.map(|a| a.to_owned()),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            guest_type: GuestType::Adult,
            child_age: None,
            arrival_mode: None,
            checkin_date: None,
            checkout_date: None,
            extra_nights: 0,
            allergies: None,
            notes: None,
            created_at: chrono::Utc::now(),
        }
    }

    fn occupancy(event_id: EventId) -> OccupancyMap {
        OccupancyMap::new(vec![
            ApartmentOccupancy {
                event_id,
                apartment_id: "apt_2".to_owned(),
                capacity: 4,
                guests_count: 1,
                structure: "Lakehouse".to_owned(),
                floor: 0,
            },
            ApartmentOccupancy {
                event_id,
                apartment_id: "apt_wc".to_owned(),
                capacity: 6,
                guests_count: 0,
                structure: "Woodcutter".to_owned(),
                floor: 0,
            },
        ])
    }

    #[test]
    fn test_csv_one_row_per_guest() {
        let event = event();
        let mut child = guest(event.id, "Luca", "Bianchi", Some("apt_2"));
        child.guest_type = GuestType::Child;
        child.child_age = Some(7);
        child.arrival_mode = Some(ArrivalMode::Transfer);
        child.checkin_date = chrono::NaiveDate::from_ymd_opt(2026, 6, 11);
        child.extra_nights = 1;
        child.allergies = Some("nuts, \"all kinds\"".to_owned());
        let guests = vec![guest(event.id, "Anna", "Rossi", None), child];

        let csv = guests_csv(&event, &guests, &occupancy(event.id));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("\"event_id\",\"event_name\",\"event_status\""));
        assert!(csv.ends_with('\n'));

        // Ordered by last name
        assert_eq!(
            lines[1],
            format!(
                "\"{}\",\"Anna & Marco\",\"submitted\",\"Lakehouse\",\"0\",\"apt_2\",\"Apartment 2\",\
                 \"Luca\",\"Bianchi\",\"child\",\"7\",\"transfer\",\"2026-06-11\",\"\",\"1\",\
                 \"nuts, \"\"all kinds\"\"\",\"\"",
                event.id
            )
        );
        assert!(lines[2].contains("\"\",\"\",\"\",\"UNASSIGNED\",\"Anna\",\"Rossi\",\"adult\""));
    }

    #[test]
    fn test_csv_without_guests() {
        let event = event();
        let csv = guests_csv(&event, &[], &occupancy(event.id));
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_html_report_sections_and_escaping() {
        let event = event();
        let mut guests = vec![
            guest(event.id, "Anna", "Rossi", Some("apt_2")),
            guest(event.id, "Eve", "<script>alert(1)</script>", None),
        ];
        guests[0].notes = Some("Vegan & gluten-free".to_owned());

        let html = guests_report_html(&event, &guests, &occupancy(event.id)).unwrap();
        assert!(html.contains("Anna &#38; Marco") || html.contains("Anna &amp; Marco"));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&#60;script&#62;") || html.contains("&lt;script&gt;"));
        assert_eq!(html.matches("class=\"apartment-section\"").count(), 2);
        assert!(html.contains("Apartment 2"));
        assert!(html.contains("Woodcutter's House") || html.contains("Woodcutter&#39;s House"));
        assert!(html.contains("1/4"));
        assert!(html.contains("class=\"unassigned-section\""));
    }

    #[test]
    fn test_html_report_without_unassigned_guests() {
        let event = event();
        let guests = vec![guest(event.id, "Anna", "Rossi", Some("apt_2"))];
        let html = guests_report_html(&event, &guests, &occupancy(event.id)).unwrap();
        assert!(!html.contains("class=\"unassigned-section\""));
    }

    #[test]
    fn test_html_report_guest_in_apartment_without_occupancy() {
        let event = event();
        let guests = vec![
            guest(event.id, "Anna", "Rossi", Some("apt_2")),
            guest(event.id, "Paolo", "Ricci", Some("apt_7")),
        ];
        let html = guests_report_html(&event, &guests, &occupancy(event.id)).unwrap();
        assert!(html.contains("class=\"unknown-apartment-section\""));
        assert!(html.contains("Other apartments: Apartment 7"));
        assert!(html.contains("Ricci"));
        assert!(!html.contains("class=\"unassigned-section\""));

        let guests = vec![guest(event.id, "Anna", "Rossi", Some("apt_2"))];
        let html = guests_report_html(&event, &guests, &occupancy(event.id)).unwrap();
        assert!(!html.contains("class=\"unknown-apartment-section\""));
    }

    #[test]
    fn test_filenames() {
        let id = Uuid::nil();
        assert_eq!(
            csv_filename(id),
            "event_00000000-0000-0000-0000-000000000000_guests.csv"
        );
        assert_eq!(
            report_filename(id),
            "event_00000000-0000-0000-0000-000000000000_report.html"
        );
    }
}
