//! Interactive floor plans: the embedded SVG drawings of the villa's buildings, coloured by the
//! apartments' occupancy status and linked to the apartment detail pages.
//!
//! Every shape of a plan with an id of the form `apt_…` represents the apartment with this id.
//! Only self-closing shape elements (`<rect …/>`, `<path …/>`, `<polygon …/>`, …) are recognized.

use crate::occupancy::{OccupancyMap, OccupancyStatus};
use crate::web::ui::error::AppError;
use crate::web::ui::Resources;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorPlan {
    LakehouseGround,
    LakehouseFirst,
    WoodcutterGround,
}

impl FloorPlan {
    pub const ALL: [FloorPlan; 3] = [
        Self::LakehouseGround,
        Self::LakehouseFirst,
        Self::WoodcutterGround,
    ];

    /// Value of the `plan` query parameter of the planner page
    pub fn query_value(&self) -> &'static str {
        match self {
            FloorPlan::LakehouseGround => "lake0",
            FloorPlan::LakehouseFirst => "lake1",
            FloorPlan::WoodcutterGround => "wc",
        }
    }

    pub fn from_query_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.query_value() == value)
    }

    pub fn title(&self) -> &'static str {
        match self {
            FloorPlan::LakehouseGround => "Lakehouse · ground floor",
            FloorPlan::LakehouseFirst => "Lakehouse · first floor",
            FloorPlan::WoodcutterGround => "Woodcutter's House",
        }
    }

    fn resource_path(&self) -> &'static str {
        match self {
            FloorPlan::LakehouseGround => "plans/lakehouse_0floor.svg",
            FloorPlan::LakehouseFirst => "plans/lakehouse_1floor.svg",
            FloorPlan::WoodcutterGround => "plans/woodcutter_0floor.svg",
        }
    }

    /// Load the plan's SVG source from the embedded static resources
    pub fn load_svg(&self) -> Result<String, AppError> {
        let file = Resources::get(self.resource_path()).ok_or_else(|| {
            AppError::InternalError(format!("Floor plan {} is missing", self.resource_path()))
        })?;
        String::from_utf8(file.data.into_owned()).map_err(|e| {
            AppError::InternalError(format!(
                "Floor plan {} is not valid UTF-8: {}",
                self.resource_path(),
                e
            ))
        })
    }
}

const PLAN_STYLE: &str = "<style>\
.apartment{stroke:#4a4a4a;stroke-width:2;cursor:pointer}\
.apartment.free{fill:#cfe8cf}\
.apartment.partial{fill:#f8e1a0}\
.apartment.full{fill:#f0a8a8}\
a:hover .apartment,a:focus .apartment{stroke:#1d3557;stroke-width:4}\
</style>";

lazy_static! {
    static ref SVG_OPEN_TAG: Regex = Regex::new(r"<svg\b[^>]*>").unwrap();
    static ref APARTMENT_SHAPE: Regex = Regex::new(
        r#"<(rect|path|polygon|polyline|circle|ellipse)\b([^>]*?)\sid="(apt_[A-Za-z0-9_-]+)"([^>]*?)\s*/>"#
    )
    .unwrap();
    static ref CLASS_ATTRIBUTE: Regex = Regex::new(r#"\sclass="([^"]*)""#).unwrap();
}

/// Colour the apartments of the plan's SVG source by their occupancy status and link them.
///
/// `apartment_url` generates the link target for an apartment id. Apartments without occupancy
/// information are shown as free.
pub fn render_floor_plan(
    svg: &str,
    occupancy: &OccupancyMap,
    apartment_url: impl Fn(&str) -> String,
) -> String {
    let svg = APARTMENT_SHAPE.replace_all(svg, |caps: &Captures| {
        let element = &caps[1];
        let apartment_id = &caps[3];
        let status = occupancy.status_of(apartment_id);
        let attributes = with_status_class(&format!("{}{}", &caps[2], &caps[4]), status);
        let title = match occupancy.get(apartment_id) {
            Some(a) => format!(
                "{} · {}/{} · {}",
                a.label(),
                a.guests_count,
                a.capacity,
                status.name()
            ),
            None => crate::occupancy::apartment_label(apartment_id),
        };
        format!(
            r#"<a href="{}"><title>{}</title><{} id="{}"{}/></a>"#,
            escape_xml(&apartment_url(apartment_id)),
            escape_xml(&title),
            element,
            apartment_id,
            attributes
        )
    });
    match SVG_OPEN_TAG.find(&svg) {
        Some(m) => format!("{}{}{}", &svg[..m.end()], PLAN_STYLE, &svg[m.end()..]),
        None => svg.into_owned(),
    }
}

/// Add the `apartment <status>` classes to the element attributes, keeping existing classes.
fn with_status_class(attributes: &str, status: OccupancyStatus) -> String {
    let classes = format!("apartment {}", status.css_class());
    if CLASS_ATTRIBUTE.is_match(attributes) {
        CLASS_ATTRIBUTE
            .replace(attributes, |caps: &Captures| {
                format!(r#" class="{} {}""#, &caps[1], classes)
            })
            .into_owned()
    } else {
        format!(r#"{} class="{}""#, attributes, classes)
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::models::ApartmentOccupancy;

    fn occupancy_map() -> OccupancyMap {
        OccupancyMap::new(vec![
            ApartmentOccupancy {
                event_id: uuid::Uuid::nil(),
                apartment_id: "apt_1".to_owned(),
                capacity: 2,
                guests_count: 2,
                structure: "Lakehouse".to_owned(),
                floor: 0,
            },
            ApartmentOccupancy {
                event_id: uuid::Uuid::nil(),
                apartment_id: "apt_2".to_owned(),
                capacity: 4,
                guests_count: 1,
                structure: "Lakehouse".to_owned(),
                floor: 0,
            },
        ])
    }

    #[test]
    fn test_render_floor_plan() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50"><rect id="apt_1" x="0" y="0" width="50" height="50"/><rect x="50" id="apt_2" class="wing" width="50" height="50" /><path id="apt_9" d="M0 0"/><text x="5" y="5">Lake</text></svg>"#;
        let result = render_floor_plan(svg, &occupancy_map(), |id| format!("/apartments/{}", id));

        assert!(result.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50"><style>"#));
        assert!(result.contains(
            r#"<a href="/apartments/apt_1"><title>Apartment 1 · 2/2 · Full</title><rect id="apt_1" x="0" y="0" width="50" height="50" class="apartment full"/></a>"#
        ));
        assert!(result.contains(r#"class="wing apartment partial""#));
        // Unknown apartments are shown as free
        assert!(result.contains(r#"<path id="apt_9" d="M0 0" class="apartment free"/>"#));
        assert!(result.contains(r#"<text x="5" y="5">Lake</text>"#));
    }

    #[test]
    fn test_plan_query_values() {
        for plan in FloorPlan::ALL {
            assert_eq!(FloorPlan::from_query_value(plan.query_value()), Some(plan));
        }
        assert_eq!(FloorPlan::from_query_value("attic"), None);
    }

    #[test]
    fn test_embedded_plans_contain_apartments() {
        for plan in FloorPlan::ALL {
            let svg = plan.load_svg().unwrap();
            assert!(APARTMENT_SHAPE.is_match(&svg), "{:?} has no apartments", plan);
        }
    }
}
