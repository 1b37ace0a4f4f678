use std::collections::BTreeMap;

use serde::Serialize;

use crate::ids::{AttributeId, DataElementId};
use crate::payload::Coordinate;

pub const ORG_UNIT: &str = "orgUnit";
pub const EVENT_ORG_UNIT: &str = "eventOrgUnit";
pub const PROGRAM_DATE: &str = "programDate";
pub const EVENT_DATE: &str = "eventDate";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// One input row split into its three column groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedRow {
    /// Known keys such as `orgUnit` or `eventDate`.
    pub parameters: BTreeMap<String, String>,
    pub attributes: BTreeMap<AttributeId, String>,
    pub data_elements: BTreeMap<DataElementId, String>,
}

impl ClassifiedRow {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn org_unit(&self) -> Option<&str> {
        self.parameter(ORG_UNIT)
    }

    /// The org unit events are recorded against: `eventOrgUnit` when set,
    /// otherwise `orgUnit`.
    pub fn event_org_unit(&self) -> Option<&str> {
        self.parameter(EVENT_ORG_UNIT)
            .filter(|value| !value.is_empty())
            .or_else(|| self.org_unit())
    }

    pub fn program_date(&self) -> Option<&str> {
        self.parameter(PROGRAM_DATE)
    }

    pub fn event_date(&self) -> Option<&str> {
        self.parameter(EVENT_DATE)
    }

    /// Event coordinate, present only when both latitude and longitude are
    /// set and numeric.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let latitude = self.parameter(LATITUDE)?.trim().parse().ok()?;
        let longitude = self.parameter(LONGITUDE)?.trim().parse().ok()?;
        Some(Coordinate {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> ClassifiedRow {
        ClassifiedRow {
            parameters: pairs
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
            ..ClassifiedRow::default()
        }
    }

    #[test]
    fn event_org_unit_falls_back_to_org_unit() {
        let plain = row(&[(ORG_UNIT, "OU1")]);
        assert_eq!(plain.event_org_unit(), Some("OU1"));

        let blank = row(&[(ORG_UNIT, "OU1"), (EVENT_ORG_UNIT, "")]);
        assert_eq!(blank.event_org_unit(), Some("OU1"));

        let explicit = row(&[(ORG_UNIT, "OU1"), (EVENT_ORG_UNIT, "OU2")]);
        assert_eq!(explicit.event_org_unit(), Some("OU2"));
    }

    #[test]
    fn coordinate_requires_both_parts() {
        assert_eq!(row(&[(LATITUDE, "1.5")]).coordinate(), None);
        assert_eq!(row(&[(LATITUDE, "1.5"), (LONGITUDE, "")]).coordinate(), None);
        assert_eq!(
            row(&[(LATITUDE, "1.5"), (LONGITUDE, "-2.25")]).coordinate(),
            Some(Coordinate {
                latitude: 1.5,
                longitude: -2.25
            })
        );
    }
}
