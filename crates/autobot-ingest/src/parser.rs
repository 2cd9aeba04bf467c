//! Excerpt to [`Vehicle`] conversion

use crate::error::{IngestError, Result};
use crate::models::StatisticRecord;
use autobot_common::vehicle::{pretty_brand_name, pretty_fuel_type, RegCountry, Vehicle, VehicleType};
use chrono::{NaiveDate, Utc};

/// Why a well-formed excerpt did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// First-registration date missing or not `YYYY-MM-DD`.
    InvalidDate { ident: u64, raw: String },
    /// Vehicle class outside the configured allow-list.
    FilteredType { ident: u64, vehicle_type: VehicleType },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Box<Vehicle>),
    Skipped(SkipReason),
}

/// Decodes excerpts for one registration country.
#[derive(Debug, Clone)]
pub struct ExcerptParser {
    country: RegCountry,
    allowed: Vec<VehicleType>,
}

impl ExcerptParser {
    pub fn new(country: RegCountry, allowed: Vec<VehicleType>) -> Self {
        Self { country, allowed }
    }

    /// Decode one excerpt.
    ///
    /// Structural XML errors are returned as [`IngestError::MalformedExcerpt`];
    /// `index` is the excerpt's position in the stream and only used for the
    /// error message.
    pub fn parse(&self, index: u64, excerpt: &str) -> Result<ParseOutcome> {
        let stat = StatisticRecord::from_xml(excerpt)
            .map_err(|e| IngestError::malformed(index, e.to_string()))?;

        let vehicle_type = VehicleType::from_feed_code(stat.class_code);
        if vehicle_type == VehicleType::Unknown || !self.allowed.contains(&vehicle_type) {
            return Ok(ParseOutcome::Skipped(SkipReason::FilteredType {
                ident: stat.ident,
                vehicle_type,
            }));
        }

        let raw_date = stat.info.first_reg_date.trim();
        let Some(first_reg_date) = parse_reg_date(raw_date) else {
            return Ok(ParseOutcome::Skipped(SkipReason::InvalidDate {
                ident: stat.ident,
                raw: raw_date.to_string(),
            }));
        };

        let designation = &stat.info.designation;
        let variant = if stat.info.variant.trim().is_empty() {
            designation.variant.name.trim()
        } else {
            stat.info.variant.trim()
        };

        let mut vehicle = Vehicle::new(vehicle_type, self.country);
        vehicle.meta.source = stat.info.source.trim().to_string();
        vehicle.meta.ident = stat.ident;
        vehicle.meta.last_updated = Utc::now();
        vehicle.reg_nr = stat.reg_nr.trim().to_uppercase();
        vehicle.vin = stat.info.vin.trim().to_uppercase();
        vehicle.brand = pretty_brand_name(&designation.brand);
        vehicle.model = designation.model.name.trim().to_string();
        vehicle.variant = variant.to_string();
        vehicle.fuel_type = pretty_fuel_type(&stat.info.engine.fuel.name);
        vehicle.first_reg_date = first_reg_date;
        vehicle.rehash();

        Ok(ParseOutcome::Parsed(Box::new(vehicle)))
    }
}

fn parse_reg_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn excerpt(class: u64, date: &str) -> String {
        format!(
            r#"<ns:Statistik>
<ns:KoeretoejIdent>1001</ns:KoeretoejIdent>
<ns:KoeretoejArtNummer>{class}</ns:KoeretoejArtNummer>
<ns:KoeretoejArtNavn>Personbil</ns:KoeretoejArtNavn>
<ns:RegistreringNummerNummer>ab12345</ns:RegistreringNummerNummer>
<ns:KoeretoejOplysningGrundStruktur>
<ns:KoeretoejOplysningOprettetUdFra>DMR</ns:KoeretoejOplysningOprettetUdFra>
<ns:KoeretoejOplysningStelNummer>wdb1234567890</ns:KoeretoejOplysningStelNummer>
<ns:KoeretoejOplysningFoersteRegistreringDato>{date}</ns:KoeretoejOplysningFoersteRegistreringDato>
<ns:KoeretoejBetegnelseStruktur>
<ns:KoeretoejMaerkeTypeNavn>bmw</ns:KoeretoejMaerkeTypeNavn>
<ns:Model><ns:KoeretoejModelTypeNavn>320d</ns:KoeretoejModelTypeNavn></ns:Model>
<ns:Variant><ns:KoeretoejVariantTypeNavn>Touring</ns:KoeretoejVariantTypeNavn></ns:Variant>
</ns:KoeretoejBetegnelseStruktur>
<ns:KoeretoejMotorStruktur>
<ns:DrivkraftTypeStruktur><ns:DrivkraftTypeNavn>diesel</ns:DrivkraftTypeNavn></ns:DrivkraftTypeStruktur>
</ns:KoeretoejMotorStruktur>
</ns:KoeretoejOplysningGrundStruktur>
</ns:Statistik>"#
        )
    }

    fn parser() -> ExcerptParser {
        ExcerptParser::new(RegCountry::DK, VehicleType::KNOWN.to_vec())
    }

    #[test]
    fn test_parse_normalizes_fields() {
        let outcome = parser().parse(0, &excerpt(1, "2020-05-01T00:00:00.000+01:00")).unwrap();
        let ParseOutcome::Parsed(v) = outcome else {
            panic!("expected a record, got {:?}", outcome);
        };
        assert_eq!(v.meta.ident, 1001);
        assert_eq!(v.meta.source, "DMR");
        assert_eq!(v.meta.country, RegCountry::DK);
        assert_eq!(v.vehicle_type, VehicleType::Car);
        assert_eq!(v.reg_nr, "AB12345");
        assert_eq!(v.vin, "WDB1234567890");
        assert_eq!(v.brand, "BMW");
        assert_eq!(v.model, "320d");
        assert_eq!(v.variant, "Touring");
        assert_eq!(v.fuel_type, "Diesel");
        assert_eq!(v.first_reg_date, NaiveDate::from_ymd_opt(2020, 5, 1).unwrap());
        assert_ne!(v.meta.hash, 0);
    }

    #[test]
    fn test_bad_date_is_skipped() {
        let outcome = parser().parse(0, &excerpt(1, "05/01/2020")).unwrap();
        assert!(matches!(
            outcome,
            ParseOutcome::Skipped(SkipReason::InvalidDate { ident: 1001, .. })
        ));
    }

    #[test]
    fn test_types_outside_allow_list_are_filtered() {
        let cars_only = ExcerptParser::new(RegCountry::DK, vec![VehicleType::Car]);
        let outcome = cars_only.parse(0, &excerpt(3, "2020-05-01")).unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Skipped(SkipReason::FilteredType {
                ident: 1001,
                vehicle_type: VehicleType::Truck
            })
        );

        let unknown = parser().parse(0, &excerpt(77, "2020-05-01")).unwrap();
        assert!(matches!(unknown, ParseOutcome::Skipped(SkipReason::FilteredType { .. })));
    }

    #[test]
    fn test_broken_xml_is_malformed() {
        let err = parser()
            .parse(4, "<ns:Statistik><ns:KoeretoejIdent>abc</ns:KoeretoejIdent></ns:Statistik>")
            .unwrap_err();
        assert!(matches!(err, IngestError::MalformedExcerpt { index: 4, .. }));
    }
}
