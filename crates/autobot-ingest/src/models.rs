//! Registry feed XML structures
//!
//! One `<ns:Statistik>` excerpt describes one vehicle. Only the elements the
//! record model needs are mapped; everything else is ignored. Element names
//! are accepted with or without the `ns:` prefix.

use serde::Deserialize;

/// `<ns:Statistik>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatisticRecord {
    #[serde(rename = "KoeretoejIdent", alias = "ns:KoeretoejIdent")]
    pub ident: u64,

    /// Vehicle class code, see `VehicleType::from_feed_code`.
    #[serde(rename = "KoeretoejArtNummer", alias = "ns:KoeretoejArtNummer")]
    pub class_code: u64,

    #[serde(rename = "RegistreringNummerNummer", alias = "ns:RegistreringNummerNummer")]
    pub reg_nr: String,

    #[serde(
        rename = "KoeretoejOplysningGrundStruktur",
        alias = "ns:KoeretoejOplysningGrundStruktur"
    )]
    pub info: VehicleInfo,
}

/// `<ns:KoeretoejOplysningGrundStruktur>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VehicleInfo {
    #[serde(
        rename = "KoeretoejOplysningOprettetUdFra",
        alias = "ns:KoeretoejOplysningOprettetUdFra"
    )]
    pub source: String,

    #[serde(rename = "KoeretoejVariantTypeNavn", alias = "ns:KoeretoejVariantTypeNavn")]
    pub variant: String,

    #[serde(rename = "KoeretoejOplysningStelNummer", alias = "ns:KoeretoejOplysningStelNummer")]
    pub vin: String,

    /// Timestamp text; only the leading `YYYY-MM-DD` is used.
    #[serde(
        rename = "KoeretoejOplysningFoersteRegistreringDato",
        alias = "ns:KoeretoejOplysningFoersteRegistreringDato"
    )]
    pub first_reg_date: String,

    #[serde(rename = "KoeretoejMotorStruktur", alias = "ns:KoeretoejMotorStruktur")]
    pub engine: Engine,

    #[serde(rename = "KoeretoejBetegnelseStruktur", alias = "ns:KoeretoejBetegnelseStruktur")]
    pub designation: Designation,
}

/// `<ns:KoeretoejMotorStruktur>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Engine {
    #[serde(rename = "DrivkraftTypeStruktur", alias = "ns:DrivkraftTypeStruktur")]
    pub fuel: Fuel,
}

/// `<ns:DrivkraftTypeStruktur>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fuel {
    #[serde(rename = "DrivkraftTypeNavn", alias = "ns:DrivkraftTypeNavn")]
    pub name: String,
}

/// `<ns:KoeretoejBetegnelseStruktur>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Designation {
    #[serde(rename = "KoeretoejMaerkeTypeNavn", alias = "ns:KoeretoejMaerkeTypeNavn")]
    pub brand: String,

    #[serde(rename = "Model", alias = "ns:Model")]
    pub model: NamedType,

    #[serde(rename = "Variant", alias = "ns:Variant")]
    pub variant: NamedVariant,
}

/// `<ns:Model>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NamedType {
    #[serde(rename = "KoeretoejModelTypeNavn", alias = "ns:KoeretoejModelTypeNavn")]
    pub name: String,
}

/// `<ns:Variant>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NamedVariant {
    #[serde(rename = "KoeretoejVariantTypeNavn", alias = "ns:KoeretoejVariantTypeNavn")]
    pub name: String,
}

impl StatisticRecord {
    pub fn from_xml(excerpt: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(excerpt)
    }
}
