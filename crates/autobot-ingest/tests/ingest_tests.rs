//! End-to-end ingestion from a zipped feed file on disk

#![allow(clippy::unwrap_used, clippy::expect_used)]

use autobot_common::vehicle::{RegCountry, VehicleType};
use autobot_ingest::{DataProvider, FileProvider, IngestPipeline, PipelineConfig};
use std::io::Write;
use tracing_subscriber::{fmt, EnvFilter};
use zip::write::SimpleFileOptions;

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,autobot_ingest=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn excerpt(ident: u64, class: u64, reg_nr: &str, date: &str) -> String {
    format!(
        r#"  <ns:Statistik>
    <ns:KoeretoejIdent>{ident}</ns:KoeretoejIdent>
    <ns:KoeretoejArtNummer>{class}</ns:KoeretoejArtNummer>
    <ns:RegistreringNummerNummer>{reg_nr}</ns:RegistreringNummerNummer>
    <ns:KoeretoejOplysningGrundStruktur>
      <ns:KoeretoejOplysningStelNummer>VIN{ident:08}</ns:KoeretoejOplysningStelNummer>
      <ns:KoeretoejOplysningFoersteRegistreringDato>{date}</ns:KoeretoejOplysningFoersteRegistreringDato>
      <ns:KoeretoejBetegnelseStruktur>
        <ns:KoeretoejMaerkeTypeNavn>VOLVO</ns:KoeretoejMaerkeTypeNavn>
        <ns:Model><ns:KoeretoejModelTypeNavn>V70</ns:KoeretoejModelTypeNavn></ns:Model>
      </ns:KoeretoejBetegnelseStruktur>
      <ns:KoeretoejMotorStruktur>
        <ns:DrivkraftTypeStruktur><ns:DrivkraftTypeNavn>BENZIN</ns:DrivkraftTypeNavn></ns:DrivkraftTypeStruktur>
      </ns:KoeretoejMotorStruktur>
    </ns:KoeretoejOplysningGrundStruktur>
  </ns:Statistik>
"#
    )
}

fn write_zip(path: &std::path::Path, member: &str, body: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer.start_file(member, SimpleFileOptions::default()).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.finish().unwrap();
}

#[tokio::test]
async fn test_newest_zip_is_ingested() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let mut body = String::from("<?xml version=\"1.0\"?>\n<ns:StatistikSamling>\n");
    body.push_str(&excerpt(1, 1, "AB11111", "2015-03-02T00:00:00.000+01:00"));
    body.push_str(&excerpt(2, 3, "CD22222", "2016-04-03T00:00:00.000+01:00"));
    body.push_str(&excerpt(3, 99, "EF33333", "2017-05-04T00:00:00.000+01:00"));
    body.push_str(&excerpt(4, 1, "GH44444", "garbage"));
    body.push_str("</ns:StatistikSamling>\n");

    write_zip(&dir.path().join("ESStatistikListeModtag-20230101-010000.zip"), "old.xml", "");
    write_zip(&dir.path().join("ESStatistikListeModtag-20230108-010000.zip"), "new.xml", &body);

    let mut provider = FileProvider::new(dir.path());
    provider.open().await.unwrap();
    let name = provider
        .check_for_latest("ESStatistikListeModtag-20230101-010000.zip")
        .await
        .unwrap()
        .expect("a newer file");
    assert_eq!(name, "ESStatistikListeModtag-20230108-010000.zip");

    let stream = provider.provide(&name).await.unwrap();
    let pipeline = IngestPipeline::new(
        PipelineConfig::default()
            .with_country(RegCountry::DK)
            .with_workers(3),
    );
    let mut handle = pipeline.ingest(stream);

    let mut vehicles = Vec::new();
    while let Some(v) = handle.records.recv().await {
        vehicles.push(v);
    }
    let stats = handle.done.await.unwrap().unwrap();

    assert_eq!(stats.excerpts, 4);
    assert_eq!(stats.parsed, 2);
    assert_eq!(stats.filtered, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.workers, 3);

    vehicles.sort_by_key(|v| v.meta.ident);
    assert_eq!(vehicles[0].vehicle_type, VehicleType::Car);
    assert_eq!(vehicles[0].brand, "Volvo");
    assert_eq!(vehicles[0].fuel_type, "Benzin");
    assert_eq!(vehicles[1].vehicle_type, VehicleType::Truck);
    assert_eq!(vehicles[1].reg_nr, "CD22222");
    assert!(vehicles.iter().all(|v| v.meta.hash != 0));
}

#[tokio::test]
async fn test_nothing_newer_than_known_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("X-20230101-000000.zip"), "a.xml", "");

    let mut provider = FileProvider::new(dir.path());
    provider.open().await.unwrap();
    assert_eq!(
        provider.check_for_latest("X-20230101-000000.zip").await.unwrap(),
        None
    );
}
