//! Full sync cycles from a local feed directory into the memory store

#![allow(clippy::unwrap_used, clippy::expect_used)]

use autobot_common::vehicle::{RegCountry, VehicleType};
use autobot_ingest::{FileProvider, PipelineConfig};
use autobot_server::config::SyncConfig;
use autobot_server::store::{MemoryBackend, VehicleStore};
use autobot_server::{SyncOrchestrator, SyncOutcome};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,autobot_server=debug")),
        )
        .with_test_writer()
        .try_init();
}

const BMW_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns:StatistikSamling>
  <ns:Statistik>
    <ns:KoeretoejIdent>1001</ns:KoeretoejIdent>
    <ns:KoeretoejArtNummer>1</ns:KoeretoejArtNummer>
    <ns:RegistreringNummerNummer>AB12345</ns:RegistreringNummerNummer>
    <ns:KoeretoejOplysningGrundStruktur>
      <ns:KoeretoejOplysningStelNummer>WDB1234567890</ns:KoeretoejOplysningStelNummer>
      <ns:KoeretoejOplysningFoersteRegistreringDato>2020-05-01T00:00:00.000+02:00</ns:KoeretoejOplysningFoersteRegistreringDato>
      <ns:KoeretoejBetegnelseStruktur>
        <ns:KoeretoejMaerkeTypeNavn>bmw</ns:KoeretoejMaerkeTypeNavn>
        <ns:Model><ns:KoeretoejModelTypeNavn>320d</ns:KoeretoejModelTypeNavn></ns:Model>
      </ns:KoeretoejBetegnelseStruktur>
      <ns:KoeretoejMotorStruktur>
        <ns:DrivkraftTypeStruktur><ns:DrivkraftTypeNavn>diesel</ns:DrivkraftTypeNavn></ns:DrivkraftTypeStruktur>
      </ns:KoeretoejMotorStruktur>
    </ns:KoeretoejOplysningGrundStruktur>
  </ns:Statistik>
</ns:StatistikSamling>
"#;

fn write_feed(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), BMW_FEED).unwrap();
}

fn orchestrator() -> SyncOrchestrator {
    let store = Arc::new(VehicleStore::new(
        Arc::new(MemoryBackend::new()),
        SyncConfig::default(),
    ));
    SyncOrchestrator::new(
        store,
        PipelineConfig::default()
            .with_country(RegCountry::DK)
            .with_workers(2),
    )
}

#[tokio::test]
async fn test_sync_then_up_to_date() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_feed(dir.path(), "ESStatistikListeModtag-20230101-000000.xml");
    write_feed(dir.path(), "ESStatistikListeModtag-20230102-000000.xml");

    let orchestrator = orchestrator();
    let mut provider = FileProvider::new(dir.path());

    let outcome = orchestrator.run_once(&mut provider, false).await.unwrap();
    let SyncOutcome::Synced { file, summary, stats, .. } = outcome else {
        panic!("expected a sync");
    };
    assert_eq!(file, "ESStatistikListeModtag-20230102-000000.xml");
    assert!(summary.starts_with("FS sync status"));
    assert!(summary.ends_with("synced 1 of 1 vehicles"));
    assert_eq!(stats.parsed, 1);

    let store = orchestrator.store();
    assert_eq!(store.last_synced().await.unwrap().as_deref(), Some(file.as_str()));
    let v = store
        .lookup_by_vin(RegCountry::DK, "WDB1234567890", false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v.brand, "BMW");
    assert_eq!(v.fuel_type, "Diesel");
    assert_eq!(v.vehicle_type, VehicleType::Car);
    assert_eq!(v.first_reg_date.to_string(), "2020-05-01");
    assert_eq!(v.meta.ident, 1001);

    let again = orchestrator.run_once(&mut provider, false).await.unwrap();
    assert!(matches!(again, SyncOutcome::UpToDate { known: Some(ref k) } if *k == file));
}

#[tokio::test]
async fn test_forced_resync_inserts_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    write_feed(dir.path(), "ESStatistikListeModtag-20230101-000000.xml");

    let orchestrator = orchestrator();
    let mut provider = FileProvider::new(dir.path());
    orchestrator.run_once(&mut provider, false).await.unwrap();

    let outcome = orchestrator.run_once(&mut provider, true).await.unwrap();
    let SyncOutcome::Synced { op, .. } = outcome else {
        panic!("a forced run always syncs");
    };
    let op = orchestrator.store().operation(op).unwrap();
    assert_eq!((op.processed, op.synced), (1, 0));
    assert_eq!(orchestrator.store().count_log().await.unwrap(), 2);
}

#[tokio::test]
async fn test_missing_source_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator();
    let mut provider = FileProvider::new(dir.path().join("nope"));
    assert!(orchestrator.run_once(&mut provider, false).await.is_err());
    assert!(orchestrator.store().last_synced().await.unwrap().is_none());
}
