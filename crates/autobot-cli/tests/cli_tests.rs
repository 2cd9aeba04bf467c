//! End-to-end runs of the `autobot` binary

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const FEED: &str = r#"<ns:StatistikSamling>
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

fn autobot() -> Command {
    let mut cmd = Command::cargo_bin("autobot").unwrap();
    cmd.env_remove("AUTOBOT_CONFIG");
    cmd
}

fn memory_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        r#"
[providers.DMR]
country = "DK"

[store]
backend = "memory"
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_version() {
    autobot()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("autobot-cli"));
}

#[test]
fn test_init_writes_template_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    autobot()
        .args(["init", "-c"])
        .arg(&path)
        .assert()
        .success();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[providers.DMR]"));

    autobot()
        .args(["init", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: "));
}

#[test]
fn test_missing_config_suggests_init() {
    let dir = tempfile::tempdir().unwrap();
    autobot()
        .args(["status", "-c"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("autobot init"));
}

#[test]
fn test_sync_local_feed() {
    let dir = tempfile::tempdir().unwrap();
    let config = memory_config(dir.path());
    let feeds = dir.path().join("feeds");
    std::fs::create_dir(&feeds).unwrap();
    std::fs::write(feeds.join("ESStatistikListeModtag-20230102-000000.xml"), FEED).unwrap();

    autobot()
        .args(["sync", "--provider", "dmr", "-c"])
        .arg(&config)
        .arg("--source-file")
        .arg(&feeds)
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced ESStatistikListeModtag-20230102-000000.xml"))
        .stdout(predicate::str::contains("synced 1 of 1 vehicles"));
}

#[test]
fn test_unknown_provider() {
    let dir = tempfile::tempdir().unwrap();
    let config = memory_config(dir.path());
    autobot()
        .args(["sync", "--provider", "NOPE", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown provider 'NOPE'"));
}
