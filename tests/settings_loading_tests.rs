/// Settings loading tests
///
/// Router settings read from JSON and properties files, and the routing data
/// source built from them.
/// Run with: cargo test --test settings_loading_tests

use db_router::{DynamicDataSource, RouteSpec, RouterError, RouterSettings, ShardRouter, context};
use std::io::Write;
use tempfile::NamedTempFile;

const PROPERTIES: &str = "\
mini-db-router.jdbc.datasource.dbCount=2
mini-db-router.jdbc.datasource.tbCount=4
mini-db-router.jdbc.datasource.routerKey=userId
mini-db-router.jdbc.datasource.list=db01,db02
mini-db-router.jdbc.datasource.default=db00
mini-db-router.jdbc.datasource.db00.url=jdbc:mysql://127.0.0.1:3306/lottery?useUnicode=true
mini-db-router.jdbc.datasource.db00.username=root
mini-db-router.jdbc.datasource.db00.password=123456
mini-db-router.jdbc.datasource.db01.url=jdbc:mysql://127.0.0.1:3306/lottery_01?useUnicode=true
mini-db-router.jdbc.datasource.db01.username=root
mini-db-router.jdbc.datasource.db01.password=123456
mini-db-router.jdbc.datasource.db02.url=jdbc:mysql://127.0.0.1:3306/lottery_02?useUnicode=true
mini-db-router.jdbc.datasource.db02.username=root
mini-db-router.jdbc.datasource.db02.password=123456
";

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_properties_file() {
    let file = write_temp(".properties", PROPERTIES);
    let settings = RouterSettings::from_file(file.path()).unwrap();

    assert_eq!(settings.db_count, 2);
    assert_eq!(settings.tb_count, 4);
    assert_eq!(settings.router_key, "userId");
    assert_eq!(settings.default, "db00");
    assert_eq!(
        settings.data_source("db02").unwrap().endpoint().unwrap().database,
        "lottery_02"
    );
}

#[test]
fn test_load_json_file_round_trips_properties() {
    let from_props = RouterSettings::from_properties(PROPERTIES).unwrap();
    let json = serde_json::to_string_pretty(&from_props).unwrap();

    let file = write_temp(".json", &json);
    let from_json = RouterSettings::from_file(file.path()).unwrap();

    assert_eq!(from_json, from_props);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = RouterSettings::from_file("/definitely/not/here/router.json").unwrap_err();
    assert!(matches!(err, RouterError::Io(_)));
}

#[test]
fn test_invalid_topology_fails_at_startup() {
    let text = PROPERTIES.replace("tbCount=4", "tbCount=3");
    let file = write_temp(".properties", &text);

    let err = RouterSettings::from_file(file.path()).unwrap_err();
    assert!(matches!(err, RouterError::Config(_)));
}

#[test]
fn test_router_and_data_source_from_settings() {
    let settings = RouterSettings::from_properties(PROPERTIES).unwrap();

    let mut router = ShardRouter::from_settings(&settings).unwrap();
    router.register("lottery.IUserDao.insertUser", RouteSpec::key("userId"));

    let source = DynamicDataSource::from_settings(&settings, |name, config| {
        Ok(format!("{} -> {}", name, config.endpoint()?.database))
    })
    .unwrap();
    assert_eq!(source.target_names(), vec!["db01", "db02"]);

    let picked = router
        .call_blocking("lottery.IUserDao.insertUser", &[&"980765512"], || {
            source.current().cloned()
        })
        .unwrap();
    assert_eq!(picked, "db02 -> lottery_02");

    let unrouted = context::sync_scope(|| source.current().cloned()).unwrap();
    assert_eq!(unrouted, "db00 -> lottery");
}
