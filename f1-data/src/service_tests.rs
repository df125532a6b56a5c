//! Tests for the cached fetch service against the mock data source.

use super::*;
use crate::cache::ManualClock;
use crate::error::{ErrorKind, or_empty};
use crate::layouts::test_collection;
use crate::mock::{MockCall, MockF1Source};
use crate::openf1::{MeetingDto, SessionDto};
use crate::session::{Lap, Laps};

const HOUR: Duration = Duration::from_secs(3600);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mock_service(mock: MockF1Source) -> (F1DataService, Arc<MockF1Source>, Arc<ManualClock>) {
    init_tracing();
    let mock = Arc::new(mock);
    let clock = Arc::new(ManualClock::new());
    let service = F1DataService::with_clock(
        mock.clone(),
        mock.clone(),
        mock.clone(),
        &ServiceConfig::default(),
        clock.clone(),
    );
    (service, mock, clock)
}

fn meeting(name: &str, location: &str, country: &str, meeting_name: &str) -> MeetingDto {
    MeetingDto {
        circuit_short_name: name.to_string(),
        location: location.to_string(),
        country_name: country.to_string(),
        meeting_name: meeting_name.to_string(),
        meeting_key: None,
        year: Some(2024),
    }
}

fn session_dto(name: &str) -> SessionDto {
    serde_json::from_value(serde_json::json!({ "session_name": name })).unwrap()
}

fn lap(driver: &str, lap_number: u32, millis: u64) -> Lap {
    Lap {
        driver: driver.to_string(),
        driver_number: 0,
        lap_number,
        lap_time: Some(Duration::from_millis(millis)),
        date_start: None,
        is_pit_out_lap: false,
        compound: None,
        stint: None,
    }
}

fn monza_race(laps: Vec<Lap>) -> Session {
    Session {
        key: SessionKey::new(2024, "Monza", SessionType::Race),
        provider_id: 9590,
        location: Some("Monza".to_string()),
        country_name: Some("Italy".to_string()),
        date_start: None,
        laps: Laps::new(laps),
        drivers: Vec::new(),
        stints: Vec::new(),
        weather: Vec::new(),
    }
}

#[tokio::test]
async fn empty_year_gives_empty_circuit_table() {
    let (service, _mock, _clock) = mock_service(MockF1Source::new());
    let table = service.get_circuits_for_year(1949).await.unwrap();
    assert!(table.is_empty());
    assert_eq!(
        table.columns(),
        &["name", "location", "country_name", "meeting_name"]
    );
}

#[tokio::test]
async fn monza_meeting_becomes_one_row() {
    let mock = MockF1Source::new().with_meetings(
        2024,
        vec![meeting("Monza", "Monza", "Italy", "Italian GP")],
    );
    let (service, _mock, _clock) = mock_service(mock);

    let table = service.get_circuits_for_year(2024).await.unwrap();
    assert_eq!(table.len(), 1);
    let row = &table.rows()[0];
    assert_eq!(row.name, "Monza");
    assert_eq!(row.location, "Monza");
    assert_eq!(row.country_name, "Italy");
    assert_eq!(row.meeting_name, "Italian GP");
}

#[tokio::test]
async fn circuits_are_deduplicated() {
    let mock = MockF1Source::new().with_meetings(
        2024,
        vec![
            meeting("Sakhir", "Sakhir", "Bahrain", "Pre-Season Testing"),
            meeting("Sakhir", "Sakhir", "Bahrain", "Bahrain Grand Prix"),
            meeting("Jeddah", "Jeddah", "Saudi Arabia", "Saudi Arabian Grand Prix"),
        ],
    );
    let (service, _mock, _clock) = mock_service(mock);

    let table = service.get_circuits_for_year(2024).await.unwrap();
    assert_eq!(table.names(), vec!["Sakhir", "Jeddah"]);
}

#[tokio::test]
async fn circuits_cached_until_ttl() {
    let mock = MockF1Source::new().with_meetings(
        2024,
        vec![meeting("Monza", "Monza", "Italy", "Italian GP")],
    );
    let (service, mock, clock) = mock_service(mock);

    service.get_circuits_for_year(2024).await.unwrap();
    service.get_circuits_for_year(2024).await.unwrap();
    assert_eq!(mock.calls(MockCall::Meetings), 1);

    clock.advance(HOUR);
    service.get_circuits_for_year(2024).await.unwrap();
    assert_eq!(mock.calls(MockCall::Meetings), 2);
}

#[tokio::test]
async fn different_years_are_cached_separately() {
    let (service, mock, _clock) = mock_service(MockF1Source::new());
    service.get_circuits_for_year(2023).await.unwrap();
    service.get_circuits_for_year(2024).await.unwrap();
    service.get_circuits_for_year(2023).await.unwrap();
    assert_eq!(mock.calls(MockCall::Meetings), 2);
}

#[tokio::test]
async fn circuit_failure_falls_back_to_empty_table() {
    let mock = MockF1Source::new().failing(MockCall::Meetings);
    let (service, mock, _clock) = mock_service(mock);

    let result = service.get_circuits_for_year(2024).await;
    assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::Transport);

    let table = or_empty(result.map(|t| (*t).clone()), "loading circuits");
    assert!(table.is_empty());
    assert_eq!(table.columns().len(), 4);

    // The failure was not cached.
    let _ = service.get_circuits_for_year(2024).await;
    assert_eq!(mock.calls(MockCall::Meetings), 2);
}

#[tokio::test]
async fn session_names_sorted_and_unique() {
    let mock = MockF1Source::new().with_sessions(
        2024,
        "Monza",
        vec![
            session_dto("Race"),
            session_dto("Practice 1"),
            session_dto("Qualifying"),
            session_dto("Practice 2"),
            session_dto("Practice 3"),
            session_dto("Race"),
        ],
    );
    let (service, mock, _clock) = mock_service(mock);

    let names = service
        .get_sessions_for_circuit_year(2024, "Monza")
        .await
        .unwrap();
    assert_eq!(
        *names,
        vec!["Practice 1", "Practice 2", "Practice 3", "Qualifying", "Race"]
    );

    service
        .get_sessions_for_circuit_year(2024, "Monza")
        .await
        .unwrap();
    service
        .get_sessions_for_circuit_year(2024, "Imola")
        .await
        .unwrap();
    assert_eq!(mock.calls(MockCall::Sessions), 2);
}

#[tokio::test]
async fn session_names_fall_back_to_empty_list() {
    let mock = MockF1Source::new().failing(MockCall::Sessions);
    let (service, _mock, _clock) = mock_service(mock);

    let names = or_empty(
        service
            .get_sessions_for_circuit_year(2024, "Monza")
            .await
            .map(|n| (*n).clone()),
        "loading sessions",
    );
    assert!(names.is_empty());
}

#[tokio::test]
async fn load_session_is_cached() {
    let mock = MockF1Source::new().with_session(monza_race(vec![lap("VER", 1, 81_000)]));
    let (service, mock, clock) = mock_service(mock);

    let first = service
        .load_session(2024, "Monza", SessionType::Race)
        .await
        .unwrap();
    let second = service
        .load_session(2024, "Monza", SessionType::Race)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mock.calls(MockCall::LoadSession), 1);

    clock.advance(HOUR);
    service
        .load_session(2024, "Monza", SessionType::Race)
        .await
        .unwrap();
    assert_eq!(mock.calls(MockCall::LoadSession), 2);
}

#[tokio::test]
async fn load_session_error_propagates() {
    let (service, mock, _clock) = mock_service(MockF1Source::new());

    let err = service
        .load_session(2024, "Monza", SessionType::Qualifying)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::SessionNotFound {
            year: 2024,
            session_type: SessionType::Qualifying,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Unexpected);

    let _ = service
        .load_session(2024, "Monza", SessionType::Qualifying)
        .await;
    assert_eq!(mock.calls(MockCall::LoadSession), 2);
}

#[tokio::test]
async fn no_session_means_no_drivers() {
    let (service, _mock, _clock) = mock_service(MockF1Source::new());
    assert!(service.get_drivers_session(None).await.is_empty());
}

#[tokio::test]
async fn drivers_sorted_and_unique() {
    let (service, _mock, _clock) = mock_service(MockF1Source::new());
    let session = Arc::new(monza_race(vec![
        lap("VER", 1, 81_000),
        lap("HAM", 1, 81_500),
        lap("VER", 2, 80_900),
        lap("LEC", 1, 81_200),
    ]));

    let drivers = service.get_drivers_session(Some(&session)).await;
    assert_eq!(*drivers, vec!["HAM", "LEC", "VER"]);
}

#[tokio::test]
async fn slow_laps_do_not_count() {
    let (service, _mock, _clock) = mock_service(MockF1Source::new());
    let session = Arc::new(monza_race(vec![
        lap("VER", 1, 80_000),
        // Well beyond 107% of the fastest lap.
        lap("SAR", 1, 95_000),
    ]));

    let drivers = service.get_drivers_session(Some(&session)).await;
    assert_eq!(*drivers, vec!["VER"]);
}

#[tokio::test]
async fn drivers_cached_per_loaded_session() {
    let (service, _mock, _clock) = mock_service(MockF1Source::new());
    let session = Arc::new(monza_race(vec![lap("VER", 1, 80_000)]));

    let first = service.get_drivers_session(Some(&session)).await;
    let second = service.get_drivers_session(Some(&session)).await;
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn reloaded_session_gets_fresh_drivers() {
    let (service, _mock, _clock) = mock_service(MockF1Source::new());
    let first = Arc::new(monza_race(vec![lap("VER", 1, 80_000)]));
    let reloaded = Arc::new(monza_race(vec![lap("NOR", 1, 80_000)]));

    // Same key, different load: the new laps are used right away.
    assert_eq!(*service.get_drivers_session(Some(&first)).await, vec!["VER"]);
    assert_eq!(*service.get_drivers_session(Some(&reloaded)).await, vec!["NOR"]);
}

#[tokio::test]
async fn drivers_follow_session_reload_after_ttl() {
    let mock = MockF1Source::new().with_session(monza_race(vec![lap("VER", 1, 80_000)]));
    let (service, _mock, clock) = mock_service(mock);

    let first = service
        .load_session(2024, "Monza", SessionType::Race)
        .await
        .unwrap();
    let before = service.get_drivers_session(Some(&first)).await;

    clock.advance(HOUR);
    let reloaded = service
        .load_session(2024, "Monza", SessionType::Race)
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    let after = service.get_drivers_session(Some(&reloaded)).await;
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(*after, vec!["VER"]);
}

#[tokio::test]
async fn geojson_table_has_countries() {
    let mock = MockF1Source::new().with_layouts(test_collection(36));
    let (service, mock, _clock) = mock_service(mock);

    let table = service.get_circuits_geojson().await.unwrap();
    assert_eq!(table.len(), 36);
    assert_eq!(table.rows()[0].country, "Australia");

    service.get_circuits_geojson().await.unwrap();
    assert_eq!(mock.calls(MockCall::CircuitLayouts), 1);
}

#[tokio::test]
async fn geojson_row_mismatch_is_unexpected() {
    let mock = MockF1Source::new().with_layouts(test_collection(30));
    let (service, _mock, _clock) = mock_service(mock);

    let err = service.get_circuits_geojson().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}

#[tokio::test]
async fn geojson_transport_failure_falls_back_to_empty() {
    init_tracing();
    let mock = Arc::new(MockF1Source::new());
    let layouts = CircuitLayoutClient::new(
        CircuitLayoutConfig::default()
            .with_url("http://127.0.0.1:9/f1-circuits.geojson")
            .with_timeout(2),
    )
    .unwrap();
    let service = F1DataService::new(
        mock.clone(),
        mock,
        Arc::new(layouts),
        &ServiceConfig::default(),
    );

    let result = service.get_circuits_geojson().await;
    assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::Transport);

    let table = or_empty(result.map(|t| (*t).clone()), "loading circuit layouts");
    assert!(table.is_empty());
    assert_eq!(table.columns().len(), 8);
}

#[tokio::test]
async fn slow_calls_time_out() {
    init_tracing();
    let mock = Arc::new(
        MockF1Source::new()
            .with_meetings(2024, vec![meeting("Monza", "Monza", "Italy", "Italian GP")])
            .with_delay(Duration::from_millis(500)),
    );
    let config = ServiceConfig::default().with_call_timeout(Some(Duration::from_millis(20)));
    let service = F1DataService::new(mock.clone(), mock.clone(), mock, &config);

    let err = service.get_circuits_for_year(2024).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn misses_on_different_years_run_in_parallel() {
    init_tracing();
    let mock = Arc::new(MockF1Source::new().with_delay(Duration::from_millis(400)));
    let service = F1DataService::new(
        mock.clone(),
        mock.clone(),
        mock.clone(),
        &ServiceConfig::default(),
    );

    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(
        service.get_circuits_for_year(2023),
        service.get_circuits_for_year(2024),
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(mock.calls(MockCall::Meetings), 2);
    assert!(
        started.elapsed() < Duration::from_millis(750),
        "took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn concurrent_misses_on_one_year_fetch_once() {
    let mock = Arc::new(MockF1Source::new().with_delay(Duration::from_millis(50)));
    let service = F1DataService::new(
        mock.clone(),
        mock.clone(),
        mock.clone(),
        &ServiceConfig::default(),
    );

    let (a, b) = tokio::join!(
        service.get_circuits_for_year(2024),
        service.get_circuits_for_year(2024),
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(mock.calls(MockCall::Meetings), 1);
}

#[tokio::test]
async fn lap_telemetry_is_not_cached() {
    let mock = MockF1Source::new();
    let (service, mock, _clock) = mock_service(mock);
    let session = monza_race(vec![lap("VER", 1, 80_000)]);

    service.lap_telemetry(&session, "VER", 1).await.unwrap();
    service.lap_telemetry(&session, "VER", 1).await.unwrap();
    assert_eq!(mock.calls(MockCall::LapTelemetry), 2);

    let err = service.lap_telemetry(&session, "VER", 7).await.unwrap_err();
    assert!(matches!(err, FetchError::LapWindowUnknown { lap: 7, .. }));
}

#[test]
fn default_config() {
    let config = ServiceConfig::default();
    assert_eq!(config.cache.ttl, HOUR);
    assert_eq!(config.call_timeout, Some(Duration::from_secs(120)));
}
