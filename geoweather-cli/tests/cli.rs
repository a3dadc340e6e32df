//! End-to-end runs of the `geoweather` binary against a mock weather API.

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("geoweather").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("WEATHER_API_KEY")
        .env_remove("WEATHER_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Tokyo",
            "main": { "temp": 22.5, "feels_like": 21.0, "humidity": 60 },
            "weather": [{ "main": "Clouds", "description": "scattered clouds", "icon": "03d" }],
            "wind": { "speed": 3.1 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                {
                    "dt": 1_700_000_000,
                    "main": { "temp": 18.0, "temp_min": 17.0, "temp_max": 19.0 },
                    "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }]
                },
                {
                    "dt": 1_700_010_800,
                    "main": { "temp": 25.6, "temp_min": 24.0, "temp_max": 26.0 },
                    "weather": [{ "main": "Rain", "description": "light rain", "icon": "10d" }]
                }
            ]
        })))
        .mount(&server)
        .await;

    server
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("configure"))
        .stdout(contains("show"))
        .stdout(contains("run"));
}

#[test]
fn show_without_api_key_explains_how_to_configure() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["show", "--lat", "35", "--lon", "139"])
        .assert()
        .failure()
        .stderr(contains("No API key configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn show_renders_tokyo() {
    let server = mock_api().await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        let home = TempDir::new().unwrap();
        cmd(&home)
            .env("WEATHER_API_KEY", "TEST_KEY")
            .env("WEATHER_BASE_URL", uri)
            .args(["show", "--lat", "35", "--lon", "139", "--layout", "portrait", "--sort", "temp"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let out = String::from_utf8(output.stdout).unwrap();
    assert!(out.starts_with("Tokyo\n23°\nscattered clouds\n"));
    assert!(out.contains("[Temperature]"));
    assert!(out.find("Rain").unwrap() < out.find("Clear").unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn show_json_includes_sorted_forecast() {
    let server = mock_api().await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        let home = TempDir::new().unwrap();
        cmd(&home)
            .env("WEATHER_API_KEY", "TEST_KEY")
            .env("WEATHER_BASE_URL", uri)
            .args(["show", "--lat", "35", "--lon", "139", "--json"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["state"], "weather_loaded");
    assert_eq!(json["sort"], "chronological");
    assert_eq!(json["report"]["current"]["name"], "Tokyo");
    assert_eq!(json["forecast"][0]["dt"], 1_700_000_000);
}

#[test]
fn no_terminal_means_permission_denied() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .env("WEATHER_API_KEY", "TEST_KEY")
        .env("WEATHER_BASE_URL", "http://127.0.0.1:9")
        .args(["show", "--layout", "portrait"])
        .assert()
        .failure()
        .stdout(contains("Location permission is required to fetch weather data."));
}
