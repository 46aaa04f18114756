//! Integration tests for IpApiLocation and the resolver fallback using wiremock.

use localweather_core::{
    FALLBACK_COORDINATE, IpApiLocation, LocationError, LocationSource, PositionResolver,
    Resolution,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn locator_for(mock_server: &MockServer) -> IpApiLocation {
    IpApiLocation::with_url(format!("{}/json/", mock_server.uri()))
}

#[tokio::test]
async fn test_ip_location_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": "203.0.113.7",
            "city": "Amsterdam",
            "country_name": "Netherlands",
            "latitude": 52.37,
            "longitude": 4.89
        })))
        .mount(&mock_server)
        .await;

    let locator = locator_for(&mock_server);
    assert!(locator.is_available());

    let coordinate = locator.current_position().await.unwrap();
    assert_eq!(coordinate.latitude(), 52.37);
    assert_eq!(coordinate.longitude(), 4.89);
}

#[tokio::test]
async fn test_ip_location_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": true,
            "reason": "RateLimited"
        })))
        .mount(&mock_server)
        .await;

    let err = locator_for(&mock_server).current_position().await.unwrap_err();
    match err {
        LocationError::PositionUnavailable(reason) => assert_eq!(reason, "RateLimited"),
        other => panic!("expected position unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ip_location_forbidden_is_denial() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let err = locator_for(&mock_server).current_position().await.unwrap_err();
    assert!(matches!(err, LocationError::PermissionDenied));
}

#[tokio::test]
async fn test_ip_location_out_of_range() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "latitude": 123.0,
            "longitude": 4.89
        })))
        .mount(&mock_server)
        .await;

    let err = locator_for(&mock_server).current_position().await.unwrap_err();
    assert!(matches!(err, LocationError::InvalidCoordinate { .. }));
}

#[tokio::test]
async fn test_resolver_falls_back_when_service_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let resolver = PositionResolver::new(locator_for(&mock_server));
    let resolution = resolver.resolve().await.unwrap();

    assert!(matches!(resolution, Resolution::Fallback { .. }));
    assert_eq!(resolution.coordinate(), FALLBACK_COORDINATE);
}
