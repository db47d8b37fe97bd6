use mockito::{Matcher, Server};
use shared::error::FetchError;
use shared::fema::{DISASTER_DECLARATIONS_ENDPOINT, FemaClient};
use shared::nominatim::{NominatimClient, ViewBox};

const FEMA_PATH: &str = "/api/open/v2/DisasterDeclarationsSummaries";

const FEMA_BODY: &str = r#"{
    "metadata": {"skip": 0, "top": 10, "count": 0},
    "DisasterDeclarationsSummaries": [
        {
            "femaDeclarationString": "DR-1234-CA",
            "disasterNumber": 1234,
            "state": "CA",
            "declarationType": "DR",
            "declarationDate": "2024-09-20T00:00:00.000Z",
            "incidentType": "Severe Storm",
            "declarationTitle": "Severe Storm DR-1234",
            "incidentBeginDate": "2024-09-18T00:00:00.000Z",
            "expirationDate": null,
            "lastIAFilingDate": null
        },
        {
            "state": "CA",
            "declarationTitle": "Wildfires",
            "declarationDate": "2024-08-01T00:00:00.000Z"
        }
    ]
}"#;

#[tokio::test]
async fn fema_client_requests_open_declarations_for_state() -> Result<(), FetchError> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", FEMA_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "$filter".into(),
                "state eq 'CA' and lastIAFilingDate eq null".into(),
            ),
            Matcher::UrlEncoded("$orderby".into(), "incidentBeginDate desc".into()),
            Matcher::UrlEncoded("$top".into(), "10".into()),
            Matcher::UrlEncoded("$format".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(FEMA_BODY)
        .create_async()
        .await;

    let client = FemaClient::new_with_client(
        reqwest::Client::new(),
        format!("{}{FEMA_PATH}", server.url()),
    );
    let response = client.open_declarations("CA").await?;

    mock.assert_async().await;
    assert_eq!(response.summaries.len(), 2);
    let first = &response.summaries[0];
    assert_eq!(first.declaration_title.as_deref(), Some("Severe Storm DR-1234"));
    assert_eq!(
        first.declaration_date.as_deref(),
        Some("2024-09-20T00:00:00.000Z")
    );
    assert_eq!(first.expiration_date, None);
    assert_eq!(first.disaster_number, Some(1234));
    Ok(())
}

#[tokio::test]
async fn fema_client_reports_malformed_body_as_deserialize_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", FEMA_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"unexpected": true}"#)
        .create_async()
        .await;

    let client = FemaClient::new_with_client(
        reqwest::Client::new(),
        format!("{}{FEMA_PATH}", server.url()),
    );
    let result = client.open_declarations("TX").await;
    assert!(matches!(result, Err(FetchError::Deserialize(_))));
}

#[tokio::test]
async fn fema_client_reports_server_error_as_transport_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", FEMA_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = FemaClient::new_with_client(
        reqwest::Client::new(),
        format!("{}{FEMA_PATH}", server.url()),
    );
    let result = client.open_declarations("TX").await;
    assert!(matches!(result, Err(FetchError::Reqwest(_))));
}

#[tokio::test]
async fn nominatim_reverse_extracts_locality_and_subdivision() -> Result<(), FetchError> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/reverse")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("format".into(), "jsonv2".into()),
            Matcher::UrlEncoded("lat".into(), "37.7749".into()),
            Matcher::UrlEncoded("lon".into(), "-122.4194".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{
                "place_id": 1,
                "display_name": "City Hall, San Francisco, California, United States",
                "address": {
                    "road": "Polk Street",
                    "city": "San Francisco",
                    "state": "California",
                    "ISO3166-2-lvl4": "US-CA",
                    "country_code": "us"
                }
            }"#,
        )
        .create_async()
        .await;

    let client = NominatimClient::new_with_client(reqwest::Client::new(), server.url());
    let response = client.reverse(37.7749, -122.4194).await?;

    mock.assert_async().await;
    let address = response.address.expect("address should be present");
    assert_eq!(address.locality(), Some("San Francisco"));
    assert_eq!(address.subdivision_code(), Some("CA"));
    assert_eq!(address.state.as_deref(), Some("California"));
    Ok(())
}

#[tokio::test]
async fn nominatim_reverse_decodes_unable_to_geocode() -> Result<(), FetchError> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/reverse")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"error": "Unable to geocode"}"#)
        .create_async()
        .await;

    let client = NominatimClient::new_with_client(reqwest::Client::new(), server.url());
    let response = client.reverse(0.0, 0.0).await?;
    assert!(response.address.is_none());
    assert_eq!(response.error.as_deref(), Some("Unable to geocode"));
    Ok(())
}

#[tokio::test]
async fn nominatim_search_is_bounded_to_view_box() -> Result<(), FetchError> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "hospital".into()),
            Matcher::UrlEncoded("viewbox".into(), "-122.5,37.7,-122.4,37.8".into()),
            Matcher::UrlEncoded("bounded".into(), "1".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"[
                {
                    "name": "General Hospital",
                    "display_name": "General Hospital, 1001 Potrero Ave, San Francisco",
                    "lat": "37.7557",
                    "lon": "-122.4048",
                    "extratags": {"phone": "+1 415 206 8000"}
                },
                {
                    "name": "",
                    "display_name": "Clinic Annex, Mission Street, San Francisco",
                    "lat": "not-a-number",
                    "lon": "-122.41",
                    "extratags": null
                }
            ]"#,
        )
        .create_async()
        .await;

    let client = NominatimClient::new_with_client(reqwest::Client::new(), server.url())
        .with_results_per_query(5);
    let view_box = ViewBox {
        west: -122.5,
        south: 37.7,
        east: -122.4,
        north: 37.8,
    };
    let items = client.search("hospital", view_box).await?;

    mock.assert_async().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].label(), "General Hospital");
    assert_eq!(items[0].phone(), Some("+1 415 206 8000"));
    assert_eq!(items[0].coordinates(), Some((37.7557, -122.4048)));
    assert_eq!(items[1].label(), "Clinic Annex");
    assert_eq!(items[1].coordinates(), None);
    assert_eq!(items[1].phone(), None);
    Ok(())
}

#[tokio::test]
#[ignore = "hits the live OpenFEMA API"]
async fn verify_live_fema_dtos() -> Result<(), FetchError> {
    let client = FemaClient::new_with_client(reqwest::Client::new(), DISASTER_DECLARATIONS_ENDPOINT);
    let response = client.open_declarations("CA").await?;
    assert!(response.summaries.len() <= 10);
    Ok(())
}
