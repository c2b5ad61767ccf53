//! Every tool end to end against a mocked upstream.

mod common;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{config_for, only_json, only_text, registry};

fn transit_body() -> serde_json::Value {
    json!({
        "connections": [{
            "from": {
                "station": { "id": "8503000", "name": "Zürich HB" },
                "departure": "2026-10-17T08:02:00+0200",
                "platform": "31"
            },
            "to": {
                "station": { "id": "8500010", "name": "Basel SBB" },
                "arrival": "2026-10-17T08:55:00+0200",
                "platform": "7"
            },
            "duration": "00d00:53:00",
            "transfers": 0,
            "sections": [{
                "journey": {
                    "name": "IC 3",
                    "category": "IC",
                    "number": "3",
                    "operator": "SBB",
                    "to": "Basel SBB",
                    "passList": [
                        { "station": { "id": "8503000", "name": "Zürich HB" }, "arrival": null, "departure": "2026-10-17T08:02:00+0200", "delay": 0 },
                        { "station": { "id": "8500010", "name": "Basel SBB" }, "arrival": "2026-10-17T08:55:00+0200", "departure": null, "delay": null }
                    ]
                }
            }]
        }]
    })
}

#[tokio::test]
async fn transit_connections_end_to_end() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/connections")
                .query_param("from", "Zürich")
                .query_param("to", "Basel");
            then.status(200).json_body(transit_body());
        })
        .await;

    let registry = registry(&config_for(&server));
    let content = registry
        .call("transit-connections", Some(json!({ "origin": "Zürich", "to": "Basel" })))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(only_json(&content), transit_body());
}

#[tokio::test]
async fn transit_via_and_arrival_flags_reach_the_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/connections")
                .query_param("via[]", "Olten")
                .query_param("isArrivalTime", "1")
                .query_param("date", "2026-10-18")
                .query_param("time", "07:30")
                .query_param("limit", "2");
            then.status(200).json_body(json!({ "connections": [] }));
        })
        .await;

    let registry = registry(&config_for(&server));
    registry
        .call(
            "transit-connections",
            Some(json!({
                "origin": "Bern",
                "to": "Basel",
                "via": ["Olten"],
                "date": "2026-10-18",
                "time": "07:30",
                "is_arrival_time": true,
                "limit": 2
            })),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn rail_traffic_info_matches_recorded_fixture() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/catalog/datasets/rail-traffic-information/records")
                .query_param("limit", "2")
                .query_param("offset", "0")
                .query_param("timezone", "UTC");
            then.status(200).json_body(json!({
                "total_count": 2,
                "results": [
                    {
                        "title": "Track maintenance in Zürich",
                        "link": "https://data.sbb.ch/info/1",
                        "description": "Maintenance work between Zürich HB and Oerlikon",
                        "published": "2024-01-01T10:00:00Z",
                        "author": "SBB",
                        "validitybegin": "2024-01-02T00:00:00Z",
                        "validityend": "2024-01-03T00:00:00Z",
                        "description_html": "<p>Maintenance work between Zürich HB and Oerlikon</p>"
                    },
                    {
                        "title": "Delays in Bern",
                        "link": "https://data.sbb.ch/info/2",
                        "description": "Signal failure causing delays",
                        "published": "2024-01-01T11:00:00Z",
                        "author": "SBB",
                        "validitybegin": "2024-01-01T11:00:00Z",
                        "validityend": "2024-01-01T15:00:00Z",
                        "description_html": "<p>Signal failure causing delays</p>"
                    }
                ]
            }));
        })
        .await;

    let registry = registry(&config_for(&server));
    let content = registry
        .call("rail-traffic-info", Some(json!({ "limit": 2 })))
        .await
        .unwrap();

    mock.assert_async().await;
    let text = only_text(&content);
    assert!(text.contains("Track maintenance in Zürich"));
    assert!(text.contains("Delays in Bern"));
}

fn railway_lines_body() -> serde_json::Value {
    json!({
        "total_count": 2,
        "results": [
            {
                "linie": 100,
                "linienname": "Zürich HB - Bern",
                "bpk_anfang": "Zürich HB",
                "bpk_ende": "Bern",
                "km_anfang": 0.0,
                "km_ende": 120.5,
                "stationierung_anfang": 0,
                "stationierung_ende": 120500,
                "tst": {
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[8.540192, 47.378177], [7.439122, 46.949083]]
                    },
                    "properties": {}
                },
                "geo_point_2d": { "lon": 7.989657, "lat": 47.163630 }
            },
            {
                "linie": 200,
                "linienname": "Basel - Luzern",
                "bpk_anfang": "Basel SBB",
                "bpk_ende": "Luzern",
                "km_anfang": 0.0,
                "km_ende": 105.8,
                "stationierung_anfang": 0,
                "stationierung_ende": 105800,
                "tst": {
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[7.589576, 47.547184], [8.310485, 47.050168]]
                    },
                    "properties": {}
                },
                "geo_point_2d": { "lon": 7.950031, "lat": 47.298676 }
            }
        ]
    })
}

#[tokio::test]
async fn railway_lines_matches_recorded_fixture() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/catalog/datasets/linie/records")
                .query_param("limit", "2");
            then.status(200).json_body(railway_lines_body());
        })
        .await;

    let registry = registry(&config_for(&server));
    let content = registry
        .call("railway-lines", Some(json!({ "limit": 2 })))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(only_json(&content), railway_lines_body());
}

#[tokio::test]
async fn charging_stations_send_a_wfs_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ows")
                .query_param("service", "WFS")
                .query_param("typeName", "ich-tanke-strom:evse")
                .query_param("maxFeatures", "1")
                .query_param("cql_filter", "RenewableEnergy=true AND Address.City ILIKE '%Bern%'");
            then.status(200).json_body(json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "id": "evse.1",
                    "geometry": { "type": "Point", "coordinates": [7.44, 46.95] },
                    "properties": {
                        "@featureType": "evse",
                        "_id": "CH*ECU*E1",
                        "EvseStatus": "Available",
                        "Plugs": "Type 2",
                        "AuthenticationModes": ["Direct Payment"],
                        "AccessibilityLocation": "ParkingLot",
                        "Address": { "PostalCode": "3011", "City": "Bern", "Street": "Bundesplatz 3", "Country": "CHE" },
                        "PaymentOptions": ["Contactless"],
                        "RenewableEnergy": true,
                        "ChargingFacilities": [{ "Power": 11, "PowerType": "AC_3_PHASE" }]
                    }
                }]
            }));
        })
        .await;

    let mut cfg = config_for(&server);
    cfg.evcharge.base_url = format!("{}/ows", server.base_url());
    let registry = registry(&cfg);
    let content = registry
        .call("charging-stations", Some(json!({ "limit": 1, "city": "Bern" })))
        .await
        .unwrap();

    mock.assert_async().await;
    let rendered = only_json(&content);
    assert_eq!(rendered["features"][0]["properties"]["Address"]["City"], "Bern");
    assert_eq!(rendered["features"][0]["properties"]["ChargingFacilities"][0]["Voltage"], serde_json::Value::Null);
}

fn emission_record(id: i64, year: i32) -> serde_json::Value {
    json!({
        "id": id,
        "iso_code3": "CHE",
        "country": "Switzerland",
        "data_source": "CAIT",
        "sector": "Energy",
        "gas": "All GHG",
        "unit": "MtCO₂e",
        "emissions": [{ "year": year, "value": 38.5 }]
    })
}

#[tokio::test]
async fn emissions_follow_every_cursor() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/data/historical_emissions")
                .query_param("regions[]", "CHE")
                .query_param("start_year", "2010");
            then.status(200).json_body(json!({
                "data": [emission_record(1, 2010)],
                "next": server.url("/data/historical_emissions/p2")
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/data/historical_emissions/p2");
            // Relative to the page that returned it.
            then.status(200).json_body(json!({
                "data": [emission_record(2, 2011)],
                "next": "p3"
            }));
        })
        .await;
    let third = server
        .mock_async(|when, then| {
            when.method(GET).path("/data/historical_emissions/p3");
            then.status(200).json_body(json!({ "data": [emission_record(3, 2012)] }));
        })
        .await;

    let registry = registry(&config_for(&server));
    let content = registry
        .call(
            "historical-emissions",
            Some(json!({ "regions": ["CHE"], "start_year": 2010 })),
        )
        .await
        .unwrap();

    assert_eq!(first.hits_async().await, 1);
    assert_eq!(second.hits_async().await, 1);
    assert_eq!(third.hits_async().await, 1);

    // Pages concatenate in cursor order, records unchanged.
    assert_eq!(
        only_json(&content),
        json!({
            "data": [
                emission_record(1, 2010),
                emission_record(2, 2011),
                emission_record(3, 2012)
            ]
        })
    );
}

#[tokio::test]
async fn people_search_posts_with_headers_and_bracketed_lists() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/mixed_people/search")
                .header("x-api-key", "test-key")
                .header("cache-control", "no-cache")
                .header("content-type", "application/json")
                .query_param("person_titles[]", "software engineer")
                .query_param("person_titles[]", "cto")
                .query_param("organization_num_employees_ranges[]", "1,10")
                .query_param("page", "1")
                .query_param("per_page", "5");
            then.status(200).json_body(json!({
                "people": [{
                    "id": "p1",
                    "name": "Ada Lovelace",
                    "title": "CTO",
                    "employment_history": [{ "organization_name": "Analytical Engines", "current": true }],
                    "contact": { "contact_emails": [{ "email": "ada@example.org", "email_status": "verified" }] },
                    "organization": {
                        "name": "Analytical Engines",
                        "current_technologies": [{ "uid": "rust", "name": "Rust", "category": "Languages" }]
                    }
                }],
                "pagination": { "page": 1, "per_page": 5, "total_entries": 1, "total_pages": 1 }
            }));
        })
        .await;

    let registry = registry(&config_for(&server));
    let content = registry
        .call(
            "people-search",
            Some(json!({
                "person_titles": ["software engineer", "cto"],
                "organization_num_employees_ranges": ["1,10"],
                "per_page": 5
            })),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    let rendered = only_json(&content);
    assert_eq!(rendered["people"][0]["name"], "Ada Lovelace");
    assert_eq!(
        rendered["people"][0]["organization"]["current_technologies"][0]["name"],
        "Rust"
    );
    assert_eq!(rendered["pagination"]["total_entries"], 1);
}
