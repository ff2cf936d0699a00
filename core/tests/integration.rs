//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through the default `ureq` transport.

use std::net::SocketAddr;

use easybroker_core::{
    ApiError, BodyOptions, ClientConfig, ListParams, Location, PropertyClient, QueryOptions,
};
use mock_server::{sample_property, Store};
use serde_json::json;

/// Serve `store` on a random local port from a background thread.
fn start_server(store: Store) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, store).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr, api_key: &str) -> PropertyClient {
    PropertyClient::from_config(ClientConfig::new(api_key).with_base_url(&format!("http://{addr}")))
}

fn location() -> Location {
    Location::new(
        "Del Valle, Benito Juárez, Ciudad de México",
        "Avenida Coyoacán",
        "1435",
        "301",
        "Félix Cuevas",
        "03100",
        19.3722,
        -99.1713,
    )
}

#[test]
fn listing_pages_and_clamps() {
    let addr = start_server(Store::seeded(60));
    let client = client(addr, "test-key");

    // Step 1: fractional page and limit are truncated.
    let listing = client.list_properties(&ListParams::new(2.1, 4.9999)).unwrap();
    let body = listing.page().unwrap();
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 4);
    assert_eq!(body["content"].as_array().unwrap().len(), 4);
    assert_eq!(body["content"][0]["title"], "Property 5");

    // Step 2: an oversized limit comes back as 50.
    let listing = client.list_properties(&ListParams::new(1.0, 100.0)).unwrap();
    let body = listing.page().unwrap();
    assert_eq!(body["pagination"]["limit"], 50);
    assert_eq!(body["pagination"]["total"], 60);

    // Step 3: the last partial page.
    let listing = client.list_properties(&ListParams::new(2.0, 50.0)).unwrap();
    assert_eq!(listing.page().unwrap()["content"].as_array().unwrap().len(), 10);

    // Step 4: far past the end is empty, not an error.
    let listing = client.list_properties(&ListParams::new(900.0, 1.0)).unwrap();
    assert!(listing.page().unwrap()["content"].as_array().unwrap().is_empty());

    // Step 5: invalid input never reaches the server.
    let listing = client.list_properties(&ListParams::new(2.0, 0.0)).unwrap();
    assert!(listing.is_rejected());
}

#[test]
fn listing_filters_by_update_date() {
    let mut store = Store::new();
    store.insert(sample_property("Viejo", "2021-11-30T09:00:00-06:00"));
    store.insert(sample_property("Reciente", "2023-02-14T09:00:00-06:00"));
    let addr = start_server(store);
    let client = client(addr, "test-key");

    let params = ListParams::new(1.0, 1.0).with_options(QueryOptions::new(Some("2023-01-01"), None));
    let listing = client.list_properties(&params).unwrap();
    let body = listing.page().unwrap();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["content"][0]["title"], "Reciente");

    let params = ListParams::new(1.0, 1.0).with_options(QueryOptions::new(Some("3000-01-01"), None));
    let listing = client.list_properties(&params).unwrap();
    assert!(listing.page().unwrap()["content"].as_array().unwrap().is_empty());
}

#[test]
fn titles_cover_whole_book() {
    let addr = start_server(Store::seeded(120));
    let client = client(addr, "test-key");

    let mut out = Vec::new();
    let written = client.write_all_property_titles(&mut out).unwrap();
    assert_eq!(written, 120);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.first(), Some(&"Property 1"));
    assert_eq!(lines.last(), Some(&"Property 120"));
}

#[test]
fn create_retrieve_update_lifecycle() {
    let addr = start_server(Store::new());
    let client = client(addr, "test-key");

    // Step 1: create, with an option overriding the status.
    let options = json!({"status": "not_published"});
    let created = client
        .create_property(
            "Apartment",
            "Depa en Del Valle",
            "Dos recámaras, un baño",
            "published",
            &location(),
            options.as_object().unwrap(),
        )
        .unwrap();
    assert_eq!(created["status"], "not_published");
    assert_eq!(created["location"]["postal_code"], "03100");
    let id = created["public_id"].as_str().unwrap().to_string();

    // Step 2: retrieve.
    let fetched = client.retrieve_property(&id).unwrap();
    assert_eq!(fetched, created);

    // Step 3: update.
    let updated = client
        .update_property(
            &id,
            "Apartment",
            "Depa remodelado",
            "Dos recámaras, dos baños",
            "published",
            &BodyOptions::new(),
        )
        .unwrap();
    assert_eq!(updated["title"], "Depa remodelado");
    assert_eq!(updated["status"], "published");
    assert_eq!(updated["location"], created["location"]);

    // Step 4: unknown id yields the server's error body.
    let missing = client.retrieve_property("EB-99999").unwrap();
    assert_eq!(missing, json!({"error": "Not found"}));
}

#[test]
fn remote_errors_are_returned_as_json() {
    let addr = start_server(Store::seeded(1));

    let unauthorized = client(addr, "");
    let listing = unauthorized.list_properties(&ListParams::default()).unwrap();
    assert_eq!(listing.into_value(), json!({"error": "Unauthorized"}));

    let client = client(addr, "test-key");
    let rejected = client
        .create_property("", "Sin tipo", "", "published", &location(), &BodyOptions::new())
        .unwrap();
    assert_eq!(rejected, json!({"error": "property_type can't be blank"}));
}

#[test]
fn connection_failure_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client(addr, "test-key");
    let err = client.retrieve_property("EB-00001").unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
