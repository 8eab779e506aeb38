use std::collections::HashMap;

use laboratory::{SpecContext, Suite, describe, expect};
use reqwest::StatusCode;
use serde::Serialize;

use telemetry_sdk::api::http::{
    Client, ClientOptions, Error, RequestOpts, ServiceClient, build_query_string,
};

use super::{start_svc, stop_svc, take_records};
use crate::TestState;

const STATE: &'static str = "http";
const PORT: u16 = 18777;
const ENDPOINT: &'static str = "http://localhost:18777";

#[derive(Default, Serialize)]
struct QueryOpts<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
}

pub fn suite() -> Suite<TestState> {
    describe("http", |context| {
        context.it("new()", test_new);
        context.it("service_url()", test_service_url);
        context.it("service_url() with invalid endpoint", test_service_url_err);
        context.it("get()", test_get);
        context.it("get() with body", test_get_body);
        context.it("get() with status error", test_get_status_err);
        context.it("get() with transport error", test_get_transport_err);
        context.it("build_query_string()", test_build_query);
        context.it("Error", test_error);

        context.before_all(before_all_fn).after_all(after_all_fn);
    })
}

fn before_all_fn(state: &mut HashMap<&'static str, TestState>) -> () {
    start_svc(state, STATE, PORT);
}

fn after_all_fn(state: &mut HashMap<&'static str, TestState>) -> () {
    stop_svc(state, STATE);
}

fn new_client(endpoint: &str, token: Option<&str>) -> Client {
    Client::new(ClientOptions {
        endpoint: endpoint.to_string(),
        token: token.map(|x| x.to_string()),
    })
}

fn test_new(_: &mut SpecContext<TestState>) -> Result<(), String> {
    let client = new_client(ENDPOINT, Some(crate::TEST_TOKEN));
    expect(client.endpoint()).to_equal(ENDPOINT)?;
    let client = new_client("", None);
    expect(client.endpoint()).to_equal("")
}

fn test_service_url(_: &mut SpecContext<TestState>) -> Result<(), String> {
    let client = new_client(ENDPOINT, None);
    let url = client.service_url(&["v2", "meters"]);
    expect(url.is_ok()).to_equal(true)?;
    expect(url.unwrap().as_str()).to_equal("http://localhost:18777/v2/meters")?;

    let client = new_client("http://localhost:18777/telemetry/", None);
    let url = client.service_url(&["v2", "meters", "cpu util", "statistics"]);
    expect(url.is_ok()).to_equal(true)?;
    expect(url.unwrap().as_str())
        .to_equal("http://localhost:18777/telemetry/v2/meters/cpu%20util/statistics")?;

    let client = new_client("http://localhost:18777/telemetry?region=one#top", None);
    let url = client.service_url(&["v2", "meters"]);
    expect(url.is_ok()).to_equal(true)?;
    expect(url.unwrap().as_str()).to_equal("http://localhost:18777/telemetry/v2/meters")?;

    let url = client.service_url(&["v2", "meters", "a/b?c"]);
    expect(url.is_ok()).to_equal(true)?;
    expect(url.unwrap().as_str()).to_equal("http://localhost:18777/telemetry/v2/meters/a%2Fb%3Fc")
}

fn test_service_url_err(_: &mut SpecContext<TestState>) -> Result<(), String> {
    let client = new_client("", None);
    match client.service_url(&["v2", "meters"]) {
        Err(Error::Url(_)) => (),
        _ => return Err("empty endpoint should be a URL error".to_string()),
    }

    let client = new_client("mailto:user@example.com", None);
    match client.service_url(&["v2", "meters"]) {
        Err(Error::Url(_)) => Ok(()),
        _ => Err("cannot-be-a-base endpoint should be a URL error".to_string()),
    }
}

fn test_get(context: &mut SpecContext<TestState>) -> Result<(), String> {
    let state = context.state.borrow();
    let state = state.get(STATE).unwrap();
    let runtime = state.runtime.as_ref().unwrap();

    let client = new_client(ENDPOINT, Some(crate::TEST_TOKEN));
    let url = format!("{}/v2/meters?a=b", ENDPOINT);
    let result = runtime.block_on(async { client.get(url.as_str(), &RequestOpts::default()).await });
    match result {
        Err(e) => return Err(format!("get error: {}", e)),
        Ok(body) => expect(body.to_vec()).to_equal(super::METERS_JSON.as_bytes().to_vec())?,
    }

    let records = take_records(state);
    expect(records.len()).to_equal(1)?;
    expect(records[0].uri.as_str()).to_equal("/v2/meters?a=b")?;
    expect(records[0].token.as_deref()).to_equal(Some(crate::TEST_TOKEN))?;
    expect(records[0].content_type.is_none()).to_equal(true)?;
    expect(records[0].body.as_str()).to_equal("")
}

fn test_get_body(context: &mut SpecContext<TestState>) -> Result<(), String> {
    let state = context.state.borrow();
    let state = state.get(STATE).unwrap();
    let runtime = state.runtime.as_ref().unwrap();

    let client = new_client(ENDPOINT, Some(crate::TEST_TOKEN));
    let url = format!("{}/v2/meters/cpu/statistics", ENDPOINT);
    let opts = RequestOpts {
        body: Some(r#"{"period":60}"#.to_string()),
    };
    let result = runtime.block_on(async { client.get(url.as_str(), &opts).await });
    expect(result.is_ok()).to_equal(true)?;

    let records = take_records(state);
    expect(records.len()).to_equal(1)?;
    expect(records[0].uri.as_str()).to_equal("/v2/meters/cpu/statistics")?;
    expect(records[0].content_type.as_deref()).to_equal(Some("application/json"))?;
    expect(records[0].body.as_str()).to_equal(r#"{"period":60}"#)
}

fn test_get_status_err(context: &mut SpecContext<TestState>) -> Result<(), String> {
    let state = context.state.borrow();
    let state = state.get(STATE).unwrap();
    let runtime = state.runtime.as_ref().unwrap();

    let client = new_client(ENDPOINT, None);
    let url = format!("{}/v2/meters", ENDPOINT);
    let result = runtime.block_on(async { client.get(url.as_str(), &RequestOpts::default()).await });
    match result {
        Err(Error::Status(status, body)) => {
            expect(status).to_equal(StatusCode::UNAUTHORIZED)?;
            expect(body.contains("unauthorized")).to_equal(true)?;
        }
        _ => return Err("request without token should be 401".to_string()),
    }
    let records = take_records(state);
    expect(records.len()).to_equal(1)?;
    expect(records[0].token.is_none()).to_equal(true)?;

    let client = new_client(ENDPOINT, Some(crate::TEST_TOKEN));
    let url = format!("{}/v1/meters", ENDPOINT);
    let result = runtime.block_on(async { client.get(url.as_str(), &RequestOpts::default()).await });
    match result {
        Err(e) => {
            expect(e.is_transport()).to_equal(true)?;
            match e {
                Error::Status(status, _) => expect(status).to_equal(StatusCode::NOT_FOUND)?,
                _ => return Err(format!("unexpected error: {}", e)),
            }
        }
        Ok(_) => return Err("unknown path should be 404".to_string()),
    }
    take_records(state);
    Ok(())
}

fn test_get_transport_err(context: &mut SpecContext<TestState>) -> Result<(), String> {
    let state = context.state.borrow();
    let state = state.get(STATE).unwrap();
    let runtime = state.runtime.as_ref().unwrap();

    let client = new_client("http://localhost:1", Some(crate::TEST_TOKEN));
    let result = runtime.block_on(async {
        client
            .get("http://localhost:1/v2/meters", &RequestOpts::default())
            .await
    });
    match result {
        Err(Error::Transport(_)) => (),
        _ => return Err("closed port should be a transport error".to_string()),
    }

    let result = runtime.block_on(async { client.get("", &RequestOpts::default()).await });
    match result {
        Err(e) => expect(e.is_transport()).to_equal(true),
        Ok(_) => Err("empty URL should be an error".to_string()),
    }
}

fn test_build_query(_: &mut SpecContext<TestState>) -> Result<(), String> {
    let query = build_query_string(&QueryOpts::default());
    expect(query.is_ok()).to_equal(true)?;
    expect(query.unwrap().as_str()).to_equal("")?;

    let opts = QueryOpts {
        name: Some("cpu util"),
        limit: Some(0),
    };
    let query = build_query_string(&opts);
    expect(query.is_ok()).to_equal(true)?;
    expect(query.unwrap().as_str()).to_equal("?name=cpu+util&limit=0")?;

    // Only maps and structs can be encoded.
    match build_query_string(&10) {
        Err(Error::Encoding(_)) => Ok(()),
        _ => Err("integer should not be encoded".to_string()),
    }
}

fn test_error(_: &mut SpecContext<TestState>) -> Result<(), String> {
    let e = Error::Encoding("bad".to_string());
    expect(e.is_transport()).to_equal(false)?;
    expect(e.to_string().as_str()).to_equal("encoding error: bad")?;

    let e = Error::Url("bad".to_string());
    expect(e.is_transport()).to_equal(false)?;
    expect(e.to_string().as_str()).to_equal("invalid URL: bad")?;

    let e = Error::UnsupportedKind("Form".to_string());
    expect(e.is_transport()).to_equal(false)?;
    expect(e.to_string().as_str()).to_equal("unsupported options kind: Form")?;

    let e = Error::Status(StatusCode::NOT_FOUND, "{}".to_string());
    expect(e.is_transport()).to_equal(true)?;
    expect(e.to_string().as_str()).to_equal("unexpected status 404 Not Found: {}")?;

    let e = Error::Decode("bad".to_string());
    expect(e.is_transport()).to_equal(true)?;
    expect(e.to_string().as_str()).to_equal("decode error: bad")
}
