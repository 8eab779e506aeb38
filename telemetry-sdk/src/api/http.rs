//! The service client that is used for the telemetry APIs with the following features:
//! - The [`ServiceClient`] trait is the only transport surface that request builders depend on.
//!   Any type that can issue a GET with an optional body can be plugged in.
//! - [`Client`] is the default implementation on top of `reqwest`. It sends the configured token
//!   with the `X-Auth-Token` header.
//! - There is no retry, token refresh or timeout policy in this layer.
//!
//! Here is an example to create a client and get meter statistics:
//!
//! ```rust,no_run
//! use telemetry_sdk::api::{
//!     http::{Client, ClientOptions},
//!     meters::{self, MeterStatisticsOpts},
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let opts = ClientOptions {
//!         endpoint: "http://localhost:8777".to_string(),
//!         token: Some("TOKEN".to_string()),
//!     };
//!     let client = Client::new(opts);
//!     let opts = MeterStatisticsOpts {
//!         period: Some(300),
//!         ..Default::default()
//!     };
//!     match meters::meter_statistics(&client, "cpu_util", Some(&opts)).await.extract() {
//!         Err(e) => {
//!             // Handle encoding, URL and transport errors.
//!         }
//!         Ok(statistics) => {
//!             // Handle statistics.
//!         }
//!     }
//! }
//! ```

use std::{error::Error as StdError, fmt};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client as ReqwestClient, Method, StatusCode, header};
use serde::Serialize;
use url::Url;

/// The transport used by the request builders.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The service endpoint with scheme. For example `http://localhost:8777`.
    fn endpoint(&self) -> &str;

    /// To build a resource URL by appending `parts` as path segments of the endpoint.
    ///
    /// Each part is percent-encoded, so a part cannot introduce extra segments or a query. The
    /// query and fragment of the endpoint are dropped because options are appended to the result.
    fn service_url(&self, parts: &[&str]) -> Result<String, Error> {
        let mut url = match Url::parse(self.endpoint()) {
            Err(e) => return Err(Error::Url(format!("{}: {}", self.endpoint(), e))),
            Ok(url) => url,
        };
        url.set_query(None);
        url.set_fragment(None);
        match url.path_segments_mut() {
            Err(_) => return Err(Error::Url(format!("{}: not a base", self.endpoint()))),
            Ok(mut segments) => {
                segments.pop_if_empty().extend(parts);
            }
        }
        Ok(url.to_string())
    }

    /// To execute a GET request.
    /// - `url` is the full URL including the query string.
    /// - Returns the raw response body on `200 OK`.
    async fn get(&self, url: &str, opts: &RequestOpts) -> Result<Bytes, Error>;
}

/// Per-request options passed to [`ServiceClient::get`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOpts {
    /// The request body. It is sent as JSON when present.
    pub body: Option<String>,
}

/// The HTTP client to request telemetry APIs.
#[derive(Clone)]
pub struct Client {
    /// The underlying HTTP client instance.
    client: ReqwestClient,
    /// Service endpoint.
    endpoint: String,
    /// The token for `X-Auth-Token`.
    token: Option<String>,
}

/// Options of the HTTP client [`Client`].
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Service endpoint with scheme. For example `http://localhost:8777`
    pub endpoint: String,
    /// Token. The `X-Auth-Token` header will not be sent if this is `None`.
    pub token: Option<String>,
}

#[derive(Debug)]
pub enum Error {
    /// Options cannot be converted to query string or body.
    Encoding(String),
    /// The request URL cannot be built.
    Url(String),
    /// The request cannot be sent or the response cannot be read.
    Transport(Box<dyn StdError + Send + Sync>),
    /// The response status is not `200 OK`. Contains the response body.
    Status(StatusCode, String),
    /// The response body cannot be decoded.
    Decode(String),
    /// An unknown options kind string.
    UnsupportedKind(String),
}

/// The header name of the token.
pub const HEADER_AUTH_TOKEN: &'static str = "X-Auth-Token";

impl Client {
    /// Create an instance.
    pub fn new(opts: ClientOptions) -> Self {
        Client {
            client: ReqwestClient::new(),
            endpoint: opts.endpoint,
            token: opts.token,
        }
    }
}

#[async_trait]
impl ServiceClient for Client {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn get(&self, url: &str, opts: &RequestOpts) -> Result<Bytes, Error> {
        let mut builder = self
            .client
            .request(Method::GET, url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = self.token.as_ref() {
            builder = builder.header(HEADER_AUTH_TOKEN, token.as_str());
        }
        if let Some(body) = opts.body.as_ref() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder = builder.body(body.clone());
        }
        let req = match builder.build() {
            Err(e) => return Err(Error::Transport(Box::new(e))),
            Ok(req) => req,
        };
        let resp = match self.client.execute(req).await {
            Err(e) => return Err(Error::Transport(Box::new(e))),
            Ok(resp) => resp,
        };
        let status = resp.status();
        let body = match resp.bytes().await {
            Err(e) => return Err(Error::Transport(Box::new(e))),
            Ok(body) => body,
        };
        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(body.as_ref()).to_string();
            return Err(Error::Status(status, body));
        }
        Ok(body)
    }
}

impl Error {
    /// Errors that come from the transport: sending, status and response decoding.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Status(_, _) | Error::Decode(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Encoding(desc) => write!(f, "encoding error: {}", desc),
            Error::Url(desc) => write!(f, "invalid URL: {}", desc),
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::Status(status, body) => write!(f, "unexpected status {}: {}", status, body),
            Error::Decode(desc) => write!(f, "decode error: {}", desc),
            Error::UnsupportedKind(kind) => write!(f, "unsupported options kind: {}", kind),
        }
    }
}

impl StdError for Error {}

/// To encode a serializable options value as a query string.
///
/// Returns an empty string when no field is set, otherwise the encoded pairs with a leading `?`
/// so that the result can be appended to a URL directly.
pub fn build_query_string<T: Serialize + ?Sized>(opts: &T) -> Result<String, Error> {
    match serde_urlencoded::to_string(opts) {
        Err(e) => Err(Error::Encoding(e.to_string())),
        Ok(query) => match query.len() {
            0 => Ok("".to_string()),
            _ => Ok(format!("?{}", query)),
        },
    }
}
