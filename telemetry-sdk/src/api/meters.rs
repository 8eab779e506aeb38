//! Meter list and meter statistics requests.
//!
//! Options are converted by builder traits so that the request functions do not need to know the
//! concrete options type. A statistics builder also declares where its payload goes with
//! [`OptsKind`].

use std::{fmt, str::FromStr};

use bytes::Bytes;
use log::{debug, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use super::http::{Error, RequestOpts, ServiceClient, build_query_string};

/// Allows extensions to add additional parameters to the list request.
pub trait ListOptsBuilder: Send + Sync {
    fn to_meter_list_query(&self) -> Result<String, Error>;
}

/// Filters of the meter list. There is no filter in this API revision.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ListOpts {}

/// Describes where a statistics payload is placed in the request.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OptsKind {
    /// Appended to the URL. The payload is expected to be a query string.
    #[default]
    Query,
    /// Sent as the request body. The payload is expected to be JSON.
    Body,
}

/// Allows extensions to add additional parameters to the statistics request.
pub trait MeterStatisticsOptsBuilder: Send + Sync {
    fn kind(&self) -> OptsKind {
        OptsKind::Query
    }

    fn to_meter_statistics_query(&self) -> Result<String, Error>;
}

/// Filter, group and period options of the statistics request.
///
/// Fields with `None` are omitted from the query string.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MeterStatisticsOpts {
    #[serde(rename = "q.field", skip_serializing_if = "Option::is_none")]
    pub query_field: Option<String>,
    #[serde(rename = "q.op", skip_serializing_if = "Option::is_none")]
    pub query_op: Option<String>,
    #[serde(rename = "q.value", skip_serializing_if = "Option::is_none")]
    pub query_value: Option<String>,
    /// Optional group by.
    #[serde(rename = "groupby", skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Optional number of seconds in a period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u64>,
}

/// The same options as [`MeterStatisticsOpts`] but sent as a JSON body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeterStatisticsBodyOpts(pub MeterStatisticsOpts);

/// A meter resource.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Meter {
    pub meter_id: String,
    pub name: String,
    pub project_id: Option<String>,
    pub resource_id: String,
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub meter_type: String,
    pub unit: String,
    pub user_id: Option<String>,
}

/// Aggregated values of a meter within one period (and group).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Statistics {
    pub avg: Option<f64>,
    pub count: u64,
    pub duration: Option<f64>,
    pub duration_start: Option<String>,
    pub duration_end: Option<String>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub period: u64,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub sum: Option<f64>,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groupby: Option<Map<String, Value>>,
}

/// The raw result of [`list`]. Check `err` before using `body`.
#[derive(Debug, Default)]
pub struct ListResult {
    /// The response body. Empty when `err` is set.
    pub body: Bytes,
    pub err: Option<Error>,
}

/// The raw result of [`meter_statistics`]. Check `err` before using `body`.
#[derive(Debug, Default)]
pub struct StatisticsResult {
    /// The response body. Empty when `err` is set.
    pub body: Bytes,
    pub err: Option<Error>,
}

#[derive(Serialize)]
struct StatisticsBody<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    q: Vec<StatisticsBodyQuery<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groupby: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<u64>,
}

#[derive(Serialize)]
struct StatisticsBodyQuery<'a> {
    field: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    op: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
}

const API_VERSION: &'static str = "v2";
const METERS: &'static str = "meters";
const STATISTICS: &'static str = "statistics";

impl ListOptsBuilder for ListOpts {
    fn to_meter_list_query(&self) -> Result<String, Error> {
        build_query_string(self)
    }
}

impl MeterStatisticsOptsBuilder for MeterStatisticsOpts {
    fn to_meter_statistics_query(&self) -> Result<String, Error> {
        build_query_string(self)
    }
}

impl MeterStatisticsOptsBuilder for MeterStatisticsBodyOpts {
    fn kind(&self) -> OptsKind {
        OptsKind::Body
    }

    fn to_meter_statistics_query(&self) -> Result<String, Error> {
        let opts = &self.0;
        let mut q = vec![];
        if let Some(field) = opts.query_field.as_ref() {
            q.push(StatisticsBodyQuery {
                field: field.as_str(),
                op: opts.query_op.as_deref(),
                value: opts.query_value.as_deref(),
            });
        }
        let body = StatisticsBody {
            q,
            groupby: match opts.group_by.as_ref() {
                None => None,
                Some(group_by) => Some(group_by.split(',').map(|x| x.trim()).collect()),
            },
            period: opts.period,
        };
        match serde_json::to_string(&body) {
            Err(e) => Err(Error::Encoding(e.to_string())),
            Ok(body) => Ok(body),
        }
    }
}

impl fmt::Display for OptsKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptsKind::Query => write!(f, "Query"),
            OptsKind::Body => write!(f, "Body"),
        }
    }
}

impl FromStr for OptsKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("query") {
            return Ok(OptsKind::Query);
        } else if s.eq_ignore_ascii_case("body") {
            return Ok(OptsKind::Body);
        }
        Err(Error::UnsupportedKind(s.to_string()))
    }
}

impl ListResult {
    /// To decode the meter list.
    pub fn extract(self) -> Result<Vec<Meter>, Error> {
        extract(self.body, self.err)
    }
}

impl From<Result<Bytes, Error>> for ListResult {
    fn from(result: Result<Bytes, Error>) -> Self {
        match result {
            Err(e) => ListResult {
                err: Some(e),
                ..Default::default()
            },
            Ok(body) => ListResult { body, err: None },
        }
    }
}

impl StatisticsResult {
    /// To decode the statistics list.
    pub fn extract(self) -> Result<Vec<Statistics>, Error> {
        extract(self.body, self.err)
    }
}

impl From<Result<Bytes, Error>> for StatisticsResult {
    fn from(result: Result<Bytes, Error>) -> Self {
        match result {
            Err(e) => StatisticsResult {
                err: Some(e),
                ..Default::default()
            },
            Ok(body) => StatisticsResult { body, err: None },
        }
    }
}

/// `<endpoint>/v2/meters`
pub fn list_url<C: ServiceClient + ?Sized>(client: &C) -> Result<String, Error> {
    client.service_url(&[API_VERSION, METERS])
}

/// `<endpoint>/v2/meters/{name}/statistics`
pub fn statistics_url<C: ServiceClient + ?Sized>(client: &C, name: &str) -> Result<String, Error> {
    match name {
        "" => return Err(Error::Url("empty meter name".to_string())),
        "." | ".." => return Err(Error::Url(format!("invalid meter name: {}", name))),
        _ => (),
    }
    client.service_url(&[API_VERSION, METERS, name, STATISTICS])
}

/// `GET /v2/meters`
///
/// Lists meters accessible to you. Marshaling errors are returned without a request.
pub async fn list<C: ServiceClient + ?Sized>(
    client: &C,
    opts: Option<&dyn ListOptsBuilder>,
) -> ListResult {
    const FN_NAME: &'static str = "list";

    let mut url = match list_url(client) {
        Err(e) => {
            return ListResult {
                err: Some(e),
                ..Default::default()
            };
        }
        Ok(url) => url,
    };
    if let Some(opts) = opts {
        match opts.to_meter_list_query() {
            Err(e) => {
                warn!("[{}] build query error: {}", FN_NAME, e);
                return ListResult {
                    err: Some(e),
                    ..Default::default()
                };
            }
            Ok(query) => url.push_str(query.as_str()),
        }
    }

    debug!("[{}] GET {}", FN_NAME, url);
    client.get(url.as_str(), &RequestOpts::default()).await.into()
}

/// `GET /v2/meters/{name}/statistics`
///
/// Gathers statistics based on filters, groups and period options. The options payload is
/// appended to the URL or sent as the body according to [`MeterStatisticsOptsBuilder::kind`].
/// Marshaling errors are returned without a request.
pub async fn meter_statistics<C: ServiceClient + ?Sized>(
    client: &C,
    name: &str,
    opts: Option<&dyn MeterStatisticsOptsBuilder>,
) -> StatisticsResult {
    const FN_NAME: &'static str = "meter_statistics";

    let mut url = match statistics_url(client, name) {
        Err(e) => {
            return StatisticsResult {
                err: Some(e),
                ..Default::default()
            };
        }
        Ok(url) => url,
    };
    let mut req_opts = RequestOpts::default();
    if let Some(opts) = opts {
        let kind = opts.kind();
        let payload = match opts.to_meter_statistics_query() {
            Err(e) => {
                warn!("[{}] build {} options error: {}", FN_NAME, kind, e);
                return StatisticsResult {
                    err: Some(e),
                    ..Default::default()
                };
            }
            Ok(payload) => payload,
        };
        match kind {
            OptsKind::Query => url.push_str(payload.as_str()),
            OptsKind::Body => req_opts.body = Some(payload),
        }
    }

    debug!(
        "[{}] GET {} (body: {})",
        FN_NAME,
        url,
        req_opts.body.is_some()
    );
    client.get(url.as_str(), &req_opts).await.into()
}

fn extract<T: DeserializeOwned>(body: Bytes, err: Option<Error>) -> Result<Vec<T>, Error> {
    if let Some(e) = err {
        return Err(e);
    }
    match serde_json::from_slice::<Vec<T>>(body.as_ref()) {
        Err(e) => Err(Error::Decode(e.to_string())),
        Ok(list) => Ok(list),
    }
}
