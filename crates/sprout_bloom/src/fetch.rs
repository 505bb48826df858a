//! The network seam used by fetch effects.

use std::cell::RefCell;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde_json::Value;
use sprout_sap::EffectError;
use sprout_seed::FetchStage;

use crate::value::to_display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetch failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<FetchError> for EffectError {
    fn from(error: FetchError) -> Self {
        EffectError::new(error.to_string())
    }
}

pub type FetchResult = Result<FetchResponse, FetchError>;

pub type Respond = Box<dyn FnOnce(FetchResult)>;

/// Performs requests for fetch effects. `respond` may be called right away
/// or later; it must be called at most once.
pub trait Fetcher {
    fn fetch(&self, url: &str, respond: Respond);
}

/// Answers from a fixed table; unknown URLs get a 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    routes: FxHashMap<String, FetchResponse>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: impl Into<String>, response: FetchResponse) -> Self {
        self.routes.insert(url.into(), response);
        self
    }

    /// Serve `value` serialized as JSON.
    pub fn json(self, url: impl Into<String>, value: &Value) -> Self {
        self.route(url, FetchResponse::ok(value.to_string()))
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str, respond: Respond) {
        let response = self
            .routes
            .get(url)
            .cloned()
            .unwrap_or(FetchResponse {
                status: 404,
                body: String::new(),
            });
        respond(Ok(response));
    }
}

/// Holds requests until they are answered explicitly, in any order.
#[derive(Default)]
pub struct DeferredFetcher {
    pending: RefCell<VecDeque<(String, Respond)>>,
}

impl DeferredFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs of the requests still waiting, oldest first.
    pub fn pending(&self) -> Vec<String> {
        self.pending
            .borrow()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Answer the oldest pending request for `url`. Returns false when there
    /// is none.
    pub fn resolve(&self, url: &str, result: FetchResult) -> bool {
        let respond = {
            let mut pending = self.pending.borrow_mut();
            let Some(position) = pending.iter().position(|(u, _)| u == url) else {
                return false;
            };
            pending.remove(position).map(|(_, respond)| respond)
        };
        match respond {
            Some(respond) => {
                respond(result);
                true
            }
            None => false,
        }
    }
}

impl Fetcher for DeferredFetcher {
    fn fetch(&self, url: &str, respond: Respond) {
        self.pending
            .borrow_mut()
            .push_back((url.to_string(), respond));
    }
}

/// Run a response through the pipeline stages. Without a body stage the
/// body is kept as text.
pub fn apply_stages(
    response: FetchResponse,
    stages: &[FetchStage],
) -> Result<Value, FetchError> {
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    if stages.is_empty() {
        return Ok(Value::String(response.body));
    }
    let mut body = Some(response.body);
    let mut value = Value::Null;
    for stage in stages {
        match stage {
            FetchStage::Json => {
                let text = body.take().unwrap_or_default();
                value = serde_json::from_str(&text).map_err(|e| FetchError::Json(e.to_string()))?;
            }
            FetchStage::Text => value = Value::String(body.take().unwrap_or_default()),
            FetchStage::Field(path) => {
                for field in path {
                    value = match &value {
                        Value::Object(fields) => {
                            fields.get(field.as_str()).cloned().unwrap_or(Value::Null)
                        }
                        Value::Array(items) if field.as_str() == "length" => {
                            Value::from(items.len())
                        }
                        _ => Value::Null,
                    };
                }
            }
        }
    }
    Ok(value)
}

/// Short description of a value for log lines.
pub(crate) fn describe(value: &Value) -> String {
    let mut text = to_display(value);
    if text.len() > 40 {
        let cut = (0..=40).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
