use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

/// A response body whose shape no longer matches the homework-status API.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("response body is {0}, expected an object")]
    NotAnObject(&'static str),
    #[error("response has no `homeworks` field")]
    MissingHomeworks,
    #[error("`homeworks` is {0}, expected a list")]
    HomeworksNotAList(&'static str),
}

/// One entry of `homeworks`. Fields other than name and status are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HomeworkRecord {
    #[serde(default)]
    pub homework_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Newest first, as returned by the API. Entries are decoded only when
    /// inspected.
    pub homeworks: Vec<Value>,
    pub current_date: Option<i64>,
}

impl ApiResponse {
    /// The most recent homework. Relies on the API ordering `homeworks`
    /// newest first; nothing in the payload lets us check that.
    pub fn latest(&self) -> Option<&Value> {
        self.homeworks.first()
    }
}

/// Validate a decoded body against the API contract: an object whose
/// `homeworks` field is a list.
pub fn check_response(body: Value) -> Result<ApiResponse, ContractError> {
    let res = parse_response(body);
    if let Err(err) = &res {
        error!(critical = true, %err, "response does not match the API contract");
    }
    res
}

fn parse_response(body: Value) -> Result<ApiResponse, ContractError> {
    let mut body = match body {
        Value::Object(map) => map,
        other => return Err(ContractError::NotAnObject(json_kind(&other))),
    };

    let homeworks = match body.remove("homeworks") {
        Some(Value::Array(items)) => items,
        Some(other) => return Err(ContractError::HomeworksNotAList(json_kind(&other))),
        None => return Err(ContractError::MissingHomeworks),
    };

    let current_date = body.get("current_date").and_then(Value::as_i64);

    Ok(ApiResponse {
        homeworks,
        current_date,
    })
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
