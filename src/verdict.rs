//! Review status codes and the messages sent for them.
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::practicum::model::json_kind;
use crate::practicum::HomeworkRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "approved" => Some(HomeworkStatus::Approved),
            "reviewing" => Some(HomeworkStatus::Reviewing),
            "rejected" => Some(HomeworkStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// A homework record we cannot turn into a message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("homework record is malformed: {0}")]
    MalformedRecord(String),
    #[error("homework has no name")]
    MissingName,
    #[error("homework has no status")]
    MissingStatus,
    #[error("unknown homework status `{0}`")]
    UnknownStatus(String),
}

/// Decode the homework record picked from a response.
pub fn decode_record(value: &Value) -> Result<HomeworkRecord, RenderError> {
    let res = if value.is_object() {
        HomeworkRecord::deserialize(value)
            .map_err(|err| RenderError::MalformedRecord(err.to_string()))
    } else {
        Err(RenderError::MalformedRecord(format!(
            "expected an object, got {}",
            json_kind(value)
        )))
    };
    if let Err(err) = &res {
        error!(%err, %value, "cannot decode homework record");
    }
    res
}

/// Render the status-change message for a homework record.
pub fn parse_status(record: &HomeworkRecord) -> Result<String, RenderError> {
    let res = render(record);
    if let Err(err) = &res {
        error!(%err, ?record, "cannot render homework status");
    }
    res
}

fn render(record: &HomeworkRecord) -> Result<String, RenderError> {
    let name = non_empty(&record.homework_name).ok_or(RenderError::MissingName)?;
    let code = non_empty(&record.status).ok_or(RenderError::MissingStatus)?;
    let status =
        HomeworkStatus::parse(code).ok_or_else(|| RenderError::UnknownStatus(code.to_string()))?;
    Ok(format!(
        "Изменился статус проверки работы \"{}\". {}",
        name,
        status.verdict()
    ))
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: Option<&str>, status: Option<&str>) -> HomeworkRecord {
        HomeworkRecord {
            homework_name: name.map(str::to_string),
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn renders_every_known_status() {
        for status in [
            HomeworkStatus::Approved,
            HomeworkStatus::Reviewing,
            HomeworkStatus::Rejected,
        ] {
            assert_eq!(HomeworkStatus::parse(status.as_str()), Some(status));
            let msg = parse_status(&record(Some("hw1"), Some(status.as_str()))).unwrap();
            assert!(msg.contains("\"hw1\""));
            assert!(msg.ends_with(status.verdict()));
        }
    }

    #[test]
    fn approved_message_is_exact() {
        let msg = parse_status(&record(Some("hw1"), Some("approved"))).unwrap();
        assert_eq!(
            msg,
            "Изменился статус проверки работы \"hw1\". Работа проверена: ревьюеру всё понравилось. Ура!"
        );
    }

    #[test]
    fn unknown_status_is_an_error() {
        for code in ["unknown_code", "APPROVED", "approved "] {
            let err = parse_status(&record(Some("hw2"), Some(code))).unwrap_err();
            assert_eq!(err, RenderError::UnknownStatus(code.into()));
        }
    }

    #[test]
    fn missing_name_or_status_is_an_error() {
        assert_eq!(
            parse_status(&record(None, Some("approved"))),
            Err(RenderError::MissingName)
        );
        assert_eq!(
            parse_status(&record(Some(""), Some("approved"))),
            Err(RenderError::MissingName)
        );
        assert_eq!(
            parse_status(&record(Some("hw1"), None)),
            Err(RenderError::MissingStatus)
        );
        assert_eq!(
            parse_status(&record(Some("hw1"), Some(""))),
            Err(RenderError::MissingStatus)
        );
    }

    #[test]
    fn blank_name_is_still_a_name() {
        let msg = parse_status(&record(Some("  "), Some("reviewing"))).unwrap();
        assert!(msg.starts_with("Изменился статус проверки работы \"  \"."));
    }

    #[test]
    fn decode_record_reads_name_and_status() {
        let rec =
            decode_record(&json!({ "homework_name": "hw1", "status": "approved", "id": 3 }))
                .unwrap();
        assert_eq!(rec, record(Some("hw1"), Some("approved")));

        let rec = decode_record(&json!({ "id": 3 })).unwrap();
        assert_eq!(rec, HomeworkRecord::default());
    }

    #[test]
    fn decode_record_rejects_malformed_entries() {
        for bad in [
            json!(42),
            json!(null),
            json!(["hw1", "approved"]),
            json!({ "homework_name": 5 }),
        ] {
            assert!(matches!(
                decode_record(&bad),
                Err(RenderError::MalformedRecord(_))
            ));
        }
    }
}
