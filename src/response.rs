use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Body returned by every endpoint.
///
/// `filename` is only ever set on success and `error` only on failure; the
/// two constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl RenderResult {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: "PDF created successfully".into(),
            error: None,
            filename: Some(filename.into()),
        }
    }

    pub fn failure(err: &crate::Error) -> Self {
        Self {
            status: Status::Error,
            message: err.message(),
            error: Some(err.to_string()),
            filename: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Field};
    use serde_json::json;

    #[test]
    fn success_shape() {
        let value = serde_json::to_value(RenderResult::success("static/a.pdf")).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "message": "PDF created successfully",
                "filename": "static/a.pdf",
            })
        );
    }

    #[test]
    fn failure_shape() {
        let err = Error::MissingField(Field::Title);
        let value = serde_json::to_value(RenderResult::failure(&err)).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "error",
                "message": "Title is required",
                "error": "title is required",
            })
        );
    }
}
