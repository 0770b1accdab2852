use super::{FilterError, MessageFilter};
use crate::event::Message;

use serde_json::Value;

/// Accepts messages whose JSON payload is truthy at a JSON pointer.
///
/// The selected value is included if it is:
/// - `true`
/// - a non-zero number
/// - a non-empty string
/// - a non-empty array
/// - any object
///
/// A pointer that selects nothing is treated as `null`.
#[derive(Clone, Debug)]
pub struct JsonPointerFilter {
    pointer: String,
}

impl JsonPointerFilter {
    /// Creates a filter for a JSON pointer such as `/payload/enabled`.
    ///
    /// # Errors
    /// Returns an error if the pointer is neither empty nor starts with `/`.
    pub fn new<P>(pointer: P) -> Result<Self, FilterError>
    where
        P: Into<String>,
    {
        let pointer = pointer.into();
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(FilterError::Evaluation(format!(
                "pointer '{pointer}' must be empty or start with '/'"
            )));
        }
        Ok(Self { pointer })
    }

    /// The pointer evaluated by the filter.
    #[must_use]
    pub fn pointer(&self) -> &str {
        &self.pointer
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

impl MessageFilter for JsonPointerFilter {
    fn is_included(&self, message: &Message) -> Result<bool, FilterError> {
        let document: Value = serde_json::from_slice(&message.payload)
            .map_err(|e| FilterError::Malformed(e.to_string()))?;

        Ok(document.pointer(&self.pointer).is_some_and(is_truthy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::QoS;

    fn check(payload: &str) -> Result<bool, FilterError> {
        let filter = JsonPointerFilter::new("/payload").unwrap();
        let message = Message::new(
            "sample/topic",
            QoS::AtMostOnce,
            format!(r#"{{"eventType":"sample-type","payload":{payload}}}"#),
        );
        filter.is_included(&message)
    }

    #[test]
    fn test_truthy_values() {
        for payload in [
            "true",
            "-1234.56789",
            "7",
            r#""false""#,
            r#""hello""#,
            "[0]",
            r#"{"greeting":"hello"}"#,
            "{}",
        ] {
            assert_eq!(check(payload), Ok(true), "payload {payload}");
        }
    }

    #[test]
    fn test_falsy_values() {
        for payload in ["false", "0.0", "0", r#""""#, "[]", "null"] {
            assert_eq!(check(payload), Ok(false), "payload {payload}");
        }
    }

    #[test]
    fn test_missing_pointer_is_rejected() {
        let filter = JsonPointerFilter::new("/payload/enabled").unwrap();
        let message = Message::new(
            "sample/topic",
            QoS::AtMostOnce,
            r#"{"eventType":"sample-type","payload":{"other":true}}"#,
        );
        assert_eq!(filter.is_included(&message), Ok(false));
    }

    #[test]
    fn test_malformed_payload() {
        let filter = JsonPointerFilter::new("/payload").unwrap();
        let message = Message::new("sample/topic", QoS::AtMostOnce, "{not json");
        assert!(matches!(
            filter.is_included(&message),
            Err(FilterError::Malformed(_))
        ));
    }

    #[test]
    fn test_invalid_pointer() {
        assert!(JsonPointerFilter::new("payload").is_err());
        assert!(JsonPointerFilter::new("").is_ok());
    }
}
