use custbench_core::{ClassifiedError, ErrorCategory};

use crate::types::{ApiErrorBody, ErrorEnvelope};

/// Maps a non-2xx API response to a [`ClassifiedError`].
///
/// The specific `code` wins over the broader error `type`; bodies that are not API error
/// envelopes fall back to the HTTP status.
pub fn classify_error_body(status: u16, body: &[u8]) -> ClassifiedError {
    let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) else {
        let snippet = String::from_utf8_lossy(body);
        let snippet = snippet.trim();
        let message = if snippet.is_empty() {
            format!("http status {status}")
        } else {
            format!("http status {status}: {}", truncate(snippet, 200))
        };
        return ClassifiedError::new(category_for_status(status), message);
    };

    let err = envelope.error;
    let category = err
        .code
        .as_deref()
        .and_then(category_for_code)
        .or_else(|| err.kind.as_deref().and_then(category_for_type))
        .unwrap_or_else(|| category_for_status(status));

    ClassifiedError::new(category, describe(&err, status))
}

pub(crate) fn classify_transport(err: &custbench_http::Error) -> ClassifiedError {
    ClassifiedError::new(
        ErrorCategory::Transport,
        format!("{} ({})", err, err.stage()),
    )
}

fn category_for_code(code: &str) -> Option<ErrorCategory> {
    match code {
        "card_declined" => Some(ErrorCategory::CardDeclined),
        "expired_card" => Some(ErrorCategory::ExpiredCard),
        "incorrect_cvc" | "invalid_cvc" => Some(ErrorCategory::IncorrectCvc),
        "incorrect_zip" => Some(ErrorCategory::IncorrectZip),
        _ => None,
    }
}

fn category_for_type(kind: &str) -> Option<ErrorCategory> {
    match kind {
        "card_error" => Some(ErrorCategory::CardDeclined),
        "invalid_request_error" => Some(ErrorCategory::InvalidRequest),
        "authentication_error" => Some(ErrorCategory::Authentication),
        "rate_limit_error" => Some(ErrorCategory::RateLimited),
        "api_error" => Some(ErrorCategory::Api),
        _ => None,
    }
}

fn category_for_status(status: u16) -> ErrorCategory {
    match status {
        401 => ErrorCategory::Authentication,
        429 => ErrorCategory::RateLimited,
        400 | 404 => ErrorCategory::InvalidRequest,
        500..=599 => ErrorCategory::Api,
        _ => ErrorCategory::Other,
    }
}

fn describe(err: &ApiErrorBody, status: u16) -> String {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| format!("http status {status}"));

    match (&err.kind, &err.decline_code) {
        (Some(kind), Some(decline)) if kind == "card_error" => {
            format!("{message} (decline code: {decline})")
        }
        _ => message,
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_decline_keeps_decline_code_in_message() {
        let body = br#"{"error":{"type":"card_error","code":"card_declined","decline_code":"insufficient_funds","message":"Your card was declined."}}"#;
        let err = classify_error_body(402, body);

        assert_eq!(err.category, ErrorCategory::CardDeclined);
        assert_eq!(
            err.message,
            "Your card was declined. (decline code: insufficient_funds)"
        );
    }

    #[test]
    fn code_takes_precedence_over_type() {
        let body = br#"{"error":{"type":"card_error","code":"expired_card","message":"Your card has expired."}}"#;
        assert_eq!(
            classify_error_body(402, body).category,
            ErrorCategory::ExpiredCard
        );

        let body = br#"{"error":{"type":"card_error","code":"incorrect_zip","message":"bad zip"}}"#;
        assert_eq!(
            classify_error_body(402, body).category,
            ErrorCategory::IncorrectZip
        );
    }

    #[test]
    fn type_is_used_when_code_is_unknown() {
        let body = br#"{"error":{"type":"invalid_request_error","code":"parameter_unknown","message":"Received unknown parameter: foo"}}"#;
        let err = classify_error_body(400, body);
        assert_eq!(err.category, ErrorCategory::InvalidRequest);
        assert_eq!(err.message, "Received unknown parameter: foo");
    }

    #[test]
    fn non_envelope_bodies_fall_back_to_status() {
        let err = classify_error_body(503, b"<html>upstream unavailable</html>");
        assert_eq!(err.category, ErrorCategory::Api);
        assert!(err.message.starts_with("http status 503: <html>"));

        let err = classify_error_body(429, b"");
        assert_eq!(err.category, ErrorCategory::RateLimited);
        assert_eq!(err.message, "http status 429");

        assert_eq!(classify_error_body(418, b"{}").category, ErrorCategory::Other);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
