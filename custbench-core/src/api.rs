use std::future::Future;

/// A customer record created by the remote payment API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
}

/// Coarse failure category reported by the remote call boundary.
///
/// The runner never acts on the category beyond reporting it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    CardDeclined,
    ExpiredCard,
    IncorrectCvc,
    IncorrectZip,
    InvalidRequest,
    Authentication,
    RateLimited,
    Api,
    /// The request never produced an API response (connect failure, timeout, body read).
    Transport,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category}: {message}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// The single remote operation a run exercises.
pub trait CustomerApi: Send + Sync + 'static {
    fn create_customer(
        &self,
        description: String,
    ) -> impl Future<Output = Result<Customer, ClassifiedError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_snake_case() {
        assert_eq!(ErrorCategory::CardDeclined.to_string(), "card_declined");
        assert_eq!(
            "incorrect_cvc".parse::<ErrorCategory>(),
            Ok(ErrorCategory::IncorrectCvc)
        );
        assert!("nope".parse::<ErrorCategory>().is_err());
    }

    #[test]
    fn classified_error_display_includes_category() {
        let err = ClassifiedError::new(ErrorCategory::ExpiredCard, "Your card has expired.");
        assert_eq!(err.to_string(), "expired_card: Your card has expired.");
    }
}
