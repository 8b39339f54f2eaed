use std::time::Duration;

use custbench_core::{ClassifiedError, Customer, CustomerApi, ErrorCategory};
use custbench_http::{HttpClient, HttpRequest};

use crate::classify::{classify_error_body, classify_transport};
use crate::types::CustomerBody;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

const CUSTOMERS_PATH: &str = "/v1/customers";

/// Creates customers through the payments REST API.
///
/// One HTTP request per call; failures are never retried.
#[derive(Clone)]
pub struct StripeClient {
    http: HttpClient,
    authorization: String,
    customers_url: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("customers_url", &self.customers_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::EmptyApiKey);
        }

        let parsed = url::Url::parse(base_url)
            .map_err(|err| Error::InvalidBaseUrl(base_url.to_string(), err))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::UnsupportedScheme(base_url.to_string()));
        }

        Ok(Self {
            http: HttpClient::default(),
            authorization: format!("Bearer {api_key}"),
            customers_url: format!("{}{CUSTOMERS_PATH}", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn customers_url(&self) -> &str {
        &self.customers_url
    }
}

impl CustomerApi for StripeClient {
    async fn create_customer(&self, description: String) -> std::result::Result<Customer, ClassifiedError> {
        let req = HttpRequest::post_form(
            &self.customers_url,
            [("description", description.as_str())],
        )
        .with_header("authorization", self.authorization.as_str())
        .with_timeout(self.timeout);

        let res = match self.http.request(req).await {
            Ok(res) => res,
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    stage = %err.stage(),
                    "create customer transport failure"
                );
                return Err(classify_transport(&err));
            }
        };

        if !res.is_success() {
            let err = classify_error_body(res.status, &res.body);
            tracing::debug!(
                status = res.status,
                request_id = res.header("request-id"),
                category = %err.category,
                "create customer rejected"
            );
            return Err(err);
        }

        match serde_json::from_slice::<CustomerBody>(&res.body) {
            Ok(body) => Ok(Customer { id: body.id }),
            Err(err) => {
                tracing::warn!(status = res.status, error = %err, "unreadable customer body");
                Err(ClassifiedError::new(
                    ErrorCategory::Api,
                    format!("unreadable customer body: {err}"),
                ))
            }
        }
    }
}
