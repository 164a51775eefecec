//! Field extraction through a pre-trained document model.
//!
//! [`FormRecognizerClient`] talks to the Azure Form Recognizer (Document
//! Intelligence) REST API: it submits one page image, polls the long-running
//! operation and flattens the analyzed documents into [`FieldRecord`]s.

use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::ServiceConfig;
use crate::error::ExtractError;
use crate::model::FieldRecord;

pub const API_VERSION: &str = "2023-07-31";
const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";
const OPERATION_LOCATION_HEADER: &str = "operation-location";

pub trait FieldExtractor {
    /// Analyzes one page image and returns every field the model recognized, in service order.
    fn analyze(&self, model_id: &str, image: &[u8]) -> Result<Vec<FieldRecord>, ExtractError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    documents: Vec<AnalyzedDocument>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedDocument {
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzedField {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    value_string: Option<String>,
    #[serde(default)]
    value_date: Option<String>,
    #[serde(default)]
    value_time: Option<String>,
    #[serde(default)]
    value_phone_number: Option<String>,
    #[serde(default)]
    value_selection_mark: Option<String>,
    #[serde(default)]
    value_country_region: Option<String>,
    #[serde(default)]
    value_number: Option<f64>,
    #[serde(default)]
    value_integer: Option<i64>,
    #[serde(default)]
    value_boolean: Option<bool>,
    #[serde(default)]
    value_currency: Option<CurrencyValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyValue {
    amount: f64,
    #[serde(default)]
    currency_symbol: Option<String>,
    #[serde(default)]
    currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorEnvelope {
    error: ServiceErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl AnalyzedField {
    /// Scalar value as text; arrays, objects, addresses and signatures have none.
    fn scalar_value(&self) -> Option<String> {
        if let Some(text) = [
            &self.value_string,
            &self.value_date,
            &self.value_time,
            &self.value_phone_number,
            &self.value_selection_mark,
            &self.value_country_region,
        ]
        .into_iter()
        .flatten()
        .next()
        {
            return Some(text.clone());
        }

        if let Some(number) = self.value_number {
            return Some(number.to_string());
        }
        if let Some(integer) = self.value_integer {
            return Some(integer.to_string());
        }
        if let Some(flag) = self.value_boolean {
            return Some(flag.to_string());
        }
        self.value_currency.as_ref().map(|currency| {
            match currency
                .currency_symbol
                .as_deref()
                .or(currency.currency_code.as_deref())
            {
                Some(symbol) => format!("{symbol}{}", currency.amount),
                None => currency.amount.to_string(),
            }
        })
    }
}

/// Flattens a finished analyze operation into field records, document by document.
fn records_from_operation(operation: AnalyzeOperation) -> Result<Vec<FieldRecord>, ExtractError> {
    let Some(result) = operation.analyze_result else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for document in result.documents {
        for (name, raw) in document.fields {
            let field = serde_json::from_value::<AnalyzedField>(raw)?;
            records.push(FieldRecord {
                value: field.scalar_value(),
                content: field.content.clone(),
                confidence: field.confidence,
                name,
            });
        }
    }
    Ok(records)
}

fn service_error(status: StatusCode, body: &str) -> ExtractError {
    match serde_json::from_str::<ServiceErrorEnvelope>(body) {
        Ok(envelope) => ExtractError::Service(format!(
            "status {status}: {} ({})",
            envelope.error.message, envelope.error.code
        )),
        Err(_) => ExtractError::Service(format!("status {status}: {}", body.trim())),
    }
}

pub struct FormRecognizerClient {
    client: Client,
    endpoint: Url,
    key: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl FormRecognizerClient {
    pub fn new(
        config: &ServiceConfig,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        tracing::info!(endpoint = %config.endpoint(), model = config.model_id(), "form recognizer client ready");
        Ok(Self {
            client,
            endpoint: config.endpoint().clone(),
            key: config.key().to_string(),
            poll_interval,
            max_polls,
        })
    }

    fn analyze_url(&self, model_id: &str) -> Result<Url, ExtractError> {
        let path = format!(
            "formrecognizer/documentModels/{}:analyze",
            urlencoding::encode(model_id)
        );
        let mut url = self
            .endpoint
            .join(&path)
            .map_err(|error| ExtractError::Config(format!("invalid analyze URL: {error}")))?;
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    fn auth_headers(&self) -> Result<HeaderMap, ExtractError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            HeaderValue::from_str(&self.key)
                .map_err(|_| ExtractError::Config("invalid access key format".to_string()))?,
        );
        Ok(headers)
    }

    fn submit(&self, model_id: &str, image: &[u8]) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(self.analyze_url(model_id)?)
            .headers(self.auth_headers()?)
            .header(CONTENT_TYPE, "image/png")
            .body(image.to_vec())
            .send()?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().unwrap_or_default();
            return Err(service_error(status, &body));
        }

        response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ExtractError::Service("analyze response has no Operation-Location header".into())
            })
    }

    fn poll(&self, operation_url: &str) -> Result<AnalyzeOperation, ExtractError> {
        for attempt in 0..self.max_polls {
            if attempt > 0 {
                thread::sleep(self.poll_interval);
            }

            let response = self
                .client
                .get(operation_url)
                .headers(self.auth_headers()?)
                .send()?;
            let status = response.status();
            let body = response.text()?;
            if status.is_client_error() || status.is_server_error() {
                return Err(service_error(status, &body));
            }

            let operation = serde_json::from_str::<AnalyzeOperation>(&body)?;
            match operation.status.as_str() {
                "succeeded" => return Ok(operation),
                "failed" => {
                    let detail = operation.error.map_or_else(
                        || "analysis failed".to_string(),
                        |error| format!("{} ({})", error.message, error.code),
                    );
                    return Err(ExtractError::Service(detail));
                }
                other => tracing::trace!(attempt, status = other, "analysis still running"),
            }
        }

        Err(ExtractError::Service(format!(
            "analysis did not finish after {} polls",
            self.max_polls
        )))
    }
}

impl FieldExtractor for FormRecognizerClient {
    fn analyze(&self, model_id: &str, image: &[u8]) -> Result<Vec<FieldRecord>, ExtractError> {
        let operation_url = self.submit(model_id, image)?;
        let operation = self.poll(&operation_url)?;
        records_from_operation(operation)
    }
}
