//! Sample source backed by the FIWARE STH-Comet historical API.
//!
//! Fetches the last `lastN` raw values of one attribute of one entity and
//! converts them into [`Sample`]s, rejecting anything that does not parse.

use crate::config::SourceSection;
use crate::error::SourceError;
use crate::metrics::Sample;
use crate::source::SampleSource;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

const FIWARE_SERVICE_HEADER: &str = "fiware-service";
const FIWARE_SERVICE_PATH_HEADER: &str = "fiware-servicepath";

pub struct SthSource {
    client: reqwest::Client,
    url: String,
    fiware_service: String,
    fiware_service_path: String,
    entity_id: String,
}

impl SthSource {
    pub fn from_config(section: &SourceSection) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: raw_values_url(section),
            fiware_service: section.fiware_service.clone(),
            fiware_service_path: section.fiware_service_path.clone(),
            entity_id: section.entity_id.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for SthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SthSource")
            .field("url", &self.url)
            .field("fiware_service", &self.fiware_service)
            .field("fiware_service_path", &self.fiware_service_path)
            .finish()
    }
}

impl SampleSource for SthSource {
    async fn fetch_samples(&self) -> Result<Vec<Sample>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(FIWARE_SERVICE_HEADER, &self.fiware_service)
            .header(FIWARE_SERVICE_PATH_HEADER, &self.fiware_service_path)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Transport(format!(
                "http status {} ({})",
                status.as_u16(),
                body.trim()
            )));
        }

        let body = response.text().await?;
        let samples = parse_raw_values(&body, &self.entity_id)?;
        debug!(count = samples.len(), url = %self.url, "Fetched samples from STH");
        Ok(samples)
    }
}

fn raw_values_url(section: &SourceSection) -> String {
    format!(
        "{}/STH/v1/contextEntities/type/{}/id/{}/attributes/{}?lastN={}",
        section.base_url.trim_end_matches('/'),
        section.entity_type,
        section.entity_id,
        section.attribute,
        section.last_n
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValuesResponse {
    #[serde(default)]
    context_responses: Vec<ContextResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextResponse {
    context_element: ContextElement,
}

#[derive(Debug, Deserialize)]
struct ContextElement {
    #[serde(default)]
    attributes: Vec<AttributeHistory>,
}

#[derive(Debug, Deserialize)]
struct AttributeHistory {
    #[serde(default)]
    values: Vec<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValue {
    recv_time: String,
    attr_value: serde_json::Value,
}

/// Decode an STH raw-values body. Samples come back in the order STH sent them.
pub fn parse_raw_values(body: &str, entity_id: &str) -> Result<Vec<Sample>, SourceError> {
    let response: RawValuesResponse =
        serde_json::from_str(body).map_err(|err| SourceError::Malformed(err.to_string()))?;

    let attribute = response
        .context_responses
        .into_iter()
        .next()
        .and_then(|context| context.context_element.attributes.into_iter().next())
        .ok_or_else(|| SourceError::EmptyResult {
            entity_id: entity_id.to_string(),
        })?;

    attribute.values.iter().map(to_sample).collect()
}

fn to_sample(raw: &RawValue) -> Result<Sample, SourceError> {
    let timestamp = OffsetDateTime::parse(&raw.recv_time, &Rfc3339).map_err(|err| {
        SourceError::Malformed(format!("invalid recvTime '{}': {err}", raw.recv_time))
    })?;
    let distance_cm = parse_distance(&raw.attr_value)?;
    Ok(Sample::new(timestamp, distance_cm))
}

fn parse_distance(value: &serde_json::Value) -> Result<f64, SourceError> {
    let parsed = match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(distance) if distance.is_finite() => Ok(distance),
        _ => Err(SourceError::Malformed(format!(
            "attrValue is not a finite number: {value}"
        ))),
    }
}
