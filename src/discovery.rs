// Discovery - Extracts the service instance logs endpoint from service
// metadata returned by the platform's `/v2/services` API

use crate::error::{Result, SilError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ServicesResponse {
    total_results: u64,
    #[serde(default)]
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    entity: ServiceEntity,
}

#[derive(Debug, Deserialize)]
struct ServiceEntity {
    /// JSON document encoded as a string
    #[serde(default)]
    extra: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceExtra {
    #[serde(rename = "serviceInstanceLogsEndpoint", default)]
    service_instance_logs_endpoint: String,
}

/// Extract the logs endpoint from a `/v2/services` response body
pub fn logs_endpoint_from_services(body: &str) -> Result<String> {
    let services: ServicesResponse = serde_json::from_str(body).map_err(|e| {
        SilError::UpstreamMetadata(format!("/v2/services returned invalid JSON: {}", e))
    })?;

    let resource = match services.resources.first() {
        Some(resource) if services.total_results > 0 => resource,
        _ => {
            return Err(SilError::UpstreamMetadata(
                "/v2/services did not return the service instance".to_string(),
            ))
        }
    };

    let extra = resource.entity.extra.as_deref().unwrap_or("");
    let extra: ServiceExtra = serde_json::from_str(extra).map_err(|e| {
        SilError::UpstreamMetadata(format!(
            "/v2/services 'extra' field contained invalid JSON: {}",
            e
        ))
    })?;

    if extra.service_instance_logs_endpoint.is_empty() {
        return Err(SilError::UpstreamMetadata(
            "/v2/services did not contain a service instance logs endpoint: maybe the broker version is too old"
                .to_string(),
        ));
    }

    Ok(extra.service_instance_logs_endpoint)
}
