//! CLI commands implementation

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// API client for communicating with the daemon
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// GPU metadata from API
#[derive(Debug, Deserialize)]
pub struct GpuResponse {
    pub id: u32,
    pub name: String,
    pub model: String,
    pub memory_gb: f64,
    pub host: String,
}

/// GPU with occupancy from API
#[derive(Debug, Deserialize)]
pub struct GpuStatusResponse {
    pub resource: GpuResponse,
    pub is_available_now: bool,
    pub current_reservation: Option<ReservationResponse>,
    pub next_reservation: Option<ReservationResponse>,
}

/// Reservation from API
#[derive(Debug, Deserialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub resource_id: u32,
    pub requester: String,
    pub purpose: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
}

/// Per-GPU availability from API
#[derive(Debug, Deserialize)]
pub struct AvailabilityEntry {
    pub is_free: bool,
    pub conflicting_reservations: Vec<ReservationResponse>,
}

/// Availability report from API
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resources: BTreeMap<u32, AvailabilityEntry>,
}

/// Error body from API
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

/// List GPUs with their current state
pub async fn gpus(client: &ApiClient) -> Result<()> {
    let response = client.client.get(client.url("/gpus")).send().await?;

    if response.status().is_success() {
        let gpus: Vec<GpuStatusResponse> = response.json().await?;

        if gpus.is_empty() {
            println!("No GPUs registered");
            return Ok(());
        }

        println!(
            "{:<4} {:<16} {:<12} {:>6} {:<14} {:<10} {}",
            "ID", "NAME", "MODEL", "MEM", "HOST", "STATE", "NEXT"
        );
        println!("{}", "-".repeat(90));
        for gpu in gpus {
            let state = match &gpu.current_reservation {
                Some(r) if !gpu.is_available_now => format!("busy ({})", r.requester),
                _ => "free".to_string(),
            };
            let next = gpu
                .next_reservation
                .as_ref()
                .map(|r| format_time(&r.start_time))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<4} {:<16} {:<12} {:>4}GB {:<14} {:<10} {}",
                gpu.resource.id,
                gpu.resource.name,
                gpu.resource.model,
                gpu.resource.memory_gb,
                gpu.resource.host,
                state,
                next
            );
        }
    } else {
        report_error("Failed to list GPUs", response).await?;
    }

    Ok(())
}

/// List reservations
pub async fn reservations(
    client: &ApiClient,
    gpu: Option<u32>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(gpu) = gpu {
        query.push(("resource_id", gpu.to_string()));
    }
    if let Some(start) = start {
        query.push(("start", start));
    }
    if let Some(end) = end {
        query.push(("end", end));
    }

    let response = client
        .client
        .get(client.url("/reservations"))
        .query(&query)
        .send()
        .await?;

    if response.status().is_success() {
        let reservations: Vec<ReservationResponse> = response.json().await?;

        if reservations.is_empty() {
            println!("No reservations found");
        } else {
            println!(
                "{:<36} {:<4} {:<12} {:<17} {:<17} {:<10} {}",
                "ID", "GPU", "USER", "START", "END", "STATUS", "PURPOSE"
            );
            println!("{}", "-".repeat(110));
            for r in reservations {
                print_reservation_row(&r);
            }
        }
    } else {
        report_error("Failed to list reservations", response).await?;
    }

    Ok(())
}

/// Create a reservation
pub async fn reserve(
    client: &ApiClient,
    gpu: u32,
    user: String,
    purpose: String,
    start: String,
    end: String,
) -> Result<()> {
    #[derive(Serialize)]
    struct CreateRequest {
        resource_id: u32,
        requester: String,
        purpose: String,
        start_time: String,
        end_time: String,
    }

    let req = CreateRequest {
        resource_id: gpu,
        requester: user,
        purpose,
        start_time: start,
        end_time: end,
    };

    debug!(gpu = gpu, "Submitting reservation");

    let response = client
        .client
        .post(client.url("/reservations"))
        .json(&req)
        .send()
        .await?;

    if response.status().is_success() {
        let r: ReservationResponse = response.json().await?;
        println!("Reservation created");
        print_reservation_details(&r);
    } else {
        report_error("Failed to create reservation", response).await?;
    }

    Ok(())
}

/// Cancel a reservation
pub async fn cancel(client: &ApiClient, id: Uuid) -> Result<()> {
    let response = client
        .client
        .delete(client.url(&format!("/reservations/{}", id)))
        .send()
        .await?;

    if response.status().is_success() {
        let r: ReservationResponse = response.json().await?;
        println!("Reservation {} cancelled", r.id);
    } else {
        report_error("Failed to cancel reservation", response).await?;
    }

    Ok(())
}

/// Show GPU availability over a window
pub async fn availability(client: &ApiClient, start: String, end: String) -> Result<()> {
    let response = client
        .client
        .get(client.url("/availability"))
        .query(&[("start", start), ("end", end)])
        .send()
        .await?;

    if response.status().is_success() {
        let report: AvailabilityResponse = response.json().await?;

        println!(
            "Availability {} -> {}",
            format_time(&report.start_time),
            format_time(&report.end_time)
        );
        println!();
        for (gpu, entry) in &report.resources {
            if entry.is_free {
                println!("[{}] free", gpu);
            } else {
                println!("[{}] reserved", gpu);
                for r in &entry.conflicting_reservations {
                    println!(
                        "      {} -> {} by {} ({})",
                        format_time(&r.start_time),
                        format_time(&r.end_time),
                        r.requester,
                        r.purpose
                    );
                }
            }
        }
    } else {
        report_error("Failed to check availability", response).await?;
    }

    Ok(())
}

/// Fail with the server error body rendered as `kind: message`
async fn report_error(context: &str, response: reqwest::Response) -> Result<()> {
    let status = response.status();
    let text = response.text().await?;
    anyhow::bail!("{}: {}", context, describe_error(status.as_u16(), &text))
}

fn describe_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => format!("{}: {}", err.kind, err.message),
        Err(_) if body.is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body),
    }
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn print_reservation_row(r: &ReservationResponse) {
    println!(
        "{:<36} {:<4} {:<12} {:<17} {:<17} {:<10} {}",
        r.id,
        r.resource_id,
        r.requester,
        format_time(&r.start_time),
        format_time(&r.end_time),
        r.status,
        r.purpose
    );
}

fn print_reservation_details(r: &ReservationResponse) {
    println!("  ID: {}", r.id);
    println!("  GPU: {}", r.resource_id);
    println!("  User: {}", r.requester);
    println!("  Purpose: {}", r.purpose);
    println!(
        "  Window: {} -> {} (UTC)",
        format_time(&r.start_time),
        format_time(&r.end_time)
    );
    println!("  Status: {}", r.status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_url() {
        let client = ApiClient::new("http://localhost:8000/api/");
        assert_eq!(client.url("/gpus"), "http://localhost:8000/api/gpus");
    }

    #[test]
    fn test_describe_error() {
        let body = r#"{"kind":"ConflictError","message":"Resource already reserved for that interval"}"#;
        assert_eq!(
            describe_error(409, body),
            "ConflictError: Resource already reserved for that interval"
        );
        assert_eq!(describe_error(502, ""), "HTTP 502");
        assert_eq!(describe_error(400, "bad json"), "HTTP 400: bad json");
    }

    #[test]
    fn test_parse_availability_response() {
        let body = r#"{
            "start_time": "2025-03-01T10:00:00Z",
            "end_time": "2025-03-01T11:00:00Z",
            "resources": {
                "1": {"is_free": true, "conflicting_reservations": []},
                "2": {"is_free": false, "conflicting_reservations": [{
                    "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                    "resource_id": 2,
                    "requester": "alice",
                    "purpose": "training",
                    "start_time": "2025-03-01T10:30:00Z",
                    "end_time": "2025-03-01T12:00:00Z",
                    "status": "active",
                    "created_at": "2025-02-28T09:00:00Z"
                }]}
            }
        }"#;
        let report: AvailabilityResponse = serde_json::from_str(body).unwrap();
        assert!(report.resources[&1].is_free);
        assert_eq!(report.resources[&2].conflicting_reservations[0].requester, "alice");
        assert_eq!(format_time(&report.start_time), "2025-03-01 10:00");
    }
}
