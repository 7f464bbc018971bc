//! Health-Check-Endpunkt fuer Palace
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime, Anzahl Sitzungen und Spieler
//!
//! Die Zahlen liefert eine `HealthQuelle`, typischerweise der gemeinsame
//! Server-Zustand.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Status des Health-Checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub sessions: usize,
    pub players: usize,
}

/// Liefert die Kennzahlen fuer `/health`
pub trait HealthQuelle: Send + Sync + 'static {
    fn uptime_sekunden(&self) -> u64;
    fn sitzungen(&self) -> usize;
    fn spieler(&self) -> usize;

    fn status(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router<Q: HealthQuelle>(quelle: Arc<Q>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<Q>))
        .with_state(quelle)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler<Q: HealthQuelle>(State(quelle): State<Arc<Q>>) -> impl IntoResponse {
    let status = quelle.status();

    let http_status = match status {
        // 200 auch bei degraded, die Probe soll nicht fehlschlagen
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: quelle.uptime_sekunden(),
        sessions: quelle.sitzungen(),
        players: quelle.spieler(),
    };

    (http_status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestQuelle {
        status: HealthStatus,
    }

    impl HealthQuelle for TestQuelle {
        fn uptime_sekunden(&self) -> u64 {
            42
        }
        fn sitzungen(&self) -> usize {
            3
        }
        fn spieler(&self) -> usize {
            7
        }
        fn status(&self) -> HealthStatus {
            self.status
        }
    }

    async fn abfragen(status: HealthStatus) -> (StatusCode, HealthResponse) {
        let quelle = Arc::new(TestQuelle { status });
        let antwort = health_handler(State(quelle)).await.into_response();
        let code = antwort.status();
        let bytes = axum::body::to_bytes(antwort.into_body(), usize::MAX)
            .await
            .unwrap();
        (code, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn healthy_antwort() {
        let (code, antwort) = abfragen(HealthStatus::Healthy).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(antwort.status, HealthStatus::Healthy);
        assert_eq!(antwort.uptime_seconds, 42);
        assert_eq!(antwort.sessions, 3);
        assert_eq!(antwort.players, 7);
        assert_eq!(antwort.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn degraded_bleibt_200() {
        let (code, antwort) = abfragen(HealthStatus::Degraded).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(antwort.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn unhealthy_ist_503() {
        let (code, _) = abfragen(HealthStatus::Unhealthy).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn health_response_format() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            uptime_seconds: 3600,
            sessions: 2,
            players: 5,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"sessions\":2"));
        assert!(json.contains("\"players\":5"));
    }
}
