mod handlers;
mod state;
mod static_files;

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::app::AppHandle;

pub fn build_router(app: AppHandle) -> Router {
    let state = Arc::new(AppState { app });

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/status", get(handlers::status))
        .route("/api/locate/{source}", post(handlers::locate))
        .route("/api/requests/{id}", delete(handlers::cancel))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener until Ctrl+C.
pub async fn serve(listener: tokio::net::TcpListener, app: AppHandle) -> std::io::Result<()> {
    let router = build_router(app.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            app.shutdown().await;
        })
        .await
}

pub async fn start(host: &str, port: u16, app: AppHandle) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "server listening");
    eprintln!("  siglocate listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{App, AppSettings};
    use crate::config::Locale;
    use crate::location::resolver::tests::RecordingService;
    use crate::location::{Fix, LocationResolver};
    use crate::sensors::snapshot::SensorSnapshot;
    use crate::sensors::DesktopPermissions;
    use std::time::Duration;

    async fn spawn_server(snapshot: SensorSnapshot) -> String {
        let gate = Arc::new(snapshot.permission_gate());
        let snap = Arc::new(snapshot);
        let service = RecordingService::answering(Ok(Fix::new(35.0, 139.0, 10.0)));
        let resolver = LocationResolver::new(snap.clone(), snap.clone(), snap, service);
        let settings = AppSettings { workers: 2, timeout: Duration::from_secs(5), locale: Locale::En };
        let (app, handle) = App::new(Arc::new(resolver), gate, settings);
        tokio::spawn(app.run());
        bind(handle).await
    }

    async fn bind(handle: AppHandle) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(handle);
        tokio::spawn(async move { axum::serve(listener, router).await });
        format!("http://{}", addr)
    }

    /// Blocking HTTP call off the runtime; returns (status, body).
    async fn call(method: &'static str, url: String) -> (u16, String) {
        tokio::task::spawn_blocking(move || {
            let response = match ureq::request(method, &url).call() {
                Ok(r) => r,
                Err(ureq::Error::Status(_, r)) => r,
                Err(e) => panic!("transport error: {}", e),
            };
            let status = response.status();
            (status, response.into_string().unwrap_or_default())
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_status_starts_idle() {
        let base = spawn_server(SensorSnapshot::default()).await;
        let (code, body) = call("GET", format!("{}/api/status", base)).await;
        assert_eq!(code, 200);
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["state"], "idle");
        assert_eq!(v["text"], "Location not retrieved");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_locate_then_status() {
        let snap = SensorSnapshot { fused: Some(Fix::new(1.0, 2.0, 3.0)), ..Default::default() };
        let base = spawn_server(snap).await;

        let (code, body) = call("POST", format!("{}/api/locate/fused", base)).await;
        assert_eq!(code, 202);
        assert!(body.contains(r#""outcome":"dispatched""#));

        let mut state = String::new();
        for _ in 0..50 {
            let (_, body) = call("GET", format!("{}/api/status", base)).await;
            let v: serde_json::Value = serde_json::from_str(&body).unwrap();
            state = v["state"].as_str().unwrap_or_default().to_string();
            if state != "fetching" {
                assert_eq!(v["fix"]["lat"], 1.0);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(state, "resolved");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_locate_unknown_source() {
        let base = spawn_server(SensorSnapshot::default()).await;
        let (code, body) = call("POST", format!("{}/api/locate/bluetooth", base)).await;
        assert_eq!(code, 400);
        assert!(body.contains("Unknown source"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_locate_denied() {
        let snap = SensorSnapshot::from_json(r#"{"permissions": {"granted": [], "grant_on_request": false}}"#).unwrap();
        let base = spawn_server(snap).await;
        let (code, body) = call("POST", format!("{}/api/locate/wifi", base)).await;
        assert_eq!(code, 403);
        assert!(body.contains(r#""outcome":"denied""#));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_unknown_request() {
        let base = spawn_server(SensorSnapshot::default()).await;
        let (code, _) = call("DELETE", format!("{}/api/requests/99", base)).await;
        assert_eq!(code, 404);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stopped_app_is_unavailable() {
        let snap = Arc::new(SensorSnapshot::default());
        let service = RecordingService::answering(Ok(Fix::new(0.0, 0.0, 0.0)));
        let resolver = LocationResolver::new(snap.clone(), snap.clone(), snap, service.clone());
        let settings = AppSettings { workers: 1, timeout: Duration::from_secs(5), locale: Locale::En };
        let (app, handle) = App::new(Arc::new(resolver), Arc::new(DesktopPermissions), settings);
        let app_task = tokio::spawn(app.run());
        handle.shutdown().await;
        app_task.await.unwrap();

        let base = bind(handle).await;
        let (code, body) = call("POST", format!("{}/api/locate/wifi", base)).await;
        assert_eq!(code, 503);
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["code"], 503);
        assert_eq!(v["error"], "application loop has stopped");

        let (code, _) = call("DELETE", format!("{}/api/requests/1", base)).await;
        assert_eq!(code, 503);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_index_and_no_store() {
        let base = spawn_server(SensorSnapshot::default()).await;
        let url = format!("{}/", base);
        let (cache_control, body) = tokio::task::spawn_blocking(move || {
            let r = ureq::get(&url).call().unwrap();
            (r.header("cache-control").map(str::to_string), r.into_string().unwrap())
        })
        .await
        .unwrap();
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert!(body.contains("Wi-Fiから位置取得"));
    }
}
