pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod processor;
pub mod protocol;
pub mod service;

use crate::errors::{AddressMergeError, Result};
use service::AddressMergeService;
use shared::admin_service::AdminService;
use shared::http::{bind, serve_http};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

/// Runs the skill listener and the admin listener until either fails.
///
/// `/ready` on the admin listener reports ready once the skill listener is bound.
pub async fn run(config: config::Config) -> Result<()> {
    config.validate()?;

    let admin_listener = bind(&config.admin_listener.host, config.admin_listener.port).await?;
    let skill_host = config.listener.host.clone();
    let skill_listener = bind(&skill_host, config.listener.port);
    serve(config, admin_listener, skill_listener).await
}

async fn serve<L>(
    config: config::Config,
    admin_listener: TcpListener,
    skill_listener: L,
) -> Result<()>
where
    L: Future<Output = std::io::Result<TcpListener>>,
{
    let ready = Arc::new(AtomicBool::new(false));
    let ready_flag = ready.clone();
    let admin_service =
        AdminService::<_, AddressMergeError>::new(move || ready_flag.load(Ordering::Relaxed));

    let admin_task = serve_http(admin_listener, admin_service);
    let skill_task = async {
        let listener = skill_listener.await?;
        ready.store(true, Ordering::Relaxed);

        tracing::info!(path = %config.path, "Address merge skill ready");
        serve_http(listener, AddressMergeService::new(&config)).await
    };

    tokio::try_join!(skill_task, admin_task)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DEFAULT_MAX_BODY_BYTES, DEFAULT_PATH, Listener};
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};
    use hyper_util::client::legacy::Client;
    use hyper_util::client::legacy::connect::HttpConnector;
    use hyper_util::rt::TokioExecutor;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn test_config() -> Config {
        Config {
            listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 1,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 1,
            },
            path: DEFAULT_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    async fn get_status(client: &Client<HttpConnector, Full<Bytes>>, uri: &str) -> StatusCode {
        client.get(uri.parse().unwrap()).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_ready_after_skill_listener_bound() {
        let admin_listener = bind("127.0.0.1", 0).await.unwrap();
        let admin_port = admin_listener.local_addr().unwrap().port();

        // The skill listener is only bound once the test releases it.
        let (release, released) = oneshot::channel::<()>();
        let skill_listener = async move {
            let _ = released.await;
            bind("127.0.0.1", 0).await
        };
        tokio::spawn(serve(test_config(), admin_listener, skill_listener));

        let client: Client<HttpConnector, Full<Bytes>> =
            Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let health = format!("http://127.0.0.1:{admin_port}/health");
        let ready = format!("http://127.0.0.1:{admin_port}/ready");

        assert_eq!(get_status(&client, &health).await, StatusCode::OK);
        assert_eq!(
            get_status(&client, &ready).await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        release.send(()).unwrap();

        let mut status = StatusCode::SERVICE_UNAVAILABLE;
        for _ in 0..50 {
            status = get_status(&client, &ready).await;
            if status == StatusCode::OK {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serve_fails_when_skill_listener_cannot_bind() {
        let admin_listener = bind("127.0.0.1", 0).await.unwrap();
        let skill_listener =
            async { Err::<TcpListener, _>(std::io::Error::from(std::io::ErrorKind::AddrInUse)) };

        assert!(matches!(
            serve(test_config(), admin_listener, skill_listener)
                .await
                .unwrap_err(),
            AddressMergeError::Io(_)
        ));
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = Config {
            listener: Listener {
                host: "127.0.0.1".to_string(),
                port,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 1,
            },
            path: DEFAULT_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        };
        tokio::spawn(serve_http(listener, AddressMergeService::new(&config)));

        let client: Client<HttpConnector, Full<Bytes>> =
            Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let body = json!({
            "values": [
                {"recordId": "1", "data": {"streetName": "Main Street", "houseNumber": "123B", "city": "New York"}},
                {"recordId": "2", "data": {}}
            ]
        });
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("http://127.0.0.1:{port}{DEFAULT_PATH}"))
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();

        let response = client.request(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            parsed["values"][0]["data"]["fullAddress"],
            "Main Street 123B, New York"
        );
        assert_eq!(parsed["values"][1]["data"]["fullAddress"], ",");
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let config = Config {
            listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 7072,
            },
            path: DEFAULT_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        };

        assert!(matches!(
            run(config).await.unwrap_err(),
            AddressMergeError::InvalidConfig(_)
        ));
    }
}
