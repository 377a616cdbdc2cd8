// Server loop module
// Accepts connections until shutdown, then drains in-flight ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Pause after a failed accept; errors like EMFILE persist until a connection closes
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Run the accept loop on an already bound listener.
///
/// Returns once `shutdown` flips to `true` and in-flight connections have
/// finished or the grace period has elapsed.
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let mut stop_rx = shutdown.clone();
    let mut watching = true;

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            shutdown.clone(),
                        );
                    }
                    Err(e) => back_off_after_accept_error(&e).await,
                }
            }

            stop = async { stop_rx.wait_for(|stop| *stop).await.is_ok() }, if watching => {
                if stop {
                    break;
                }
                // Sender gone without a shutdown request: keep serving
                watching = false;
            }
        }
    }

    // Stop accepting before waiting on existing connections
    drop(listener);

    let grace = state.config.performance.shutdown_grace_period();
    let remaining = drain_connections(&active_connections, grace).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}

async fn back_off_after_accept_error(err: &std::io::Error) {
    logger::log_error(&format!("Failed to accept connection: {err}"));
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

/// Wait for the active connection count to reach zero, up to `grace`.
///
/// Returns the number of connections still open when it gave up.
async fn drain_connections(active: &AtomicUsize, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;
    let initial = active.load(Ordering::SeqCst);
    if initial > 0 {
        logger::log_draining(initial, grace);
    }

    loop {
        let current = active.load(Ordering::SeqCst);
        if current == 0 || tokio::time::Instant::now() >= deadline {
            return current;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::invocation::InvocationResponse;
    use crate::server::bind_listener;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::client::conn::http1::SendRequest;
    use hyper::{Request, StatusCode};
    use hyper_util::rt::TokioIo;
    use std::net::SocketAddr;
    use std::time::Instant;
    use tokio::net::TcpStream;

    const DELAY_MS: u64 = 300;
    const TRIGGER: &str = "/serviceBusQueueTrigger";

    async fn start_server(config: Config) -> (SocketAddr, watch::Sender<bool>, tokio::task::JoinHandle<std::io::Result<()>>) {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap(), 128).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = watch::channel(false);
        let server = tokio::spawn(run(listener, Arc::new(AppState::new(config)), rx));
        (addr, tx, server)
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.trigger.processing_delay_ms = DELAY_MS;
        config.logging.access_log = false;
        config.performance.shutdown_grace_period = 2;
        config
    }

    async fn open(addr: SocketAddr) -> SendRequest<Full<Bytes>> {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .unwrap();
        tokio::spawn(conn);
        sender
    }

    async fn send_on(
        sender: &mut SendRequest<Full<Bytes>>,
        addr: SocketAddr,
        path: &str,
        body: String,
    ) -> Result<(StatusCode, Bytes), hyper::Error> {
        sender.ready().await?;
        let req = Request::post(path)
            .header("host", addr.to_string())
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap();
        let resp = sender.send_request(req).await?;
        let status = resp.status();
        Ok((status, resp.into_body().collect().await?.to_bytes()))
    }

    async fn post(addr: SocketAddr, path: &str, body: String) -> (StatusCode, Bytes) {
        let mut sender = open(addr).await;
        send_on(&mut sender, addr, path, body).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_end_to_end_invocation() {
        let (addr, tx, server) = start_server(test_config()).await;

        let (status, body) = post(
            addr,
            TRIGGER,
            r#"{"Data":{"message":"42"},"Metadata":{"MessageId":"abc-123","DeliveryCount":1}}"#
                .to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: InvocationResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.logs.len(), 3);
        assert_eq!(resp.logs[1], "MessageId: abc-123");

        let (status, body) = post(addr, TRIGGER, "{".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(&body[..], br#"{"error":"Invalid request payload"}"#);

        tx.send_replace(true);
        server.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_invocations_complete_in_one_delay() {
        const REQUESTS: u64 = 6;
        let (addr, tx, server) = start_server(test_config()).await;

        let started = Instant::now();
        let tasks: Vec<_> = (0..REQUESTS)
            .map(|i| {
                let body = format!(r#"{{"Data":{{"message":"{i}"}},"Metadata":{{"MessageId":"m-{i}"}}}}"#);
                tokio::spawn(post(addr, TRIGGER, body))
            })
            .collect();
        for task in tasks {
            let (status, _) = task.await.unwrap();
            assert_eq!(status, StatusCode::OK);
        }
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(DELAY_MS));
        assert!(
            elapsed < Duration::from_millis(DELAY_MS * REQUESTS / 2),
            "requests were serialized: {elapsed:?}"
        );

        tx.send_replace(true);
        server.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shutdown_waits_for_in_flight_invocation() {
        let (addr, tx, server) = start_server(test_config()).await;

        let in_flight = tokio::spawn(post(
            addr,
            TRIGGER,
            r#"{"Data":{}}"#.to_string(),
        ));
        // Let the request reach the handler before signalling
        tokio::time::sleep(Duration::from_millis(DELAY_MS / 3)).await;
        tx.send_replace(true);

        let (status, _) = in_flight.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        server.await.unwrap().unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_keep_alive_connection_outlives_header_timeout() {
        let mut config = test_config();
        config.trigger.processing_delay_ms = 400;
        config.performance.connection_timeout = 1;
        let (addr, tx, server) = start_server(config).await;

        let mut sender = open(addr).await;
        let started = Instant::now();
        for i in 0..4 {
            let body = format!(r#"{{"Data":{{}},"Metadata":{{"MessageId":"m-{i}"}}}}"#);
            let (status, body) = send_on(&mut sender, addr, TRIGGER, body)
                .await
                .unwrap_or_else(|e| panic!("request {i} on the reused connection failed: {e}"));
            assert_eq!(status, StatusCode::OK);
            let resp: InvocationResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(resp.logs[1], format!("MessageId: m-{i}"));
        }
        assert!(started.elapsed() > Duration::from_secs(1));

        drop(sender);
        tx.send_replace(true);
        server.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_connection_limit_drops_excess_connections() {
        let mut config = test_config();
        config.performance.max_connections = Some(1);
        let (addr, tx, server) = start_server(config).await;

        let in_flight = tokio::spawn(post(addr, TRIGGER, r#"{"Data":{}}"#.to_string()));
        tokio::time::sleep(Duration::from_millis(DELAY_MS / 3)).await;

        let mut excess = open(addr).await;
        let rejected = send_on(&mut excess, addr, TRIGGER, r#"{"Data":{}}"#.to_string()).await;
        assert!(rejected.is_err(), "excess connection was served: {rejected:?}");

        let (status, _) = in_flight.await.unwrap();
        assert_eq!(status, StatusCode::OK);

        // The slot frees once the first connection closes; rejections must not leak it
        let mut admitted = false;
        for _ in 0..40 {
            let mut sender = open(addr).await;
            if let Ok((status, _)) = send_on(&mut sender, addr, TRIGGER, r#"{"Data":{}}"#.to_string()).await {
                assert_eq!(status, StatusCode::OK);
                admitted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert!(admitted, "connection slot was never released");

        tx.send_replace(true);
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_accept_error_backs_off() {
        let started = Instant::now();
        back_off_after_accept_error(&std::io::Error::from_raw_os_error(24)).await;
        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_drain_returns_remaining_after_grace() {
        let active = AtomicUsize::new(2);
        let remaining = drain_connections(&active, Duration::from_millis(60)).await;
        assert_eq!(remaining, 2);

        active.store(0, Ordering::SeqCst);
        assert_eq!(drain_connections(&active, Duration::from_secs(5)).await, 0);
    }
}
