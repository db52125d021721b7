//! Health probe logic.
//!
//! Performs a single HTTP GET against the supervised service and reports
//! the raw result: a status code, a timeout, or a transport failure.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use webmon_core::RawProbe;

/// Default health endpoint path of the supervised service.
pub const DEFAULT_PATH: &str = "/getbalance";

/// Something that can probe the supervised service once.
///
/// Implementations must not retry internally.
pub trait Probe: Send + Sync {
    fn probe(&self, wait_time: Duration) -> impl Future<Output = RawProbe> + Send;
}

/// HTTP/1 prober for an `ip:port` address and a request path.
#[derive(Debug, Clone)]
pub struct HttpProber {
    address: String,
    path: String,
}

impl HttpProber {
    pub fn new(address: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            path: path.into(),
        }
    }

    /// Prober for a service listening on the loopback interface.
    pub fn local(port: u16, path: impl Into<String>) -> Self {
        Self::new(format!("127.0.0.1:{port}"), path)
    }

    /// Full URL of the probed endpoint, for logging.
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.address, self.path)
    }
}

impl Probe for HttpProber {
    fn probe(&self, wait_time: Duration) -> impl Future<Output = RawProbe> + Send {
        http_probe(&self.address, &self.path, wait_time)
    }
}

/// Perform an HTTP health probe against an endpoint.
///
/// `timeout` bounds the whole exchange: connect, handshake, and the
/// response head. The body is never read.
pub async fn http_probe(address: &str, path: &str, timeout: Duration) -> RawProbe {
    let uri = format!("http://{address}{path}");
    let mut driver: Option<JoinHandle<()>> = None;

    let result = tokio::time::timeout(timeout, async {
        let stream = match tokio::net::TcpStream::connect(address).await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, %uri, "health probe connection failed");
                return RawProbe::TransportError;
            }
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, %uri, "health probe handshake failed");
                return RawProbe::TransportError;
            }
        };

        // Drive the connection in the background.
        driver = Some(tokio::spawn(async move {
            let _ = conn.await;
        }));

        // Origin-form target: the service matches on the bare path.
        let req = match http::Request::builder()
            .method("GET")
            .uri(path)
            .header("host", address)
            .header("user-agent", "webmon/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, %uri, "health probe request invalid");
                return RawProbe::TransportError;
            }
        };

        match sender.send_request(req).await {
            Ok(resp) => {
                debug!(status = %resp.status(), %uri, "health probe answered");
                RawProbe::Status(resp.status().as_u16())
            }
            Err(e) => {
                debug!(error = %e, %uri, "health probe request failed");
                RawProbe::TransportError
            }
        }
    })
    .await;

    if let Some(handle) = driver {
        handle.abort();
    }

    match result {
        Ok(probe) => probe,
        Err(_) => {
            debug!(%uri, ?timeout, "health probe timed out");
            RawProbe::Timeout
        }
    }
}
