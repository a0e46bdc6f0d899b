//! TCP reachability prechecks
//!
//! A precheck opens a plain TCP connection bounded by a timeout and closes it
//! again straight away. It runs before anything that would otherwise stall on
//! an unreachable host (SDK calls, the Postgres handshake).

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

/// Default bound on a single connection attempt.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Candidate ports tried against the Secrets Manager endpoint.
pub const SECRETS_PROBE_PORTS: [u16; 2] = [80, 443];

/// Why a single probe failed.
#[derive(Debug)]
pub enum ProbeFailure {
    TimedOut(Duration),
    Io(io::Error),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(after) => write!(f, "i/o timeout after {}s", after.as_secs_f64()),
            Self::Io(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Error)]
#[error("connection failure to {host} on port {port}: {failure}")]
pub struct ProbeError {
    pub host: String,
    pub port: u16,
    pub failure: ProbeFailure,
}

/// Join host and port the way socket addresses expect, bracketing bare IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Open and immediately close a TCP connection to `host:port`.
pub async fn check_host_port(host: &str, port: u16, limit: Duration) -> Result<(), ProbeError> {
    let addr = join_host_port(host, port);
    debug!(%addr, timeout_ms = limit.as_millis() as u64, "Probing");

    let failure = match timeout(limit, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => {
            drop(stream);
            info!(%host, port, "opened connection to {} on port {}", host, port);
            return Ok(());
        }
        Ok(Err(e)) => ProbeFailure::Io(e),
        Err(_) => ProbeFailure::TimedOut(limit),
    };

    Err(ProbeError {
        host: host.to_string(),
        port,
        failure,
    })
}

/// Probe every candidate port in order.
///
/// Returns the ports that accepted a connection, or every individual failure
/// when none did. All candidates are tried even after one succeeds.
pub async fn check_any_port(
    host: &str,
    ports: &[u16],
    limit: Duration,
) -> Result<Vec<u16>, Vec<ProbeError>> {
    let mut succeeded = Vec::new();
    let mut errors = Vec::new();

    for &port in ports {
        match check_host_port(host, port, limit).await {
            Ok(()) => succeeded.push(port),
            Err(e) => errors.push(e),
        }
    }

    if succeeded.is_empty() {
        Err(errors)
    } else {
        Ok(succeeded)
    }
}

/// Host part of an endpoint setting.
///
/// Accepts either a URL (`https://secretsmanager.eu-west-1.amazonaws.com/`)
/// or a bare host, optionally with a port, and returns only the host.
pub fn endpoint_host(endpoint: &str) -> &str {
    let rest = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let authority = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);

    if let Some(bracketed) = authority.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or(bracketed);
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => host,
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("10.0.0.5", 5432), "10.0.0.5:5432");
        assert_eq!(join_host_port("db.internal", 5432), "db.internal:5432");
        assert_eq!(join_host_port("::1", 5432), "[::1]:5432");
        assert_eq!(join_host_port("[::1]", 5432), "[::1]:5432");
    }

    #[test]
    fn test_endpoint_host() {
        assert_eq!(
            endpoint_host("https://secretsmanager.eu-west-1.amazonaws.com"),
            "secretsmanager.eu-west-1.amazonaws.com"
        );
        assert_eq!(
            endpoint_host("https://vpce-123.secretsmanager.eu-west-1.vpce.amazonaws.com/"),
            "vpce-123.secretsmanager.eu-west-1.vpce.amazonaws.com"
        );
        assert_eq!(endpoint_host("secretsmanager.local"), "secretsmanager.local");
        assert_eq!(endpoint_host("http://localhost:4566"), "localhost");
        assert_eq!(endpoint_host("http://[::1]:4566/"), "::1");
        assert_eq!(endpoint_host("::1"), "::1");
    }

    #[tokio::test]
    async fn test_reachable_port_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        check_host_port("127.0.0.1", port, DEFAULT_PROBE_TIMEOUT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refused_port_fails_with_context() {
        let port = closed_port().await;
        let started = Instant::now();

        let err = check_host_port("127.0.0.1", port, DEFAULT_PROBE_TIMEOUT)
            .await
            .unwrap_err();

        assert!(started.elapsed() <= DEFAULT_PROBE_TIMEOUT + Duration::from_secs(1));
        assert_eq!(err.port, port);
        assert!(matches!(err.failure, ProbeFailure::Io(_)));
        assert!(err
            .to_string()
            .starts_with(&format!("connection failure to 127.0.0.1 on port {}: ", port)));
    }

    #[tokio::test]
    async fn test_any_port_reports_successes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let closed = closed_port().await;

        let ports = check_any_port("127.0.0.1", &[closed, open], DEFAULT_PROBE_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(ports, vec![open]);
    }

    #[tokio::test]
    async fn test_any_port_collects_every_failure() {
        let first = closed_port().await;
        let second = closed_port().await;

        let errors = check_any_port("127.0.0.1", &[first, second], DEFAULT_PROBE_TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].port, first);
        assert_eq!(errors[1].port, second);
    }

    #[test]
    fn test_timeout_failure_display() {
        let err = ProbeError {
            host: "10.0.0.5".to_string(),
            port: 5432,
            failure: ProbeFailure::TimedOut(Duration::from_secs(3)),
        };
        assert_eq!(
            err.to_string(),
            "connection failure to 10.0.0.5 on port 5432: i/o timeout after 3s"
        );
    }
}
