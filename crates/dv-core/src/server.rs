//! Blocking HTTP surface over a [`DetailSite`].
//!
//! One background thread accepts requests with a short timeout so the
//! shutdown flag is checked regularly. Only `GET` is served.

use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::logging::event_names;
use crate::site::{DetailSite, SiteResponse};

const ACCEPT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("failed to listen on {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    #[error("failed to spawn server thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Running server; stops on [`DetailServer::shutdown`] or drop.
pub struct DetailServer {
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
    addr: SocketAddr,
}

impl DetailServer {
    /// Bind and start serving on a background thread.
    pub fn start(config: &ServerConfig, site: Arc<DetailSite>) -> Result<Self, ServerError> {
        let raw = format!("{}:{}", config.bind, config.port);
        let addr: SocketAddr = raw.parse().map_err(|e: std::net::AddrParseError| {
            ServerError::InvalidAddress {
                addr: raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let server = tiny_http::Server::http(addr).map_err(|e| ServerError::Bind {
            addr,
            reason: e.to_string(),
        })?;
        info!(target: event_names::SERVER_STARTED, addr = %addr, "detail server listening");

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let thread = thread::Builder::new()
            .name("dv-http".to_string())
            .spawn(move || serve_loop(server, &site, &flag))?;

        Ok(DetailServer {
            shutdown,
            thread: Some(thread),
            addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the serve loop exits on its own.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    pub fn shutdown(mut self) {
        self.stop();
        info!(target: event_names::SERVER_STOPPED, "detail server stopped");
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Wake a blocked accept.
        let _ = TcpStream::connect(self.addr);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for DetailServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve_loop(server: tiny_http::Server, site: &DetailSite, shutdown: &AtomicBool) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let request = match server.recv_timeout(ACCEPT_TIMEOUT) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                if !shutdown.load(Ordering::SeqCst) {
                    error!(error = %e, "accept failed");
                }
                break;
            }
        };

        if shutdown.load(Ordering::SeqCst) {
            let _ = request.respond(
                tiny_http::Response::from_string("shutting down").with_status_code(503),
            );
            break;
        }

        debug!(method = %request.method(), url = %request.url(), "request received");
        let response = if *request.method() == tiny_http::Method::Get {
            site.handle(request.url())
        } else {
            SiteResponse::text(405, "Method Not Allowed")
        };

        let status = response.status;
        let mut reply =
            tiny_http::Response::from_string(response.body).with_status_code(status);
        if let Ok(header) =
            format!("Content-Type: {}", response.content_type).parse::<tiny_http::Header>()
        {
            reply = reply.with_header(header);
        }
        if let Err(e) = request.respond(reply) {
            warn!(error = %e, status, "failed to send response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::demo;
    use std::io::{Read, Write};

    fn get(addr: SocketAddr, path: &str) -> Option<String> {
        let mut stream = TcpStream::connect(addr).ok()?;
        let request = format!("GET {path} HTTP/1.0\r\nHost: localhost\r\n\r\n");
        stream.write_all(request.as_bytes()).ok()?;
        let mut buf = String::new();
        stream.read_to_string(&mut buf).ok()?;
        Some(buf)
    }

    #[test]
    fn test_invalid_address() {
        let config = ServerConfig {
            bind: "not an ip".to_string(),
            port: 1,
        };
        let site = Arc::new(demo::demo_site(SiteConfig::default()).unwrap());
        let err = DetailServer::start(&config, site).err().unwrap();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[test]
    fn test_server_status_codes() {
        let config = ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 18400 + (std::process::id() % 1000) as u16,
        };
        let site = Arc::new(demo::demo_site(SiteConfig::default()).unwrap());
        let server = match DetailServer::start(&config, site) {
            Ok(server) => server,
            Err(e) => {
                eprintln!("skipping server test: {e}");
                return;
            }
        };
        std::thread::sleep(Duration::from_millis(100));

        if let Some(buf) = get(server.addr(), "/healthz") {
            assert!(buf.contains("200 OK"), "health: {buf}");
        }
        if let Some(buf) = get(server.addr(), "/admin/companies/company/1/") {
            assert!(buf.contains("200 OK"));
            assert!(buf.contains("text/html"));
            assert!(buf.contains("lazy-panel"));
        }
        if let Some(buf) = get(server.addr(), "/admin/companies/company/1/lazy/contacts/") {
            assert!(buf.contains("200 OK"));
            assert!(!buf.contains("<!DOCTYPE html>"));
        }
        if let Some(buf) = get(server.addr(), "/admin/companies/company/1/lazy/nonexistent/") {
            assert!(buf.contains("404"));
        }
        if let Some(buf) = get(server.addr(), "/admin/companies/company/999/") {
            assert!(buf.contains("404"));
        }

        server.shutdown();
    }
}
