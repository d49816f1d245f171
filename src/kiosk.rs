//! Launches a browser in kiosk mode on the customer-facing screen.

use std::net::SocketAddr;
use std::path::Path;
use tracing::{info, warn};

use crate::config::CustomerViewConfig;

/// URL of the customer view on the address the server actually bound.
pub fn customer_view_url(addr: SocketAddr) -> String {
    let ip = addr.ip();
    if ip.is_unspecified() || ip.is_loopback() {
        format!("http://localhost:{}/display", addr.port())
    } else {
        format!("http://{}/display", addr)
    }
}

/// Chromium-family flags for an unattended full-screen window.
pub fn kiosk_args(url: &str) -> Vec<String> {
    vec![
        "--kiosk".to_string(),
        "--new-window".to_string(),
        "--no-first-run".to_string(),
        "--autoplay-policy=no-user-gesture-required".to_string(),
        url.to_string(),
    ]
}

/// Open the customer view if it is enabled and a browser is configured.
///
/// Failure is logged; the bridge keeps serving without the screen.
pub fn launch_customer_view(config: &CustomerViewConfig, addr: SocketAddr) {
    if !config.enabled {
        return;
    }
    let Some(browser) = &config.browser_path else {
        warn!("customer view enabled but no browser path configured");
        return;
    };
    launch(browser, &customer_view_url(addr));
}

fn launch(browser: &Path, url: &str) {
    match tokio::process::Command::new(browser).args(kiosk_args(url)).spawn() {
        Ok(_) => info!(browser = %browser.display(), url, "launched customer view"),
        Err(e) => warn!(browser = %browser.display(), error = %e, "failed to launch customer view"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_args() {
        let url = customer_view_url("0.0.0.0:9100".parse().unwrap());
        assert_eq!(url, "http://localhost:9100/display");
        let args = kiosk_args(&url);
        assert_eq!(args.first().map(String::as_str), Some("--kiosk"));
        assert_eq!(args.last(), Some(&url));
    }

    #[test]
    fn test_url_follows_listen_address() {
        assert_eq!(
            customer_view_url("192.168.1.20:9200".parse().unwrap()),
            "http://192.168.1.20:9200/display"
        );
    }

    #[tokio::test]
    async fn test_url_uses_bound_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_eq!(
            customer_view_url(addr),
            format!("http://localhost:{}/display", addr.port())
        );
    }
}
