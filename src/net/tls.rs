//! TLS configuration and certificate loading.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load TLS configuration from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, io::Error> {
    if !cert_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Certificate file not found: {}", cert_path.display()),
        ));
    }
    if !key_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Private key file not found: {}", key_path.display()),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
