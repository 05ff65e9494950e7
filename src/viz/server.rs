//! Blocking local HTTP server for the visualization page. The page is rendered once
//! up front; every request is answered with the same document, one connection at a
//! time, until the process is interrupted.

use crate::common::error::RustUdError;
use crate::pipelines::doc::Doc;
use crate::viz::{render_page, VisualizationStyle};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// # Configuration of the visualization server
pub struct VisualizationServerConfig {
    /// Host to bind (default: `127.0.0.1`)
    pub host: String,
    /// Port to bind (default: `8000`)
    pub port: u16,
    /// Title of the served page
    pub page_title: String,
}

impl Default for VisualizationServerConfig {
    fn default() -> VisualizationServerConfig {
        VisualizationServerConfig {
            host: String::from("127.0.0.1"),
            port: 8000,
            page_title: String::from("rust-ud"),
        }
    }
}

/// Renders the documents and serves the page on a local port, blocking the calling
/// thread until the process is interrupted.
///
/// All request paths answer with the same rendered page. Bind failure (e.g. the port
/// is already in use) is the only expected fatal condition and is surfaced as
/// `RustUdError::ServerError`; the call never returns `Ok` under normal operation.
///
/// # Arguments
///
/// * `docs` - Documents to render
/// * `style` - `VisualizationStyle` selecting the dependency-tree or named-entity view
/// * `config` - `VisualizationServerConfig` with host, port and page title
///
/// # Example
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use rust_ud::pipelines::annotation::LanguageModel;
/// use rust_ud::viz::{self, VisualizationStyle};
///
/// let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
/// let docs = model.annotate(&["Eu vi o menino com o telescópio"]);
/// viz::serve(&docs, VisualizationStyle::Dependency, Default::default())?;
/// # Ok(())
/// # }
/// ```
#[tokio::main(flavor = "current_thread")]
pub async fn serve(
    docs: &[Doc],
    style: VisualizationStyle,
    config: VisualizationServerConfig,
) -> Result<(), RustUdError> {
    let page = render_page(docs, style, &config.page_title);
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        page.len(),
        page
    );

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|error| {
            RustUdError::ServerError(format!(
                "could not bind {}:{}: {error}",
                config.host, config.port
            ))
        })?;
    info!(
        style = %style,
        "serving visualization on http://{}:{}",
        config.host, config.port
    );

    loop {
        let (mut stream, _) = listener
            .accept()
            .await
            .map_err(|error| RustUdError::ServerError(error.to_string()))?;
        // requests are handled one at a time; the request head itself is irrelevant
        let mut request = [0u8; 4096];
        let _ = stream.read(&mut request).await;
        if let Err(error) = stream.write_all(response.as_bytes()).await {
            warn!(%error, "failed to answer visualization request");
        }
        let _ = stream.shutdown().await;
    }
}
