//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use dashboard_server::config::ServerConfig;
use dashboard_server::{HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const INDEX_HTML: &str = "<!doctype html><title>Painel GPX</title><div id=\"app\"></div>";

/// A dashboard tree:
///
/// ```text
/// index.html  app.js  sobre.html  .env
/// dataset/ routes.geojson  stops.csv  meta.json  big.json
/// dataset/sad/ 2024.csv
/// media/ logo.png
/// ```
pub fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "index.html", INDEX_HTML);
    write(root, "app.js", "console.log('dashboard');");
    write(root, "sobre.html", "<h1>Sobre</h1>");
    write(root, ".env", "SECRET=1");

    write(root, "dataset/routes.geojson", r#"{"type":"FeatureCollection","features":[]}"#);
    write(root, "dataset/stops.csv", "id,name\n1,Centro\n");
    write(root, "dataset/meta.json", r#"{"updated":"2024-05-01"}"#);
    write(root, "dataset/big.json", &format!("[{}]", vec!["1"; 2000].join(",")));
    write(root, "dataset/sad/2024.csv", "municipio,total\nBelem,42\n");
    write(root, "media/logo.png", "\u{89}PNG");

    dir
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn config_for(root: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.paths.app_root = root.to_path_buf();
    config
}

/// Bind an ephemeral port and serve `config` in the background.
pub async fn start_server(config: ServerConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
