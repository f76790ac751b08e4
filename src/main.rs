mod catalog;
mod config;
mod history;
mod identity;
mod messages;
mod pages;
mod presence;
mod rejection;
mod server;
mod store;
mod typing;

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use log::{error, info, warn};
use warp::Filter;

use config::Config;
use history::History;
use identity::{IdentityResolver, TokenVerifier};
use server::ChatHub;
use store::SqliteStore;

/// Checks that the configured certificate chain and private key can be read.
fn tls_ready(config: &Config) -> bool {
    let cert_file = match File::open(&config.tls_cert_path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to open certificate file {}: {}", config.tls_cert_path.display(), e);
            return false;
        }
    };
    let key_file = match File::open(&config.tls_key_path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to open private key file {}: {}", config.tls_key_path.display(), e);
            return false;
        }
    };

    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file)).collect::<Result<Vec<_>, _>>();
    match certs {
        Ok(certs) if !certs.is_empty() => {}
        Ok(_) => {
            warn!("No certificates found in {}", config.tls_cert_path.display());
            return false;
        }
        Err(e) => {
            warn!("Failed to parse certificate: {}", e);
            return false;
        }
    }

    match rustls_pemfile::private_key(&mut BufReader::new(key_file)) {
        Ok(Some(_)) => true,
        Ok(None) => {
            warn!("No private key found in {}", config.tls_key_path.display());
            false
        }
        Err(e) => {
            warn!("Failed to parse private key: {}", e);
            false
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let store = match SqliteStore::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open {}: {}", config.database_path.display(), e);
            std::process::exit(1);
        }
    };

    let verifier = TokenVerifier::new(&config.jwt_secret);
    let resolver = IdentityResolver::new(verifier.clone(), Arc::new(store.clone()));
    let hub = ChatHub::new(History::new(Arc::new(store.clone())));

    let index = warp::path::end().and(warp::fs::file(config.public_dir.join("index.html")));
    let static_files = warp::fs::dir(config.public_dir.clone());

    let chat_page = pages::chat_page(verifier.clone(), config.public_dir.join("chat.html"));

    let routes = server::route(hub, resolver)
        .or(catalog::routes(Arc::new(store), verifier))
        .or(chat_page)
        .or(index)
        .or(static_files)
        .recover(rejection::recover)
        .with(warp::cors().allow_any_origin())
        .with(warp::log("storefront_chat"));

    let addr = ([0, 0, 0, 0], config.port);
    if tls_ready(&config) {
        info!("Starting secure server (HTTPS/WSS) on port {}", config.port);
        warp::serve(routes)
            .tls()
            .cert_path(&config.tls_cert_path)
            .key_path(&config.tls_key_path)
            .run(addr)
            .await;
    } else {
        info!("TLS not available, serving HTTP/WS on port {}", config.port);
        warp::serve(routes).run(addr).await;
    }
}
