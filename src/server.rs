use std::{path::PathBuf, sync::Arc, time::Instant};

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use log::info;
use tokio::net::TcpListener;

use crate::terminal_session;

#[derive(Clone)]
pub struct Server {
    pub config: Arc<ServerConfig>,
}

#[derive(Debug)]
pub struct ServerConfig {
    pub start_dir: PathBuf,
    pub home_dir: Option<PathBuf>,
    pub shell: String,
    pub cols: u16,
    pub rows: u16,
    pub max_page_size: u64,
    pub banner: bool,
    pub started: Instant,
}

impl Server {
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(upgrade))
            .with_state(self.config.clone())
    }

    pub async fn run_on_address(&self, addr: (&str, u16)) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn upgrade(
    ws: WebSocketUpgrade,
    State(config): State<Arc<ServerConfig>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| terminal_session::serve_connection(socket, config))
}
