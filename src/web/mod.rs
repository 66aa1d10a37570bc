use std::sync::Arc;

use anyhow::Result;
use salvo::prelude::*;
use tracing::info;

use crate::config::Config;

pub mod handlers;

use self::handlers::health::liveness;

pub fn create_router() -> Router {
    Router::new().get(liveness)
}

#[derive(Clone)]
pub struct WebServer {
    config: Arc<Config>,
}

impl WebServer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.web.bind_address, self.config.web.port);
        info!("starting liveness server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor).serve(create_router()).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use salvo::prelude::*;
    use salvo::test::{ResponseExt, TestClient};

    use super::create_router;
    use super::handlers::health::LIVENESS_BODY;

    #[tokio::test]
    async fn root_answers_with_fixed_body() {
        let service = Service::new(create_router());

        for _ in 0..2 {
            let mut res = TestClient::get("http://127.0.0.1:8080/").send(&service).await;
            assert_eq!(res.status_code, Some(StatusCode::OK));
            assert_eq!(res.take_string().await.unwrap(), LIVENESS_BODY);
        }
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        let service = Service::new(create_router());

        let res = TestClient::get("http://127.0.0.1:8080/health").send(&service).await;
        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn root_only_answers_get() {
        let service = Service::new(create_router());

        let res = TestClient::post("http://127.0.0.1:8080/").send(&service).await;
        assert_ne!(res.status_code, Some(StatusCode::OK));
    }
}
