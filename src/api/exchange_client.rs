// src/api/exchange_client.rs

use crate::model::bidder::{HttpRequest, HttpResponse};
use reqwest::Client;
use std::time::Instant;
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("exchange did not answer within {0}ms")]
    Timeout(u64),

    #[error("exchange call failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// 把适配器生成的 HttpRequest 真正发出去（仅 serve 模式使用）
pub struct ExchangeClient {
    client: Client,
    timeout_ms: u64,
}

impl ExchangeClient {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            client: Client::new(),
            timeout_ms,
        }
    }

    /// 超时覆盖整个调用，包括读取响应体
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ExchangeError> {
        let start = Instant::now();
        let call = async {
            let response = self
                .client
                .request(request.method.clone(), request.uri.clone())
                .headers(request.headers.clone())
                .body(request.body.clone())
                .send()
                .await?;

            let status_code = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.text().await?;

            Ok::<_, reqwest::Error>(HttpResponse {
                status_code,
                headers,
                body,
            })
        };

        let response = timeout(Duration::from_millis(self.timeout_ms), call)
            .await
            .map_err(|_| ExchangeError::Timeout(self.timeout_ms))??;

        debug!(
            uri = %request.uri,
            status = response.status_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "exchange responded"
        );

        Ok(response)
    }
}
