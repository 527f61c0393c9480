//! HTTP 辅助 - 各 LLM 客户端共用的请求与错误映射

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::application::ports::CompletionError;

/// 构建带超时的 HTTP 客户端
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, CompletionError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CompletionError::Network(e.to_string()))
}

/// 映射发送阶段的错误
pub(crate) fn map_send_error(provider: &str, err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout
    } else if err.is_connect() {
        CompletionError::Network(format!("Cannot connect to {}: {}", provider, err))
    } else {
        CompletionError::Network(err.to_string())
    }
}

/// 将非 2xx 状态映射为错误
pub(crate) fn status_error(status: StatusCode, body: &str) -> CompletionError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        CompletionError::RateLimited(body.to_string())
    } else {
        CompletionError::Service(format!("HTTP {}: {}", status, body))
    }
}

/// 检查状态并解析 JSON 响应体
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, CompletionError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CompletionError::Network(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }

    parse_json(&body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, CompletionError> {
    serde_json::from_str(body).map_err(|e| CompletionError::InvalidResponse(e.to_string()))
}
