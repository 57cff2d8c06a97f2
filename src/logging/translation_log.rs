// src/logging/translation_log.rs

use crate::model::bidder::{BidderResult, CompositeBidderResponse, HttpRequest};
use crate::model::error::BidderError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// **单次翻译日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TranslationLog {
    pub timestamp: String,       // 记录时间
    pub trace_id: String,        // 本次翻译的追踪 id
    pub log_type: String,        // "pubmatic_request" / "pubmatic_response"
    pub request_id: String,      // OpenRTB `BidRequest.id`，响应侧可能为空
    pub status: String,          // "success" or "failure"
    pub imp_count: usize,        // 输入的 imp 数量
    pub outgoing_requests: usize,// 生成的交易所请求数
    pub bid_count: usize,        // 得到的 bid 数
    pub has_igi: bool,           // 是否带 fledge 拍卖配置
    pub errors: Vec<ErrorLog>,
}

/// **错误明细**
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorLog {
    pub kind: String,
    pub message: String,
}

impl From<&BidderError> for ErrorLog {
    fn from(error: &BidderError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.message().to_string(),
        }
    }
}

impl TranslationLog {
    fn new(log_type: &str, request_id: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            trace_id: Uuid::new_v4().to_string(),
            log_type: log_type.to_string(),
            request_id: request_id.to_string(),
            status: "failure".to_string(),
            imp_count: 0,
            outgoing_requests: 0,
            bid_count: 0,
            has_igi: false,
            errors: Vec::new(),
        }
    }

    /// **请求侧翻译日志**
    pub fn for_request(request_id: &str, imp_count: usize, result: &BidderResult<Vec<HttpRequest>>) -> Self {
        let mut log = Self::new("pubmatic_request", request_id);
        log.imp_count = imp_count;
        log.outgoing_requests = result.value.len();
        log.errors = result.errors.iter().map(ErrorLog::from).collect();
        if result.errors.is_empty() {
            log.status = "success".to_string();
        }
        log
    }

    /// **响应侧翻译日志**；逐条 bid 的错误不算失败
    pub fn for_response(request_id: &str, response: &CompositeBidderResponse) -> Self {
        let mut log = Self::new("pubmatic_response", request_id);
        log.bid_count = response.bids.len();
        log.has_igi = response.igi.is_some();
        log.errors = response.errors.iter().map(ErrorLog::from).collect();
        let decode_failed = response.bids.is_empty()
            && response
                .errors
                .iter()
                .any(|error| error.message().starts_with("Failed to decode"));
        if !decode_failed {
            log.status = "success".to_string();
        }
        log
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// 以 JSON 写入 tracing
    pub fn emit(&self) {
        let record = serde_json::to_string(self).unwrap_or_default();
        if self.is_success() {
            info!(target: "translation", trace_id = %self.trace_id, "{}", record);
        } else {
            warn!(target: "translation", trace_id = %self.trace_id, "{}", record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_log_records_errors() {
        let result: BidderResult<Vec<HttpRequest>> =
            BidderResult::with_error(BidderError::bad_input("Invalid adSlot 'x@'"));

        let log = TranslationLog::for_request("req-1", 2, &result);
        assert!(!log.is_success());
        assert_eq!(log.imp_count, 2);
        assert_eq!(
            log.errors,
            vec![ErrorLog {
                kind: "bad_input".to_string(),
                message: "Invalid adSlot 'x@'".to_string()
            }]
        );
        assert!(Uuid::parse_str(&log.trace_id).is_ok());
    }

    #[test]
    fn per_bid_errors_do_not_fail_the_response_log() {
        let response = CompositeBidderResponse {
            errors: vec![BidderError::bad_server_response(
                "failed to parse bid mtype (100) for impression id 123",
            )],
            ..Default::default()
        };
        assert!(TranslationLog::for_response("", &response).is_success());

        let response = CompositeBidderResponse::with_error(BidderError::bad_server_response(
            "Failed to decode: expected value",
        ));
        assert!(!TranslationLog::for_response("", &response).is_success());
    }
}
