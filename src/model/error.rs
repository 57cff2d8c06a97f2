use serde::Serialize;
use thiserror::Error;

/// 适配器向宿主上报的错误。
/// 请求侧的错误会中止整个请求；响应侧的错误逐条累积，不影响其它 bid。
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum BidderError {
    /// 上游请求或配置不合法
    #[error("{0}")]
    BadInput(String),

    /// 交易所返回的数据不合法
    #[error("{0}")]
    BadServerResponse(String),

    #[error("{0}")]
    Generic(String),
}

impl BidderError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        BidderError::BadInput(message.into())
    }

    pub fn bad_server_response(message: impl Into<String>) -> Self {
        BidderError::BadServerResponse(message.into())
    }

    pub fn generic(message: impl Into<String>) -> Self {
        BidderError::Generic(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            BidderError::BadInput(message)
            | BidderError::BadServerResponse(message)
            | BidderError::Generic(message) => message,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BidderError::BadInput(_) => "bad_input",
            BidderError::BadServerResponse(_) => "bad_server_response",
            BidderError::Generic(_) => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_type_tag() {
        let error = BidderError::bad_input("Invalid adSlot 'x@'");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"type": "bad_input", "message": "Invalid adSlot 'x@'"})
        );
        assert_eq!(error.to_string(), "Invalid adSlot 'x@'");
        assert_eq!(error.kind(), "bad_input");
    }
}
