// src/model/bidder.rs

use crate::model::error::BidderError;
use crate::openrtb::request::BidRequest;
use crate::openrtb::response::Bid;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// 归一化后的素材类型
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BidType {
    Banner,
    Video,
    Audio,
    Native,
}

impl BidType {
    /// 交易所 mtype 编码到归一化类型；未知编码返回 None
    pub fn from_mtype(mtype: Option<i32>) -> Option<Self> {
        match mtype {
            Some(1) => Some(BidType::Banner),
            Some(2) => Some(BidType::Video),
            Some(3) => Some(BidType::Audio),
            Some(4) => Some(BidType::Native),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BidType::Banner => "banner",
            BidType::Video => "video",
            BidType::Audio => "audio",
            BidType::Native => "native",
        }
    }
}

impl fmt::Display for BidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 适配器调用结果：值 + 累积的错误
#[derive(Debug, Clone, PartialEq)]
pub struct BidderResult<T> {
    pub value: T,
    pub errors: Vec<BidderError>,
}

impl<T> BidderResult<T> {
    pub fn of(value: T, errors: Vec<BidderError>) -> Self {
        Self { value, errors }
    }
}

impl<T: Default> BidderResult<T> {
    pub fn with_errors(errors: Vec<BidderError>) -> Self {
        Self {
            value: T::default(),
            errors,
        }
    }

    pub fn with_error(error: BidderError) -> Self {
        Self::with_errors(vec![error])
    }
}

/// 发往交易所的 HTTP 请求描述；真正的发送由宿主负责
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub payload: BidRequest,
    pub imp_ids: BTreeSet<String>,
}

/// 交易所的原始 HTTP 响应
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_no_content(&self) -> bool {
        self.status_code == 204
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// 一次完整的请求/响应调用
#[derive(Debug, Clone)]
pub struct BidderCall {
    pub request: Option<HttpRequest>,
    pub response: HttpResponse,
}

impl BidderCall {
    pub fn succeeded(request: Option<HttpRequest>, response: HttpResponse) -> Self {
        Self { request, response }
    }
}

/// 归一化后的 bid
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BidderBid {
    pub bid: Bid,
    #[serde(rename = "type")]
    pub bid_type: BidType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
}

/// 兴趣组拍卖配置（IGI）旁路信息
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ExtIgi {
    pub igs: Vec<ExtIgiIgs>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExtIgiIgs {
    pub impid: String,
    pub config: Value,
}

/// 响应转换的组合结果
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct CompositeBidderResponse {
    pub bids: Vec<BidderBid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub igi: Option<Vec<ExtIgi>>,
    pub errors: Vec<BidderError>,
}

impl CompositeBidderResponse {
    pub fn with_error(error: BidderError) -> Self {
        Self {
            bids: Vec::new(),
            igi: None,
            errors: vec![error],
        }
    }
}
