// src/bidding/bidder.rs

use crate::model::bidder::{BidderBid, BidderCall, BidderResult, CompositeBidderResponse, HttpRequest};
use crate::openrtb::request::BidRequest;

/// 宿主竞价引擎调用的 bidder 插件接口。
/// 实现必须无状态，可在多个请求间共享引用。
pub trait Bidder: Send + Sync {
    /// 归一化请求 -> 发往交易所的 HTTP 请求
    fn make_http_requests(&self, request: &BidRequest) -> BidderResult<Vec<HttpRequest>>;

    /// 旧入口，已由 `make_bidder_response` 取代
    fn make_bids(&self, call: &BidderCall, request: &BidRequest) -> BidderResult<Vec<BidderBid>>;

    fn make_bidder_response(&self, call: &BidderCall) -> CompositeBidderResponse;
}
