// src/bidding/pubmatic.rs

use crate::bidding::bidder::Bidder;
use crate::bidding::config_resolver::resolve_config;
use crate::bidding::imp_transformer::{
    extract_display_manager, parse_imp_ext, transform_imp, validate_media_type,
};
use crate::bidding::request_builder::{build_outgoing_request, make_http_request};
use crate::bidding::response_transformer::transform_response;
use crate::config::config_manager::{AdapterConfig, ConfigError};
use crate::model::bidder::{BidderBid, BidderCall, BidderResult, CompositeBidderResponse, HttpRequest};
use crate::model::error::BidderError;
use crate::model::request_ext::PubmaticExtRequest;
use crate::openrtb::request::BidRequest;
use reqwest::Url;
use tracing::debug;

/// PubMatic bidder 适配器
#[derive(Debug, Clone)]
pub struct PubmaticBidder {
    endpoint: Url,
    bidder_name: String,
}

impl PubmaticBidder {
    /// endpoint 必须是合法 URL
    pub fn new(endpoint: &str, bidder_name: impl Into<String>) -> Result<Self, ConfigError> {
        let config = AdapterConfig {
            endpoint: endpoint.to_string(),
            bidder_name: bidder_name.into(),
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &AdapterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: config.endpoint_url()?,
            bidder_name: config.bidder_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn bidder_name(&self) -> &str {
        &self.bidder_name
    }

    fn build_requests(&self, request: &BidRequest) -> Result<Vec<HttpRequest>, BidderError> {
        let prebid = request.ext.as_ref().and_then(|ext| ext.prebid.as_ref());
        let request_ext = PubmaticExtRequest::from_prebid(prebid, &self.bidder_name)?;

        if request.imp.is_empty() {
            return Ok(Vec::new());
        }

        let display_manager = extract_display_manager(request.app.as_ref());

        // 逐个 imp 解析、校验、转换，第一个不合法的 imp 中止整个请求
        let mut imp_exts = Vec::with_capacity(request.imp.len());
        let mut imps = Vec::with_capacity(request.imp.len());
        for imp in &request.imp {
            let imp_ext = parse_imp_ext(imp)?;
            validate_media_type(imp)?;
            imps.push(transform_imp(imp, &imp_ext, display_manager.as_ref())?);
            imp_exts.push(imp_ext);
        }

        let config = resolve_config(request_ext, &imp_exts);

        let outgoing = build_outgoing_request(request, imps, &config);
        Ok(vec![make_http_request(outgoing, &self.endpoint)?])
    }
}

impl Bidder for PubmaticBidder {
    fn make_http_requests(&self, request: &BidRequest) -> BidderResult<Vec<HttpRequest>> {
        match self.build_requests(request) {
            Ok(requests) => {
                debug!(
                    request_id = %request.id,
                    imps = request.imp.len(),
                    requests = requests.len(),
                    "built pubmatic requests"
                );
                BidderResult::of(requests, Vec::new())
            }
            Err(error) => {
                debug!(request_id = %request.id, error = %error, "rejected bid request");
                BidderResult::with_error(error)
            }
        }
    }

    fn make_bids(&self, _call: &BidderCall, _request: &BidRequest) -> BidderResult<Vec<BidderBid>> {
        BidderResult::with_error(BidderError::generic("Deprecated adapter method invoked"))
    }

    fn make_bidder_response(&self, call: &BidderCall) -> CompositeBidderResponse {
        let response = transform_response(&call.response.body);
        debug!(
            status = call.response.status_code,
            bids = response.bids.len(),
            errors = response.errors.len(),
            igi = response.igi.is_some(),
            "translated pubmatic response"
        );
        response
    }
}
