// src/lib.rs

pub mod api;
pub mod bidding;
pub mod config;
pub mod logging;
pub mod mock_exchange;
pub mod model;
pub mod openrtb;

pub use bidding::bidder::Bidder;
pub use bidding::pubmatic::PubmaticBidder;
