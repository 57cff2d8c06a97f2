pub mod bid_ext;
pub mod bidder;
pub mod error;
pub mod imp_ext;
pub mod request_ext;
