pub mod ad_slot;
pub mod bidder;
pub mod config_resolver;
pub mod imp_transformer;
pub mod keywords;
pub mod pubmatic;
pub mod request_builder;
pub mod response_transformer;
