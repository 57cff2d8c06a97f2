use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// PubMatic 返回的 OpenRTB Bid Response
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seatbid: Option<Vec<SeatBid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cur: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<ExtBidResponse>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// 响应级扩展，仅关心 fledge 拍卖配置（impid -> config）
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtBidResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fledge_auction_configs: Option<Map<String, Value>>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SeatBid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<Vec<Bid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Bid {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub impid: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>, // Ad markup (HTML / VAST / native JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    /// 素材类型：1 banner, 2 video, 3 audio, 4 native
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtype: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Map<String, Value>>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}
