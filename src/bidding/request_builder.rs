// src/bidding/request_builder.rs

use crate::bidding::config_resolver::ResolvedConfig;
use crate::model::bidder::HttpRequest;
use crate::model::error::BidderError;
use crate::model::request_ext::{PubmaticMarketplace, PubmaticWrapper};
use crate::openrtb::request::{App, BidRequest, ExtRequest, ExtRequestPrebid, Imp, Publisher, Site};
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

const PREBID_KEY: &str = "prebid";
const WRAPPER_KEY: &str = "wrapper";
const ACAT_KEY: &str = "acat";
const MARKETPLACE_KEY: &str = "marketplace";

/// 原始 ext 中由适配器重建、不做直接拷贝的字段
const RESERVED_EXT_KEYS: [&str; 3] = [PREBID_KEY, WRAPPER_KEY, ACAT_KEY];

static DEFAULT_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json;charset=utf-8"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
});

/// 用转换后的 imp 和解析出的配置组装发往交易所的请求体
pub fn build_outgoing_request(
    request: &BidRequest,
    imps: Vec<Imp>,
    config: &ResolvedConfig,
) -> BidRequest {
    let publisher_id = config.publisher_id.as_deref();

    BidRequest {
        imp: imps,
        site: request.site.as_ref().map(|site| modify_site(site, publisher_id)),
        app: request.app.as_ref().map(|app| modify_app(app, publisher_id)),
        ext: modify_ext_request(request.ext.as_ref(), config),
        ..request.clone()
    }
}

fn modify_site(site: &Site, publisher_id: Option<&str>) -> Site {
    match publisher_id {
        Some(id) => Site {
            publisher: Some(modify_publisher(site.publisher.as_ref(), id)),
            ..site.clone()
        },
        None => site.clone(),
    }
}

fn modify_app(app: &App, publisher_id: Option<&str>) -> App {
    match publisher_id {
        Some(id) => App {
            publisher: Some(modify_publisher(app.publisher.as_ref(), id)),
            ..app.clone()
        },
        None => app.clone(),
    }
}

fn modify_publisher(publisher: Option<&Publisher>, publisher_id: &str) -> Publisher {
    Publisher {
        id: Some(publisher_id.to_string()),
        ..publisher.cloned().unwrap_or_default()
    }
}

/// 重建请求级 ext：
/// 拷贝原始字段（prebid/wrapper/acat 除外），写入 wrapper、acat、marketplace，
/// 再按是否有 bidder 参数决定 prebid 的形态
pub fn modify_ext_request(original: Option<&ExtRequest>, config: &ResolvedConfig) -> Option<ExtRequest> {
    let acat = sanitize_acat(&config.acat);
    let wrapper = config.wrapper.map(wrapper_value);
    let acat_value = (!acat.is_empty()).then(|| json!(acat));

    let mut extra = Map::new();
    if let Some(original) = original {
        for (key, value) in &original.extra {
            if !RESERVED_EXT_KEYS.contains(&key.as_str()) {
                extra.insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(wrapper) = &wrapper {
        extra.insert(WRAPPER_KEY.to_string(), wrapper.clone());
    }
    if let Some(acat) = &acat_value {
        extra.insert(ACAT_KEY.to_string(), acat.clone());
    }
    if let Some(allowed_bidders) = &config.allowed_bidders {
        let marketplace = PubmaticMarketplace {
            allowedbidders: allowed_bidders.clone(),
        };
        extra.insert(MARKETPLACE_KEY.to_string(), json!(marketplace));
    }

    let original_prebid = original.and_then(|ext| ext.prebid.as_ref());
    let prebid = modify_prebid(original_prebid, wrapper, acat_value);

    let ext = ExtRequest { prebid, extra };
    if original.is_none() && ext.is_empty() {
        return None;
    }
    Some(ext)
}

fn modify_prebid(
    original: Option<&ExtRequestPrebid>,
    wrapper: Option<Value>,
    acat: Option<Value>,
) -> Option<ExtRequestPrebid> {
    let alternate_codes = original.and_then(|prebid| prebid.alternatebiddercodes.clone());

    let mut bidderparams = Map::new();
    if let Some(wrapper) = wrapper {
        bidderparams.insert(WRAPPER_KEY.to_string(), wrapper);
    }
    if let Some(acat) = acat {
        bidderparams.insert(ACAT_KEY.to_string(), acat);
    }

    let mut prebid = if !bidderparams.is_empty() {
        ExtRequestPrebid {
            bidderparams: Some(bidderparams),
            alternatebiddercodes: alternate_codes,
            ..Default::default()
        }
    } else if alternate_codes.is_some() {
        ExtRequestPrebid {
            alternatebiddercodes: alternate_codes,
            ..Default::default()
        }
    } else {
        return original.cloned();
    };

    let no_bidders = prebid
        .alternatebiddercodes
        .as_ref()
        .is_some_and(|codes| codes.bidders.as_ref().map_or(true, |bidders| bidders.is_empty()));
    if no_bidders {
        prebid.alternatebiddercodes = None;
    }

    Some(prebid)
}

fn wrapper_value(wrapper: PubmaticWrapper) -> Value {
    json!({"profile": wrapper.profile, "version": wrapper.version})
}

fn sanitize_acat(acat: &[String]) -> Vec<String> {
    acat.iter()
        .map(|category| category.trim())
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect()
}

/// POST JSON 到交易所的请求信封
pub fn make_http_request(payload: BidRequest, endpoint: &Url) -> Result<HttpRequest, BidderError> {
    let body = serde_json::to_vec(&payload)
        .map_err(|e| BidderError::generic(format!("Failed to encode request body: {}", e)))?;
    let imp_ids: BTreeSet<String> = payload.imp.iter().map(|imp| imp.id.clone()).collect();

    Ok(HttpRequest {
        method: Method::POST,
        uri: endpoint.clone(),
        headers: DEFAULT_HEADERS.clone(),
        body,
        payload,
        imp_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrtb::request::{
        ExtRequestPrebidAlternateBidderCodes, ExtRequestPrebidAlternateBidderCodesBidder,
    };
    use std::collections::BTreeMap;

    fn config(wrapper: Option<PubmaticWrapper>, acat: &[&str]) -> ResolvedConfig {
        ResolvedConfig {
            wrapper,
            acat: acat.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    fn alternate_codes(bidders: &[&str]) -> ExtRequestPrebidAlternateBidderCodes {
        ExtRequestPrebidAlternateBidderCodes {
            enabled: Some(true),
            bidders: Some(
                bidders
                    .iter()
                    .map(|name| {
                        (
                            name.to_string(),
                            ExtRequestPrebidAlternateBidderCodesBidder {
                                enabled: Some(true),
                                allowedbiddercodes: Some(vec!["pubmatic".to_string()]),
                            },
                        )
                    })
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }

    #[test]
    fn wrapper_and_acat_go_to_ext_and_bidderparams() {
        let ext = modify_ext_request(
            None,
            &config(Some(PubmaticWrapper::of(1, 1)), &["\tte st Value\t", "test Value", " "]),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&ext).unwrap(),
            json!({
                "prebid": {
                    "bidderparams": {
                        "wrapper": {"profile": 1, "version": 1},
                        "acat": ["te st Value", "test Value"]
                    }
                },
                "wrapper": {"profile": 1, "version": 1},
                "acat": ["te st Value", "test Value"]
            })
        );
    }

    #[test]
    fn original_ext_fields_are_copied_except_reserved() {
        let original: ExtRequest = serde_json::from_value(json!({
            "prebid": {"debug": true},
            "wrapper": {"profile": 9},
            "acat": ["old"],
            "custom": {"a": 1}
        }))
        .unwrap();

        let ext = modify_ext_request(Some(&original), &ResolvedConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(&ext).unwrap(),
            json!({"prebid": {"debug": true}, "custom": {"a": 1}})
        );
    }

    #[test]
    fn empty_original_ext_stays_empty() {
        let ext = modify_ext_request(Some(&ExtRequest::default()), &ResolvedConfig::default());
        assert_eq!(ext, Some(ExtRequest::default()));
        assert_eq!(modify_ext_request(None, &ResolvedConfig::default()), None);
    }

    #[test]
    fn alternate_codes_are_preserved_next_to_bidderparams() {
        let original = ExtRequest {
            prebid: Some(ExtRequestPrebid {
                alternatebiddercodes: Some(alternate_codes(&["anotherbidder"])),
                ..Default::default()
            }),
            ..Default::default()
        };

        let ext =
            modify_ext_request(Some(&original), &config(Some(PubmaticWrapper::of(123, 999)), &[]))
                .unwrap();
        let prebid = ext.prebid.unwrap();
        assert_eq!(prebid.alternatebiddercodes, Some(alternate_codes(&["anotherbidder"])));
        assert!(prebid.bidderparams.is_some());
    }

    #[test]
    fn alternate_codes_without_bidders_are_dropped() {
        let original = ExtRequest {
            prebid: Some(ExtRequestPrebid {
                alternatebiddercodes: Some(alternate_codes(&[])),
                ..Default::default()
            }),
            ..Default::default()
        };

        let ext =
            modify_ext_request(Some(&original), &config(Some(PubmaticWrapper::of(123, 999)), &[]))
                .unwrap();
        assert_eq!(ext.prebid.unwrap().alternatebiddercodes, None);
    }

    #[test]
    fn marketplace_lists_allowed_bidders() {
        let config = ResolvedConfig {
            allowed_bidders: Some(vec!["pubmatic".to_string(), "groupm".to_string()]),
            ..Default::default()
        };

        let ext = modify_ext_request(None, &config).unwrap();
        assert_eq!(
            ext.extra.get("marketplace"),
            Some(&json!({"allowedbidders": ["pubmatic", "groupm"]}))
        );
    }

    #[test]
    fn publisher_id_is_written_to_site_and_app() {
        let request = BidRequest {
            site: Some(Site {
                publisher: Some(Publisher {
                    id: Some("old".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            app: Some(App::default()),
            ..Default::default()
        };
        let config = ResolvedConfig {
            publisher_id: Some("pub id".to_string()),
            ..Default::default()
        };

        let outgoing = build_outgoing_request(&request, Vec::new(), &config);
        assert_eq!(
            outgoing.site.unwrap().publisher.unwrap().id.as_deref(),
            Some("pub id")
        );
        assert_eq!(
            outgoing.app.unwrap().publisher.unwrap().id.as_deref(),
            Some("pub id")
        );
    }

    #[test]
    fn envelope_is_a_json_post() {
        let endpoint = Url::parse("http://test.endpoint.com/translator?source=prebid-server").unwrap();
        let payload = BidRequest {
            id: "requestId".to_string(),
            imp: vec![Imp {
                id: "123".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let request = make_http_request(payload.clone(), &endpoint).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.uri.as_str(),
            "http://test.endpoint.com/translator?source=prebid-server"
        );
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json;charset=utf-8"
        );
        assert_eq!(request.headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(request.imp_ids, BTreeSet::from(["123".to_string()]));
        assert_eq!(request.body, serde_json::to_vec(&payload).unwrap());
    }
}
