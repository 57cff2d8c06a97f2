// src/bidding/config_resolver.rs

use crate::model::imp_ext::PubmaticBidderImpExt;
use crate::model::request_ext::{PubmaticExtRequest, PubmaticWrapper};

/// 一次请求解析出的 PubMatic 配置，构建后只读
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    pub publisher_id: Option<String>,
    pub wrapper: Option<PubmaticWrapper>,
    pub acat: Vec<String>,
    pub allowed_bidders: Option<Vec<String>>,
}

/// 解析器的输入：请求级扩展 + 每个 imp 的扩展（与 imp 顺序一致）
pub struct ResolverInput<'a> {
    pub request_ext: &'a PubmaticExtRequest,
    pub imp_exts: &'a [PubmaticBidderImpExt],
}

/// 返回 None 表示该解析器没有意见，交给链上的下一个
pub type Resolver<T> = fn(&ResolverInput<'_>) -> Option<T>;

/// 请求级 wrapper 优先于 imp 级
pub const WRAPPER_RESOLVERS: &[Resolver<PubmaticWrapper>] = &[request_ext_wrapper, imp_wrapper_merge];

pub const PUBLISHER_RESOLVERS: &[Resolver<String>] = &[first_non_blank_imp_publisher];

pub fn resolve_config(
    request_ext: PubmaticExtRequest,
    imp_exts: &[PubmaticBidderImpExt],
) -> ResolvedConfig {
    let input = ResolverInput {
        request_ext: &request_ext,
        imp_exts,
    };

    let wrapper = resolve_first(WRAPPER_RESOLVERS, &input);
    let publisher_id = resolve_first(PUBLISHER_RESOLVERS, &input);

    ResolvedConfig {
        publisher_id,
        wrapper,
        acat: request_ext.acat,
        allowed_bidders: request_ext.marketplace.map(|marketplace| marketplace.allowedbidders),
    }
}

fn resolve_first<T>(resolvers: &[Resolver<T>], input: &ResolverInput<'_>) -> Option<T> {
    resolvers.iter().find_map(|resolver| resolver(input))
}

pub fn request_ext_wrapper(input: &ResolverInput<'_>) -> Option<PubmaticWrapper> {
    input.request_ext.wrapper
}

/// 按 imp 顺序合并：profile、version 各自取第一个非零值
pub fn imp_wrapper_merge(input: &ResolverInput<'_>) -> Option<PubmaticWrapper> {
    input
        .imp_exts
        .iter()
        .filter_map(|imp_ext| imp_ext.bidder.as_ref()?.wrapper)
        .fold(None, |merged: Option<PubmaticWrapper>, wrapper| {
            Some(merged.map_or(wrapper, |merged| merged.merge(wrapper)))
        })
}

pub fn first_non_blank_imp_publisher(input: &ResolverInput<'_>) -> Option<String> {
    input
        .imp_exts
        .iter()
        .filter_map(|imp_ext| imp_ext.bidder.as_ref()?.publisher_id.as_deref())
        .find(|publisher_id| !publisher_id.trim().is_empty())
        .map(str::to_string)
}
