//! 全文链接解析 - 业务能力层
//!
//! 从 PubMed 落地页中找出 `div.full-text-links` 区域里的所有链接

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// 全文链接区域的选择器
pub const FULL_TEXT_LINKS_SELECTOR: &str = "div.full-text-links a[href]";

/// 提取全文链接
///
/// 相对链接按落地页 URL 解析为绝对链接，重复链接只保留第一次出现。
/// 没有全文链接区域时返回空列表。
pub fn extract_full_text_links(html: &str, page_url: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(FULL_TEXT_LINKS_SELECTOR) else {
        return Vec::new();
    };
    let base = Url::parse(page_url).ok();
    let document = Html::parse_document(html);

    let mut links: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }

        let resolved = match &base {
            Some(base) => base.join(href).map(|u| u.to_string()).ok(),
            None => Url::parse(href).map(|u| u.to_string()).ok(),
        };
        match resolved {
            Some(link) if !links.contains(&link) => links.push(link),
            Some(_) => {}
            None => debug!("无法解析链接: {}", href),
        }
    }

    links
}
