use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Query parameters dropped during normalization. Analytics decoration only;
/// two links differing in these point at the same page.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// An absolute URL with the fragment and tracking parameters stripped.
///
/// Only constructed through [`TargetUrl::parse`] or [`TargetUrl::resolve`],
/// so holding one means normalization already happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetUrl(Url);

impl TargetUrl {
    /// Parse an already-absolute URL string.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;
        Ok(Self::from_url(url))
    }

    /// Resolve a possibly-relative link against a base URL.
    pub fn resolve(link: &str, base: &Url) -> Result<Self> {
        let url = Url::options().base_url(Some(base)).parse(link)?;
        Ok(Self::from_url(url))
    }

    fn from_url(mut url: Url) -> Self {
        url.set_fragment(None);
        strip_tracking_params(&mut url);
        Self(url)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The last two dot-separated labels of the hostname, e.g.
    /// `"www.example.com"` -> `"example.com"`. Hosts with fewer labels
    /// (or IP addresses) are returned whole.
    pub fn registrable_domain(&self) -> Option<String> {
        self.0.host_str().map(registrable_domain)
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn strip_tracking_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    if !kept.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
    }
}

pub fn registrable_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        host.to_string()
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

/// Drop duplicates, keeping the first occurrence of each URL.
pub fn dedupe(urls: Vec<TargetUrl>) -> Vec<TargetUrl> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Deterministic, order-independent hash used to derive per-target
/// artifact names. 31-multiplier fold over the URL bytes, masked to a
/// positive 31-bit value.
pub fn url_hash(url: &str) -> u32 {
    url.bytes()
        .fold(0u32, |acc, byte| {
            acc.wrapping_mul(31).wrapping_add(byte as u32) & 0x7fff_ffff
        })
}

pub fn parse_base(input: &str) -> Result<Url> {
    let url = Url::parse(input)?;
    if url.host_str().is_none() {
        return Err(Error::Discovery(format!("URL has no host: {input}")));
    }
    Ok(url)
}
