use crate::error::{Error, Result};
use crate::normalize::{self, TargetUrl};
use quick_xml::events::Event;
use reqwest::Client;
use select::document::Document;
use select::predicate::Name;
use std::time::Duration;
use url::Url;

const SITEMAP_PATH: &str = "/sitemap.xml";

/// Discovers candidate page URLs for a site.
///
/// Strategy: the conventional `/sitemap.xml` first; if it is unreachable,
/// unparsable, or empty, fall back to scraping anchor links off the root
/// page itself. Whichever list wins is filtered to the root's registrable
/// domain, normalized, deduplicated, and sorted by ascending URL length —
/// a cheap heuristic putting shallower pages first, not a guarantee.
pub struct Crawler {
    client: Client,
}

impl Crawler {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .expect("Building HTTP client");

        Self { client }
    }

    pub async fn discover(&self, root: &Url) -> Result<Vec<TargetUrl>> {
        match self.sitemap_links(root).await {
            Ok(links) if !links.is_empty() => post_process(root, links),
            Ok(_) => {
                log::info!("No URLs found in the sitemap, falling back to HTML links");
                let links = self.html_links(root).await?;
                post_process(root, links)
            }
            Err(e) => {
                log::info!("Error fetching sitemap ({e}), falling back to HTML links");
                let links = self.html_links(root).await?;
                post_process(root, links)
            }
        }
    }

    async fn sitemap_links(&self, root: &Url) -> Result<Vec<String>> {
        let sitemap_url = root.join(SITEMAP_PATH)?;
        let body = self.fetch(sitemap_url).await?;
        Ok(extract_sitemap_locs(&body))
    }

    async fn html_links(&self, root: &Url) -> Result<Vec<String>> {
        let body = self.fetch(root.clone()).await?;
        let document = Document::from(body.as_str());
        let links = document
            .find(Name("a"))
            .filter_map(|node| node.attr("href"))
            .map(|href| href.to_string())
            .collect();
        Ok(links)
    }

    async fn fetch(&self, url: Url) -> Result<String> {
        log::debug!("Fetching {url}");
        let res = self.client.get(url).send().await?;
        let res = res.error_for_status()?;
        Ok(res.text().await?)
    }
}

/// Every `<loc>` nested under a `<url>` or `<sitemap>` element.
fn extract_sitemap_locs(xml: &str) -> Vec<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut buf = Vec::new();
    let mut in_container = false;
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"url" | b"sitemap" => in_container = true,
                b"loc" if in_container => in_loc = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"url" | b"sitemap" => in_container = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => match e.decode() {
                Ok(text) => urls.push(text.trim().to_string()),
                Err(e) => log::warn!("Skipping undecodable <loc> text: {e}"),
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("Sitemap parse error at byte {}: {e}", reader.buffer_position());
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    urls
}

fn post_process(root: &Url, links: Vec<String>) -> Result<Vec<TargetUrl>> {
    let root_domain = root
        .host_str()
        .map(normalize::registrable_domain)
        .ok_or_else(|| Error::Discovery(format!("root URL has no host: {root}")))?;

    let mut targets: Vec<TargetUrl> = links
        .iter()
        .filter_map(|link| TargetUrl::resolve(link, root).ok())
        .filter(|target| target.registrable_domain().as_deref() == Some(root_domain.as_str()))
        .collect();

    targets = normalize::dedupe(targets);
    targets.sort_by_key(|target| target.as_str().len());
    Ok(targets)
}
