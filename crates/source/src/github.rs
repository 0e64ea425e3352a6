use crate::consts::{self, DEFAULT_ASSETS, DEFAULT_LISTING_URL, DEFAULT_RAW_BASE_URL, DEFAULT_TITLE_PREFIX};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use bindery_book::error::{ErrorKind as BookErrorKind, Result as BookResult};
use bindery_book::models::Listing;
use bindery_book::{Asset, Source};
use exn::{OptionExt, ResultExt};
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use tracing::instrument;

#[derive(Deserialize)]
struct EmbeddedData {
    payload: Payload,
}

#[derive(Deserialize)]
struct Payload {
    tree: Tree,
}

#[derive(Deserialize)]
struct Tree {
    items: Vec<TreeItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeItem {
    name: String,
    content_type: String,
}

/// Documents published in a directory of a GitHub repository.
///
/// The listing is read from the repository's web page (no API token needed),
/// documents and assets from the raw content host.
#[derive(Clone, Debug)]
pub struct GithubSource {
    client: Client,
    listing_url: String,
    raw_base_url: String,
    title_prefix: Option<String>,
    assets: Vec<String>,
}
impl GithubSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(Self::user_agent()).build().or_raise(|| ErrorKind::Client)?;
        Ok(Self {
            client,
            listing_url: DEFAULT_LISTING_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            title_prefix: Some(DEFAULT_TITLE_PREFIX.to_string()),
            assets: DEFAULT_ASSETS.iter().map(ToString::to_string).collect(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("bindery/", env!("CARGO_PKG_VERSION"))
    }

    /// Web page of the directory holding the documents.
    pub fn with_listing_url(mut self, url: impl Into<String>) -> Self {
        self.listing_url = url.into();
        self
    }

    /// Base URL that document and asset names are appended to.
    pub fn with_raw_base_url(mut self, url: impl Into<String>) -> Self {
        self.raw_base_url = url.into();
        self
    }

    /// Prefix stripped from document titles (`None` keeps titles as they are).
    pub fn with_title_prefix(mut self, prefix: impl Into<Option<String>>) -> Self {
        self.title_prefix = prefix.into().filter(|p| !p.is_empty());
        self
    }

    pub fn with_assets(mut self, assets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.assets = assets.into_iter().map(Into::into).collect();
        self
    }

    pub fn raw_url(&self, name: &str) -> String {
        format!("{}/{}", self.raw_base_url.trim_end_matches('/'), name.trim_start_matches('/'))
    }

    /// Names of every document in the directory, sorted.
    #[instrument(skip(self), fields(url = %self.listing_url))]
    pub async fn names(&self) -> Result<Vec<String>> {
        let page = self.download(&self.listing_url).await?;
        let names = parse_listing(&String::from_utf8_lossy(&page))?;
        tracing::debug!(documents = names.len(), "Directory listing parsed");
        Ok(names)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .or_raise(|| ErrorKind::Request(url.to_string()))?;
        let body = response.bytes().await.or_raise(|| ErrorKind::Request(url.to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Source for GithubSource {
    async fn list(&self) -> BookResult<Vec<Listing>> {
        let names = self.names().await.or_raise(|| BookErrorKind::Network(self.listing_url.clone()))?;
        Ok(names.into_iter().map(Listing::new).collect())
    }

    async fn fetch(&self, listing: &Listing) -> BookResult<Vec<u8>> {
        let url = self.raw_url(&listing.name);
        self.download(&url).await.or_raise(|| BookErrorKind::Network(listing.name.clone()))
    }

    async fn assets(&self) -> Vec<Asset> {
        let mut assets = Vec::with_capacity(self.assets.len());
        for name in &self.assets {
            match self.download(&self.raw_url(name)).await {
                Ok(data) => {
                    tracing::debug!(asset = %name, bytes = data.len(), "Downloaded asset");
                    assets.push(Asset { name: name.clone(), data });
                },
                Err(e) => tracing::warn!(asset = %name, error = %e, "Could not download asset"),
            }
        }
        assets
    }

    fn title(&self, document: &[u8]) -> Option<String> {
        document_title(&String::from_utf8_lossy(document), self.title_prefix.as_deref())
    }
}

/// Extracts the document names from a GitHub directory page.
pub(crate) fn parse_listing(page: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(page);
    let script = document.select(&consts::EMBEDDED_DATA_SELECTOR).next().ok_or_raise(|| ErrorKind::MissingListing)?;
    let json: String = script.text().collect();
    let data: EmbeddedData = serde_json::from_str(&json).or_raise(|| ErrorKind::InvalidListing)?;
    let mut names: Vec<String> = data
        .payload
        .tree
        .items
        .into_iter()
        .filter(|item| item.content_type == "file")
        .filter(|item| !consts::EXCLUDED_SUFFIXES.iter().any(|suffix| item.name.ends_with(suffix)))
        .map(|item| item.name)
        .collect();
    names.sort();
    Ok(names)
}

/// Text of the document's `<title>`, with `prefix` removed when present.
///
/// ```
/// use bindery_source::document_title;
/// let html = "<html><head><title>Go by Example: Closures</title></head></html>";
/// assert_eq!(document_title(html, Some("Go by Example: ")).as_deref(), Some("Closures"));
/// ```
pub fn document_title(html: &str, prefix: Option<&str>) -> Option<String> {
    let document = Html::parse_document(html);
    let title: String = document.select(&consts::TITLE_SELECTOR).next()?.text().collect();
    let title = title.trim();
    let title = prefix.and_then(|p| title.strip_prefix(p.trim_end())).unwrap_or(title).trim();
    (!title.is_empty()).then(|| title.to_string())
}
