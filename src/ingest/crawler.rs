//! Breadth-first documentation crawler.
//!
//! - BFS traversal from the root URL, depth-limited
//! - Each normalized URL is visited at most once, redirect targets included
//! - Only links sharing the root's origin and path prefix are followed
//! - Failed or non-HTML pages are logged and skipped

use std::collections::{HashSet, VecDeque};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::fetcher::PageFetcher;
use super::parser::{extract_links, extract_text, extract_title};
use super::CrawlConfig;
use crate::types::{AppError, Document, Result};

/// Normalizes a URL for deduplication: drops the fragment and any trailing
/// slash beyond the root.
pub fn normalize_url(raw: &str) -> String {
    let without_fragment = match url::Url::parse(raw) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => raw.to_string(),
    };

    if without_fragment.ends_with('/') && without_fragment.matches('/').count() > 3 {
        without_fragment.trim_end_matches('/').to_string()
    } else {
        without_fragment
    }
}

/// True when `link` shares the root's origin and lies under its path
pub fn is_under_root(link: &url::Url, root: &url::Url) -> bool {
    if link.origin() != root.origin() {
        return false;
    }

    let root_path = root.path().trim_end_matches('/');
    if root_path.is_empty() {
        return true;
    }
    let path = link.path();
    path == root_path || path.starts_with(&format!("{}/", root_path))
}

pub struct Crawler {
    config: CrawlConfig,
    fetcher: PageFetcher,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = PageFetcher::new(&config.user_agent, config.timeout)?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl from `root_url` and return one document per successfully fetched page,
    /// in visit order.
    pub async fn crawl(&self, root_url: &str) -> Result<Vec<Document>> {
        let root = url::Url::parse(root_url)
            .map_err(|e| AppError::Ingest(format!("Invalid root URL {}: {}", root_url, e)))?;

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut documents = Vec::new();
        let mut attempted = 0usize;

        queue.push_back((root.to_string(), 0));
        info!(
            "Starting crawl from {} (max_depth: {}, max_pages: {})",
            root, self.config.max_depth, self.config.max_pages
        );

        while let Some((url, depth)) = queue.pop_front() {
            if attempted >= self.config.max_pages {
                info!(
                    "Reached page cap ({}), {} URLs left unvisited",
                    self.config.max_pages,
                    queue.len() + 1
                );
                break;
            }

            let normalized = normalize_url(&url);
            if !visited.insert(normalized.clone()) {
                continue;
            }

            if attempted > 0 && !self.config.delay.is_zero() {
                sleep(self.config.delay).await;
            }
            attempted += 1;

            debug!("Crawling: {} (depth: {})", url, depth);
            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };
            // A redirect lands on a URL of its own, which obeys the same rules
            let landed = normalize_url(&page.url);
            if landed != normalized {
                if !visited.insert(landed) {
                    debug!("{} redirected to already visited {}", url, page.url);
                    continue;
                }
                let inside = url::Url::parse(&page.url)
                    .map(|u| is_under_root(&u, &root))
                    .unwrap_or(false);
                if depth > 0 && !inside {
                    debug!("{} redirected outside the root to {}", url, page.url);
                    continue;
                }
            }

            let content = match extract_text(&page.html) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Could not extract text from {}: {}", url, e);
                    continue;
                }
            };

            if depth < self.config.max_depth {
                match extract_links(&page.html, &page.url) {
                    Ok(links) => {
                        for link in links {
                            let Ok(parsed) = url::Url::parse(&link) else {
                                continue;
                            };
                            if is_under_root(&parsed, &root)
                                && !visited.contains(&normalize_url(&link))
                            {
                                queue.push_back((link, depth + 1));
                            }
                        }
                    }
                    Err(e) => warn!("Could not extract links from {}: {}", url, e),
                }
            }

            documents.push(Document {
                source: page.url,
                title: extract_title(&page.html),
                content,
            });
        }

        info!(
            pages = documents.len(),
            attempted = attempted,
            "Crawl finished"
        );
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_removes_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/docs/"),
            "https://example.com/docs"
        );
    }

    #[test]
    fn test_normalize_url_keeps_root() {
        assert_eq!(normalize_url("https://example.com/"), "https://example.com/");
        assert_eq!(normalize_url("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_normalize_url_drops_fragment() {
        assert_eq!(
            normalize_url("https://example.com/docs/page#intro"),
            "https://example.com/docs/page"
        );
    }

    #[test]
    fn test_is_under_root_with_path() {
        let root = url::Url::parse("https://example.com/docs").unwrap();
        let check = |s: &str| is_under_root(&url::Url::parse(s).unwrap(), &root);

        assert!(check("https://example.com/docs"));
        assert!(check("https://example.com/docs/tracing"));
        assert!(!check("https://example.com/docsearch"));
        assert!(!check("https://example.com/blog"));
        assert!(!check("https://other.com/docs/tracing"));
        assert!(!check("http://example.com/docs/tracing"));
    }

    #[test]
    fn test_is_under_root_site_root() {
        let root = url::Url::parse("https://docs.smith.langchain.com").unwrap();
        let link = url::Url::parse("https://docs.smith.langchain.com/tracing/faq").unwrap();
        assert!(is_under_root(&link, &root));
    }
}
