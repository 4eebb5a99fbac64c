use html_scraper::{Html, Selector};
use webreply_core::{Error, FetchBackend, FetchRequest, Result, SearchResult};

/// HTML (no-JS) results page; `q` carries the query.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const RESULT_ANCHOR_SELECTOR: &str = ".result__title a";

pub fn search_url(endpoint: &str, query: &str) -> Result<String> {
    url::Url::parse_with_params(endpoint, &[("q", query)])
        .map(|u| u.to_string())
        .map_err(|e| Error::InvalidUrl(format!("search endpoint {endpoint}: {e}")))
}

/// Fetch a results page and parse its title/url anchors.
pub async fn search(
    fetcher: &dyn FetchBackend,
    page_url: &str,
    timeout_ms: u64,
) -> Result<Vec<SearchResult>> {
    let req = FetchRequest::new(page_url).with_timeout_ms(timeout_ms);
    let resp = fetcher
        .fetch(&req)
        .await
        .map_err(|e| Error::Search(e.to_string()))?;
    Ok(parse_results_page(&resp.text_lossy()))
}

pub fn parse_results_page(html: &str) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse(RESULT_ANCHOR_SELECTOR) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for a in doc.select(&sel) {
        let title = a.text().collect::<String>().trim().to_string();
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let url = unwrap_redirect(href.trim());
        if title.is_empty() || !url.starts_with("http") {
            continue;
        }
        out.push(SearchResult { title, url });
    }
    out
}

/// Result anchors usually point at `//duckduckgo.com/l/?uddg=<target>`; return the target.
fn unwrap_redirect(href: &str) -> String {
    let absolute = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        href.to_string()
    };
    if let Ok(parsed) = url::Url::parse(&absolute) {
        if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
            return target.into_owned();
        }
    }
    href.to_string()
}

#[derive(Debug, Clone, Copy)]
pub struct FallbackTarget {
    pub title: &'static str,
    pub base: &'static str,
    pub param: &'static str,
}

/// Reference sites queried directly when the results page gives us nothing.
#[derive(Debug, Clone, Copy)]
pub struct FallbackDomain {
    pub triggers: &'static [&'static str],
    pub targets: &'static [FallbackTarget],
}

pub static DEFAULT_FALLBACK_DOMAINS: &[FallbackDomain] = &[
    FallbackDomain {
        triggers: &["programming", "code", "developer"],
        targets: &[
            FallbackTarget {
                title: "Stack Overflow Discussion",
                base: "https://stackoverflow.com/search",
                param: "q",
            },
            FallbackTarget {
                title: "GitHub Resources",
                base: "https://github.com/search",
                param: "q",
            },
            FallbackTarget {
                title: "MDN Web Docs",
                base: "https://developer.mozilla.org/en-US/search",
                param: "q",
            },
        ],
    },
    FallbackDomain {
        triggers: &["science", "research", "study"],
        targets: &[
            FallbackTarget {
                title: "Scientific Article",
                base: "https://www.nature.com/search",
                param: "q",
            },
            FallbackTarget {
                title: "Research Paper",
                base: "https://pubmed.ncbi.nlm.nih.gov/",
                param: "term",
            },
            FallbackTarget {
                title: "Academic Resource",
                base: "https://scholar.google.com/scholar",
                param: "q",
            },
        ],
    },
    FallbackDomain {
        triggers: &["health", "medical", "medicine"],
        targets: &[
            FallbackTarget {
                title: "Medical Information",
                base: "https://www.mayoclinic.org/search/search-results",
                param: "q",
            },
            FallbackTarget {
                title: "Health Resource",
                base: "https://www.webmd.com/search/search_results/default.aspx",
                param: "query",
            },
        ],
    },
];

/// Every domain whose trigger appears anywhere in the lowercased query contributes its
/// targets, in table order.
pub fn fallback_results(domains: &[FallbackDomain], query: &str) -> Vec<SearchResult> {
    let q = query.to_lowercase();
    let mut out = Vec::new();
    for d in domains {
        if !d.triggers.iter().any(|t| q.contains(t)) {
            continue;
        }
        for t in d.targets {
            match url::Url::parse_with_params(t.base, &[(t.param, query)]) {
                Ok(u) => out.push(SearchResult {
                    title: t.title.to_string(),
                    url: u.to_string(),
                }),
                Err(e) => tracing::warn!(base = t.base, error = %e, "bad fallback target"),
            }
        }
    }
    out
}
