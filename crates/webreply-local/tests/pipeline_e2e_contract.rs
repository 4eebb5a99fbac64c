use axum::{extract::Query, routing::get, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use webreply_core::Answerer;
use webreply_local::gather::{GatherConfig, SourceGatherer};
use webreply_local::pacing::NoPause;
use webreply_local::respond::{Responder, ResponderConfig};
use webreply_local::{LocalFetcher, WebAnswerer};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn page(sentence: &str) -> String {
    format!(
        "<html><head><script>var tracking = 1;</script></head><body>\
         <header>Site header</header><nav>Home | About</nav>\
         <article><p>{}</p></article>\
         <footer>Copyright</footer></body></html>",
        vec![sentence; 20].join(" ")
    )
}

const ALPHA: &str = "Osmosis moves water across a membrane.";
const BETA: &str = "Solute concentration drives the flow.";

/// Search page, two articles, and a MediaWiki-ish api on one local server.
async fn fixture() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");

    let search_base = base.clone();
    let app = Router::new()
        .route(
            "/html/",
            get(move |q: Query<HashMap<String, String>>| {
                let base = search_base.clone();
                async move {
                    assert_eq!(q.get("q").map(String::as_str), Some("what is osmosis"));
                    axum::response::Html(format!(
                        "<html><body>\
                         <div class=\"result\"><h2 class=\"result__title\"><a href=\"{base}/a\">Alpha article</a></h2></div>\
                         <div class=\"result\"><h2 class=\"result__title\"><a href=\"{base}/missing\">Dead link</a></h2></div>\
                         <div class=\"result\"><h2 class=\"result__title\"><a href=\"{base}/b\">Beta article</a></h2></div>\
                         <div class=\"result\"><h2 class=\"result__title\"><a href=\"/relative\">Relative</a></h2></div>\
                         </body></html>"
                    ))
                }
            }),
        )
        .route("/a", get(|| async { axum::response::Html(page(ALPHA)) }))
        .route("/b", get(|| async { axum::response::Html(page(BETA)) }))
        .route(
            "/w/api.php",
            get(|q: Query<HashMap<String, String>>| async move {
                match q.get("action").map(String::as_str) {
                    Some("opensearch") => axum::Json(serde_json::json!([
                        q.get("search").cloned().unwrap_or_default(),
                        ["Osmosis"],
                        [""],
                        ["https://en.wikipedia.org/wiki/Osmosis"]
                    ])),
                    _ => axum::Json(serde_json::json!({
                        "query": {"pages": {"22498": {
                            "title": "Osmosis",
                            "extract": "Osmosis is the spontaneous net movement of solvent molecules through a selectively permeable membrane."
                        }}}
                    })),
                }
            }),
        );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn answerer(addr: SocketAddr) -> WebAnswerer {
    let cfg = GatherConfig {
        search_endpoint: format!("http://{addr}/html/"),
        encyclopedia_endpoint: format!("http://{addr}/w/api.php"),
        timeout_ms: 2_000,
        ..GatherConfig::default()
    };
    let fetcher = LocalFetcher::with_defaults().unwrap();
    let gatherer = SourceGatherer::new(Arc::new(fetcher), cfg).with_pacer(Arc::new(NoPause));
    WebAnswerer::new(gatherer, Responder::new(ResponderConfig::default()))
}

#[tokio::test]
async fn pipeline_scrapes_fixture_pages_into_a_definition_answer() {
    let addr = fixture().await;
    let out = answerer(addr).answer("what is osmosis").await.unwrap();

    let titles: Vec<_> = out.sources.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Alpha article",
            "Beta article",
            "Osmosis",
            "Latest developments in what is osmosis"
        ]
    );
    assert_eq!(out.sources[0].source, "127.0.0.1");
    assert_eq!(out.sources[2].source, "Wikipedia");
    assert_eq!(out.sources[2].url, "https://en.wikipedia.org/wiki/Osmosis");

    // Boilerplate never reaches the answer.
    assert!(!out.answer.contains("Site header"));
    assert!(!out.answer.contains("tracking"));

    // Slot 1 quotes 500 chars of the first page, slot 2 quotes 350 of the second.
    let first: String = vec![ALPHA; 20].join(" ").chars().take(500).collect();
    let second: String = vec![BETA; 20].join(" ").chars().take(350).collect();
    assert!(out.answer.starts_with(&format!("{first} {second} ")));
    assert!(out.answer.contains("Osmosis is the spontaneous net movement"));
    assert!(out.answer.ends_with(
        "This information has been researched from multiple reliable sources to provide accurate understanding."
    ));
}

#[tokio::test]
async fn unreachable_upstreams_degrade_to_news_only() {
    // Nothing listens on the fixture's routes here.
    let app = Router::new();
    let addr = serve(app).await;
    let out = answerer(addr).answer("pizza dough").await.unwrap();

    assert_eq!(out.sources.len(), 1);
    assert_eq!(out.sources[0].source, "News Sources");
    assert!(out
        .answer
        .ends_with("This comprehensive information has been compiled from multiple reliable sources."));
}
