use motto_harvest::config::{Config, CrawlerConfig, OutputConfig, RetryConfig, SiteConfig};
use motto_harvest::crawler::{Charset, MalformedParagraphPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Network location of a mock server, e.g. `127.0.0.1:40123`
pub fn domain_of(server: &MockServer) -> String {
    format!("127.0.0.1:{}", server.address().port())
}

/// Creates a fast-polling test configuration for the given mock server
pub fn create_test_config(server: &MockServer, db_path: &str) -> Config {
    Config {
        site: SiteConfig {
            domain: domain_of(server),
            root_url: format!("{}/", server.uri()),
        },
        crawler: CrawlerConfig {
            workers: 4,
            user_agent: "TestBot/1.0".to_string(),
            charsets: vec![Charset::Gb2312, Charset::Utf8, Charset::Gbk],
            idle_backoff_ms: 5,
            poll_interval_ms: 20,
            quiet_polls: 3,
            malformed_paragraph: MalformedParagraphPolicy::AbortPage,
        },
        retry: RetryConfig {
            network_attempts: 2,
            storage_attempts: 2,
            delay_ms: 1,
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
            queue_name: "geyanw_task".to_string(),
            visited_set: "visited_urls".to_string(),
        },
    }
}

/// Markup of a detail page with the given category, title and paragraphs
pub fn detail_page(kind: &str, title: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", p))
        .collect();
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <div class="position"><a href="/">首页</a> &gt; <a href="/lizhi/">{kind}</a></div>
        <div class="main"><div class="title"><h2>{title}</h2></div></div>
        <div class="content">{body}</div>
        </body></html>"#
    )
}

/// Markup of a listing page linking to `hrefs`
pub fn listing_page(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();
    format!(r#"<html><body><ul class="list">{}</ul></body></html>"#, links)
}

/// Serves `html` as UTF-8 at `route`
pub async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}
