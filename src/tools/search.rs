//! Web search tool (DuckDuckGo HTML, no API key needed).

use async_trait::async_trait;

use super::Tool;

const MAX_RESULTS: usize = 3;

/// Search the web for information on a given query.
pub struct WebSearch {
    client: reqwest::Client,
}

impl WebSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for up-to-date information using DuckDuckGo"
    }

    fn parameter(&self) -> &str {
        "query"
    }

    async fn invoke(&self, argument: &str) -> anyhow::Result<String> {
        let encoded_query = urlencoding::encode(argument);
        let url = format!("https://html.duckduckgo.com/html/?q={}", encoded_query);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0 (compatible; ToolAgent/1.0)")
            .send()
            .await?;
        let html = response.text().await?;

        let results = extract_ddg_results(&html);
        if results.is_empty() {
            return Ok(format!("No results found for '{}'.", argument));
        }

        let mut output = format!("Search results for '{}':\n\n", argument);
        for (i, (title, url)) in results.iter().enumerate() {
            output.push_str(&format!("{}. {}: {}\n", i + 1, title, url));
        }

        Ok(output)
    }
}

/// Extract (title, url) pairs from DuckDuckGo HTML.
fn extract_ddg_results(html: &str) -> Vec<(String, String)> {
    let mut results = Vec::new();

    for chunk in html.split("class=\"result__body\"").skip(1) {
        if results.len() >= MAX_RESULTS {
            break;
        }

        let title = chunk
            .split("class=\"result__a\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .unwrap_or("");

        let url = chunk
            .split("class=\"result__url\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .map(|s| s.trim())
            .unwrap_or("");

        if !title.is_empty() {
            results.push((html_decode(title), url.to_string()));
        }
    }

    results
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <div class="result__body">
            <a class="result__a" href="/x">First &amp; Best</a>
            <a class="result__url" href="/y"> example.com/first </a>
        </div>
        <div class="result__body">
            <a class="result__a" href="/x">Second</a>
            <a class="result__url" href="/y"> example.com/second </a>
        </div>
    "#;

    #[test]
    fn extracts_titles_and_urls() {
        let results = extract_ddg_results(SAMPLE);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ("First & Best".to_string(), "example.com/first".to_string()));
        assert_eq!(results[1].0, "Second");
    }

    #[test]
    fn caps_results_at_three() {
        let many = SAMPLE.repeat(4);
        let results = extract_ddg_results(&many);
        assert_eq!(results.len(), MAX_RESULTS);
    }

    #[test]
    fn empty_html_yields_no_results() {
        assert!(extract_ddg_results("<html></html>").is_empty());
    }
}
