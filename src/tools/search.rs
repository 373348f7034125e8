//! Topic lookup backed by Wikipedia.

use super::weather::parse_url;
use super::{fetch_json, ParamSpec, Tool, ToolArgs};
use crate::config::ToolSettings;
use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};
use url::Url;

/// Looks a topic up and returns a short description or summary.
pub struct SearchTool {
    client: reqwest::Client,
    search_url: Url,
    summary_url: Url,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Default, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
}

/// First hit of an opensearch response.
#[derive(Debug, PartialEq)]
struct Hit {
    title: String,
    description: Option<String>,
}

impl SearchTool {
    pub fn new(client: reqwest::Client, settings: &ToolSettings) -> Result<Self> {
        Ok(Self {
            client,
            search_url: parse_url("tools.search_url", &settings.search_url)?,
            summary_url: parse_url("tools.summary_url", &settings.summary_url)?,
            max_chars: settings.summary_max_chars,
        })
    }

    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> std::result::Result<String, ToolError> {
        let url = Url::parse_with_params(
            self.search_url.as_str(),
            &[
                ("action", "opensearch"),
                ("search", query),
                ("limit", "1"),
                ("format", "json"),
            ],
        )
        .map_err(|e| ToolError::Failed(format!("Error: {}", e)))?;

        let response: Value = fetch_json(&self.client, url).await?;
        let Some(hit) = first_hit(&response) else {
            return Ok(format!("No results found for: {}", query));
        };

        if let Some(description) = hit.description {
            return Ok(description);
        }

        match self.summary(&hit.title).await {
            Ok(summary) if !summary.extract.is_empty() => {
                Ok(truncate(&summary.extract, self.max_chars))
            }
            Ok(_) => Ok(format!("Found: {}", hit.title)),
            Err(e) => {
                warn!("Summary fetch for '{}' failed: {}", hit.title, e);
                Ok(format!("Found: {} (couldn't fetch details)", hit.title))
            }
        }
    }

    async fn summary(&self, title: &str) -> std::result::Result<PageSummary, ToolError> {
        let mut url = self.summary_url.clone();
        url.path_segments_mut()
            .map_err(|_| ToolError::Failed("Error: summary URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&title.replace(' ', "_"));

        fetch_json(&self.client, url).await
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Use for factual questions about people, places, concepts."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required_string("query", "The search query")]
    }

    async fn execute(&self, args: ToolArgs) -> std::result::Result<String, ToolError> {
        let args: SearchArgs = args.parse()?;
        self.lookup(args.query.trim()).await
    }
}

/// Pull the first title and its non-empty description out of an
/// opensearch array `[query, [titles], [descriptions], [links]]`.
fn first_hit(response: &Value) -> Option<Hit> {
    let parts = response.as_array().filter(|a| a.len() >= 4)?;
    let title = parts[1].as_array()?.first()?.as_str()?.to_string();
    let description = parts[2]
        .as_array()
        .and_then(|d| d.first())
        .and_then(|d| d.as_str())
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Some(Hit { title, description })
}

/// Cut to `max_chars` characters, marking the cut with `...`.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::http_client;
    use crate::tools::test_server::{serve, Route};
    use serde_json::json;

    async fn tool_against(routes: Vec<Route>) -> SearchTool {
        let base = serve(routes).await;
        let settings = ToolSettings {
            search_url: format!("{}/w/api.php", base),
            summary_url: format!("{}/summary/", base),
            summary_max_chars: 20,
            ..ToolSettings::default()
        };
        SearchTool::new(http_client(&settings).unwrap(), &settings).unwrap()
    }

    const UNDESCRIBED: &str = r#"["rust",["Rust (programming language)"],[""],["https://example.org"]]"#;

    #[test]
    fn test_first_hit_prefers_description() {
        let response = json!(["rust", ["Rust (programming language)"], ["Systems language"], ["https://…"]]);
        assert_eq!(
            first_hit(&response),
            Some(Hit {
                title: "Rust (programming language)".to_string(),
                description: Some("Systems language".to_string()),
            })
        );
    }

    #[test]
    fn test_first_hit_without_description() {
        let response = json!(["oslo", ["Oslo"], [""], ["https://…"]]);
        let hit = first_hit(&response).unwrap();
        assert_eq!(hit.title, "Oslo");
        assert_eq!(hit.description, None);
    }

    #[test]
    fn test_first_hit_no_results() {
        assert_eq!(first_hit(&json!(["zzzz", [], [], []])), None);
        assert_eq!(first_hit(&json!(["zzzz"])), None);
        assert_eq!(first_hit(&json!({"error": "bad"})), None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 500), "short");

        let long = "a".repeat(600);
        let cut = truncate(&long, 500);
        assert_eq!(cut.len(), 503);
        assert!(cut.ends_with("..."));

        let exact = "b".repeat(500);
        assert_eq!(truncate(&exact, 500), exact);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate(&text, 3), "ééé...");
    }

    #[test]
    fn test_decode_summary() {
        let summary: PageSummary =
            serde_json::from_str(r#"{"title":"Oslo","extract":"Oslo is the capital of Norway."}"#)
                .unwrap();
        assert_eq!(summary.extract, "Oslo is the capital of Norway.");

        let empty: PageSummary = serde_json::from_str(r#"{"title":"Oslo"}"#).unwrap();
        assert!(empty.extract.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_returns_description() {
        let tool = tool_against(vec![Route::new(
            "/w/api.php",
            200,
            r#"["oslo",["Oslo"],["Capital of Norway"],["https://example.org"]]"#,
        )])
        .await;

        assert_eq!(tool.lookup("oslo").await.unwrap(), "Capital of Norway");
    }

    #[tokio::test]
    async fn test_lookup_no_results() {
        let tool = tool_against(vec![Route::new("/w/api.php", 200, r#"["zzzz",[],[],[]]"#)]).await;

        assert_eq!(tool.lookup("zzzz").await.unwrap(), "No results found for: zzzz");
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_truncated_summary() {
        let tool = tool_against(vec![
            Route::new("/w/api.php", 200, UNDESCRIBED),
            Route::new(
                "/summary/",
                200,
                r#"{"extract":"Rust is a general-purpose programming language."}"#,
            ),
        ])
        .await;

        assert_eq!(tool.lookup("rust").await.unwrap(), "Rust is a general-pu...");
    }

    #[tokio::test]
    async fn test_lookup_summary_failure_keeps_title() {
        let tool = tool_against(vec![
            Route::new("/w/api.php", 200, UNDESCRIBED),
            Route::new("/summary/", 500, "{}"),
        ])
        .await;

        assert_eq!(
            tool.lookup("rust").await.unwrap(),
            "Found: Rust (programming language) (couldn't fetch details)"
        );
    }

    #[tokio::test]
    async fn test_lookup_empty_summary_reports_title() {
        let tool = tool_against(vec![
            Route::new("/w/api.php", 200, UNDESCRIBED),
            Route::new("/summary/", 200, r#"{"title":"Rust"}"#),
        ])
        .await;

        assert_eq!(
            tool.lookup("rust").await.unwrap(),
            "Found: Rust (programming language)"
        );
    }

    #[tokio::test]
    async fn test_lookup_search_failure_is_an_error() {
        let tool = tool_against(vec![Route::new("/w/api.php", 200, "not json")]).await;

        let err = tool.lookup("rust").await.unwrap_err();
        assert!(err.to_string().starts_with("Error: malformed response:"));
    }
}
