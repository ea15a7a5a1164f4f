//! Text-analysis collaborator: turns a finished session's text into a short
//! summary, a few emotion keywords and one paragraph of feedback.
//!
//! Oversized or empty text is rejected before any request is made. Every
//! upstream failure collapses into [`CollaboratorError::SummaryUnavailable`];
//! neither the text nor the upstream response is logged.

use indoc::{formatdoc, indoc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{endpoint, http_client, normalize_base_url};
use crate::error::{CollaboratorError, Result, ValidationError};
use crate::flow::SessionStats;
use crate::storage::SummaryConfig;

/// Hard cap on the text sent for analysis, in characters.
pub const MAX_SUMMARY_CHARS: usize = 10_000;

const SYSTEM_PROMPT: &str = indoc! {"
    You are a journaling coach. You support the writer's reflection with
    concrete, constructive feedback grounded in what they actually wrote.
    Offer options instead of verdicts, and avoid generic phrases and
    template praise.
"};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: Vec<String>,
    pub emotions: Vec<String>,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub text: String,
    pub stats: Option<SessionStats>,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: SessionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let len = self.text.chars().count();
        if len > MAX_SUMMARY_CHARS {
            return Err(ValidationError::TextTooLong {
                len,
                max: MAX_SUMMARY_CHARS,
            });
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        let stats_line = self
            .stats
            .as_ref()
            .map(|s| {
                format!(
                    "Session: {} characters, {} words, {}s total, {}s in flow, avg {} CPM, max {} CPM, {} fade recoveries, ended {}.\n",
                    s.total_chars,
                    s.total_words,
                    s.total_time_secs,
                    s.flow_time_secs,
                    s.avg_cpm,
                    s.max_cpm,
                    s.fade_recoveries,
                    s.end_reason,
                )
            })
            .unwrap_or_default();

        formatdoc! {r#"
            Read the writer's text below and pick only the 2-3 perspectives most
            relevant to it:

            1. How emotions shift and how strong they are
            2. Thinking patterns, beliefs and cognitive habits
            3. Links between triggers and outcomes
            4. Values and motivation
            5. Coping strategies used and how well they worked
            6. Budding insights or lessons
            7. Possible next steps or small experiments

            {stats_line}---
            {text}
            ---

            Answer with JSON in exactly this shape:
            {{
              "summary": ["point 1", "point 2", "point 3"],
              "emotions": ["emotion 1", "emotion 2", "emotion 3"],
              "feedback": "3-4 sentences (60-100 words): one empathetic sentence mirroring the emotion, 1-2 concrete insights from the chosen perspectives, and a forward-looking question or suggestion that respects the writer's autonomy. Refer to specific facts or phrases from the text."
            }}

            Write the summary as first-person bullet points of what the writer covered,
            e.g. "Thought about stress at work", "Touched on my relationship with my manager".
        "#,
            stats_line = stats_line,
            text = self.text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct SummaryClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl SummaryClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let defaults = SummaryConfig::default();
        Ok(Self {
            http: http_client(),
            base_url: normalize_base_url(base_url)?,
            api_key: api_key.into(),
            model: defaults.model,
            temperature: defaults.temperature,
        })
    }

    pub fn from_config(config: &SummaryConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::new(&config.base_url, api_key)?
            .with_model(&config.model)
            .with_temperature(config.temperature))
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResult> {
        request.validate()?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": request.prompt() },
            ],
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .http
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|_| unavailable(None))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(Some(status.as_u16())));
        }

        let completion: ChatCompletion =
            response.json().await.map_err(|_| unavailable(Some(status.as_u16())))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| unavailable(Some(status.as_u16())))?;
        let result: SummaryResult =
            serde_json::from_str(&content).map_err(|_| unavailable(Some(status.as_u16())))?;

        debug!(
            summary_points = result.summary.len(),
            emotions = result.emotions.len(),
            "summary generated"
        );
        Ok(result)
    }
}

fn unavailable(status: Option<u16>) -> crate::error::CoreError {
    warn!(operation = "summary", status, "text analysis failed");
    CollaboratorError::SummaryUnavailable.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::flow::EndReason;
    use chrono::Utc;

    fn completion_body(content: &str) -> String {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string()
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(
            SummaryRequest::new("  \n\t").validate(),
            Err(ValidationError::EmptyText)
        );
    }

    #[test]
    fn limit_is_counted_in_characters() {
        let at_limit = "é".repeat(MAX_SUMMARY_CHARS);
        assert!(SummaryRequest::new(at_limit).validate().is_ok());
        let over = "a".repeat(MAX_SUMMARY_CHARS + 1);
        assert_eq!(
            SummaryRequest::new(over).validate(),
            Err(ValidationError::TextTooLong {
                len: MAX_SUMMARY_CHARS + 1,
                max: MAX_SUMMARY_CHARS
            })
        );
    }

    #[test]
    fn prompt_includes_stats_digest_when_present() {
        let stats = SessionStats {
            total_chars: 120,
            total_words: 20,
            avg_cpm: 80,
            max_cpm: 180,
            flow_time_secs: 30,
            total_time_secs: 90,
            fade_recoveries: 2,
            end_reason: EndReason::FadeDeath,
            ended_at: Utc::now(),
        };
        let prompt = SummaryRequest::new("today was long").with_stats(stats).prompt();
        assert!(prompt.contains("today was long"));
        assert!(prompt.contains("2 fade recoveries, ended fade-death"));
        assert!(!SummaryRequest::new("x").prompt().contains("Session:"));
    }

    #[tokio::test]
    async fn summarize_parses_model_json() {
        let mut server = mockito::Server::new_async().await;
        let content = r#"{"summary":["Wrote about work"],"emotions":["tired","hopeful"],"feedback":"Keep going."}"#;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(content))
            .create_async()
            .await;

        let client = SummaryClient::new(&server.url(), "test-key").unwrap();
        let result = client
            .summarize(&SummaryRequest::new("I wrote about work today."))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.summary, vec!["Wrote about work".to_string()]);
        assert_eq!(result.emotions.len(), 2);
        assert_eq!(result.feedback, "Keep going.");
    }

    #[tokio::test]
    async fn oversized_text_never_reaches_the_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = SummaryClient::new(&server.url(), "k").unwrap();
        let err = client
            .summarize(&SummaryRequest::new("a".repeat(MAX_SUMMARY_CHARS + 1)))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::TextTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn upstream_error_is_collapsed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body(r#"{"error":"model overloaded: secret internals"}"#)
            .create_async()
            .await;

        let client = SummaryClient::new(&server.url(), "k").unwrap();
        let err = client
            .summarize(&SummaryRequest::new("hello"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to generate summary");
    }

    #[tokio::test]
    async fn malformed_content_is_collapsed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion_body("not json at all"))
            .create_async()
            .await;

        let client = SummaryClient::new(&server.url(), "k").unwrap();
        let err = client
            .summarize(&SummaryRequest::new("hello"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Collaborator(CollaboratorError::SummaryUnavailable)
        ));
    }
}
