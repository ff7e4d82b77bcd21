//! LLM diff annotation over OpenAI-compatible or Anthropic HTTP endpoints.
//!
//! Strictly best-effort: every failure surfaces as `EnrichmentFailure` and
//! the engine swallows it without touching the primary score.

use async_trait::async_trait;
use serde::Deserialize;

use intel_engine::error::{IntelError, Result};
use intel_engine::sources::{DiffAnnotation, DiffAnnotator};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const MAX_DIFF_CHARS: usize = 30_000;

pub struct HttpDiffAnnotator {
    provider: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AnnotationPayload {
    risk_score: f64,
    summary: String,
    breaking_change: bool,
    suggested_action: String,
}

impl HttpDiffAnnotator {
    pub fn new(provider: &str, api_key: &str, model: &str) -> Self {
        Self {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn prompt(diff: &str) -> String {
        let truncated: String = diff.chars().take(MAX_DIFF_CHARS).collect();
        format!(
            "Analyze this git diff for operational deployment risk. \
             Return ONLY valid JSON with this shape:\n\
             {{\"risk_score\": <1-10 float>, \
             \"summary\": \"<one sentence on what this change does>\", \
             \"breaking_change\": <bool>, \
             \"suggested_action\": \"PROCEED\" | \"REVIEW\" | \"BLOCK\"}}\n\n\
             DIFF:\n{truncated}"
        )
    }

    async fn call_openai(&self, prompt: &str) -> Result<String> {
        let model = if self.model.is_empty() {
            "gpt-4o-mini"
        } else {
            self.model.as_str()
        };
        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": "You are a DevOps risk analyst. Output JSON only."},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.2,
            "response_format": {"type": "json_object"},
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntelError::EnrichmentFailure(format!("openai: {e}")))?;

        if !resp.status().is_success() {
            return Err(IntelError::EnrichmentFailure(format!(
                "openai: {}",
                resp.status()
            )));
        }
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IntelError::EnrichmentFailure(format!("openai: {e}")))?;
        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| IntelError::EnrichmentFailure("openai: empty response".to_string()))
    }

    async fn call_anthropic(&self, prompt: &str) -> Result<String> {
        let model = if self.model.is_empty() {
            "claude-3-5-haiku-latest"
        } else {
            self.model.as_str()
        };
        let body = serde_json::json!({
            "model": model,
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": prompt}],
        });

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntelError::EnrichmentFailure(format!("anthropic: {e}")))?;

        if !resp.status().is_success() {
            return Err(IntelError::EnrichmentFailure(format!(
                "anthropic: {}",
                resp.status()
            )));
        }
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IntelError::EnrichmentFailure(format!("anthropic: {e}")))?;
        data["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| IntelError::EnrichmentFailure("anthropic: empty response".to_string()))
    }
}

/// Parse the model's JSON reply, tolerating markdown code fences.
fn parse_annotation(content: &str) -> Result<DiffAnnotation> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let payload: AnnotationPayload = serde_json::from_str(trimmed)
        .map_err(|e| IntelError::EnrichmentFailure(format!("bad annotation JSON: {e}")))?;

    Ok(DiffAnnotation {
        risk_score: payload.risk_score.clamp(0.0, 10.0),
        summary: payload.summary,
        breaking_change: payload.breaking_change,
        suggested_action: payload.suggested_action,
    })
}

#[async_trait]
impl DiffAnnotator for HttpDiffAnnotator {
    async fn annotate(&self, diff: &str) -> Result<DiffAnnotation> {
        let prompt = Self::prompt(diff);
        let content = match self.provider.as_str() {
            "anthropic" => self.call_anthropic(&prompt).await?,
            _ => self.call_openai(&prompt).await?,
        };
        parse_annotation(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_parsing_strips_code_fences() {
        let content = "```json\n{\"risk_score\": 7.5, \"summary\": \"Rewrites token refresh\", \
                       \"breaking_change\": true, \"suggested_action\": \"REVIEW\"}\n```";
        let annotation = parse_annotation(content).unwrap();
        assert_eq!(annotation.risk_score, 7.5);
        assert!(annotation.breaking_change);
        assert_eq!(annotation.suggested_action, "REVIEW");
    }

    #[test]
    fn out_of_range_risk_is_clamped() {
        let content = "{\"risk_score\": 14.0, \"summary\": \"x\", \
                       \"breaking_change\": false, \"suggested_action\": \"PROCEED\"}";
        assert_eq!(parse_annotation(content).unwrap().risk_score, 10.0);
    }
}
