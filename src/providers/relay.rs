//! Relay 推理端点适配器
//!
//! 走 reqwest 直连一个非 OpenAI 形状的上游：响应是多层嵌套 JSON
//! （output.candidates[].segments[].text），在适配器边界归一化为统一 Response；
//! HTTP 401/429/5xx 分别映射为 Authentication / RateLimited / Upstream。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::{CoachError, Response};
use crate::providers::{Capability, Provider, RespondOptions};

#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    output: Option<RelayOutput>,
}

#[derive(Debug, Deserialize)]
struct RelayOutput {
    #[serde(default)]
    candidates: Vec<RelayCandidate>,
}

#[derive(Debug, Deserialize)]
struct RelayCandidate {
    #[serde(default)]
    segments: Vec<RelaySegment>,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RelaySegment {
    text: Option<String>,
}

/// Relay 客户端：POST {prompt, system, summary} 到 base_url/v1/generate
pub struct RelayProvider {
    id: String,
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    capability: Capability,
}

impl RelayProvider {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        capability: Capability,
    ) -> Self {
        Self {
            id: id.into(),
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            capability,
        }
    }

    fn upstream(&self, message: impl Into<String>) -> CoachError {
        CoachError::Upstream {
            provider: self.id.clone(),
            message: message.into(),
        }
    }

    /// 取首个非空候选的全部片段拼接为文本
    fn normalize(&self, envelope: RelayEnvelope) -> Result<(String, f32), CoachError> {
        let candidates = envelope
            .output
            .map(|o| o.candidates)
            .unwrap_or_default();
        for candidate in candidates {
            let text: String = candidate
                .segments
                .iter()
                .filter_map(|s| s.text.as_deref())
                .collect::<Vec<_>>()
                .join("");
            if !text.trim().is_empty() {
                return Ok((text, candidate.score.unwrap_or(0.9).clamp(0.0, 1.0)));
            }
        }
        Err(self.upstream("no usable candidate in relay response"))
    }
}

#[async_trait]
impl Provider for RelayProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn respond(&self, prompt: &str, options: &RespondOptions) -> Result<Response, CoachError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CoachError::Authentication(self.id.clone()))?;

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "system": options.system_prompt,
            "summary": options.conversation_summary,
        });

        let request = self
            .http
            .post(format!("{}/v1/generate", self.base_url.trim_end_matches('/')))
            .header("x-api-key", api_key)
            .timeout(options.timeout.max(Duration::from_millis(1)))
            .json(&body)
            .send();

        let resp = tokio::time::timeout(options.timeout, request)
            .await
            .map_err(|_| CoachError::Timeout(self.id.clone()))?
            .map_err(|e| {
                if e.is_timeout() {
                    CoachError::Timeout(self.id.clone())
                } else {
                    self.upstream(e.to_string())
                }
            })?;

        match resp.status().as_u16() {
            401 | 403 => return Err(CoachError::Authentication(self.id.clone())),
            429 => return Err(CoachError::RateLimited(self.id.clone())),
            s if s >= 400 => {
                return Err(self.upstream(format!("relay returned HTTP {s}")));
            }
            _ => {}
        }

        let envelope: RelayEnvelope = resp
            .json()
            .await
            .map_err(|e| self.upstream(format!("malformed relay body: {e}")))?;
        let (content, score) = self.normalize(envelope)?;

        Ok(Response::new(content, &self.id, score))
    }
}
