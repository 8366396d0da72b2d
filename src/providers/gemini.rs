use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::Turn;
use crate::providers::http_errors::api_request_error;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

fn generate_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

fn to_contents(turns: &[Turn]) -> Vec<Content> {
    turns
        .iter()
        .map(|turn| Content {
            role: turn.role.as_str().to_string(),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .collect()
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Model response contained no candidates"))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(anyhow!("Model response contained no text parts"));
    }
    Ok(text)
}

pub async fn generate(client: &Client, cfg: &Config, turns: &[Turn]) -> Result<String> {
    let api_key = cfg.require_api_key()?;
    let api_url = generate_url(&cfg.api_base_url, &cfg.model);
    let body = GenerateContentRequest {
        contents: to_contents(turns),
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        turn_count = turns.len(),
        "sending generateContent request"
    );

    let response = client
        .post(&api_url)
        .header(API_KEY_HEADER, api_key.expose())
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %cfg.model,
                error = %err,
                "generateContent request failed"
            );
            api_request_error(err, &api_url, cfg.request_timeout_secs)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %cfg.model,
            status = %status,
            response_body_len = response_body.len(),
            "generateContent returned non-success status"
        );
        return Err(anyhow!(
            "Gemini request failed with status {}: {}",
            status,
            response_body
        ));
    }

    let parsed: GenerateContentResponse = response
        .json()
        .await
        .context("Failed to parse generateContent response")?;
    let text = extract_text(parsed)?;
    debug!(
        model = %cfg.model,
        response_len = text.len(),
        "received generateContent response"
    );
    Ok(text)
}
