//! Wire types and HTTP plumbing shared by the Gemini agents.

use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use weaver_core::error::AgentError;

pub(crate) const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Serialize)]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
pub(crate) struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineDataPayload {
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Deserialize)]
pub(crate) struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<ContentResponse>,
}

#[derive(Deserialize)]
pub(crate) struct ContentResponse {
    #[serde(default)]
    pub parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
pub(crate) struct PartResponse {
    pub text: Option<String>,
    #[serde(rename = "inlineData")]
    pub inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineDataResponse {
    #[serde(default)]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

impl GenerateContentResponse {
    fn parts(self) -> impl Iterator<Item = PartResponse> {
        self.candidates
            .and_then(|mut candidates| {
                if candidates.is_empty() {
                    None
                } else {
                    Some(candidates.swap_remove(0))
                }
            })
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
    }
}

pub(crate) fn extract_text_response(response: GenerateContentResponse) -> Result<String, AgentError> {
    let text: String = response.parts().filter_map(|part| part.text).collect();
    if text.is_empty() {
        return Err(AgentError::ExecutionFailed(
            "Gemini API returned no text in the response candidates".into(),
        ));
    }
    Ok(text)
}

pub(crate) fn extract_inline_data(
    response: GenerateContentResponse,
) -> Result<InlineDataResponse, AgentError> {
    response
        .parts()
        .find_map(|part| part.inline_data)
        .ok_or_else(|| {
            AgentError::ExecutionFailed(
                "Gemini API returned no inline data in the response candidates".into(),
            )
        })
}

/// Posts one `generateContent` request and parses the answer.
pub(crate) async fn send_generate_content(
    client: &Client,
    base_url: &str,
    model: &str,
    api_key: &str,
    body: &GenerateContentRequest,
) -> Result<GenerateContentResponse, AgentError> {
    let url = format!("{base_url}/{model}:generateContent");

    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .json(body)
        .send()
        .await
        .map_err(|err| AgentError::ProcessError {
            status_code: None,
            message: format!("Gemini API request failed: {err}"),
            is_retryable: err.is_connect() || err.is_timeout(),
            retry_after: None,
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let retry_after = parse_retry_after(response.headers().get("retry-after"));
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
        return Err(map_http_error(status, body_text, retry_after));
    }

    response
        .json()
        .await
        .map_err(|err| AgentError::Other(format!("Failed to parse Gemini response: {err}")))
}

pub(crate) fn map_http_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> AgentError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    if let Some(delay) = retry_after {
        AgentError::process_error_with_retry_after(status.as_u16(), message, is_retryable, delay)
    } else {
        AgentError::ProcessError {
            status_code: Some(status.as_u16()),
            message,
            is_retryable,
            retry_after: None,
        }
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // HTTP-date values are ignored.
    value.parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Leaves "},{"text":"fall"}]}}]}"#,
        );
        assert_eq!(extract_text_response(response).unwrap(), "Leaves fall");
    }

    #[test]
    fn test_extract_text_without_candidates_fails() {
        let response = parse(r#"{"candidates":[]}"#);
        assert!(matches!(
            extract_text_response(response),
            Err(AgentError::ExecutionFailed(_))
        ));
    }

    #[test]
    fn test_extract_inline_data() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/L16;codec=pcm;rate=24000","data":"AAA="}}]}}]}"#,
        );
        let inline = extract_inline_data(response).unwrap();
        assert_eq!(inline.data, "AAA=");
        assert_eq!(
            inline.mime_type.as_deref(),
            Some("audio/L16;codec=pcm;rate=24000")
        );
    }

    #[test]
    fn test_map_http_error_reads_google_error_body() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#
                .to_string(),
            Some(Duration::from_secs(3)),
        );
        match err {
            AgentError::ProcessError {
                status_code,
                message,
                is_retryable,
                retry_after,
            } => {
                assert_eq!(status_code, Some(429));
                assert_eq!(message, "RESOURCE_EXHAUSTED: Quota exceeded");
                assert!(is_retryable);
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_http_error_keeps_plain_body() {
        let err = map_http_error(StatusCode::BAD_REQUEST, "nope".to_string(), None);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_speech_request_serialises_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::Text {
                text: "hi".to_string(),
            }])],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: "Kore".to_string(),
                        },
                    },
                }),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Kore"
        );
        assert_eq!(json["generationConfig"]["responseModalities"][0], "AUDIO");
    }
}
