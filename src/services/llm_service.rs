use crate::config::OpenAiSettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single schema-constrained request to a chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPrompt {
    pub model: String,
    pub system: String,
    pub user: String,
    pub schema_name: &'static str,
    pub schema: JsonValue,
    pub temperature: f32,
}

/// Chat model that answers with a JSON document conforming to the prompt's
/// schema.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete_json(&self, prompt: StructuredPrompt) -> Result<JsonValue>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a JsonValue,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    r#type: &'a str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat<'a>,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct RespChoiceMsg {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct RespChoice {
    message: RespChoiceMsg,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<RespChoice>,
}

impl OpenAiClient {
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete_json(&self, prompt: StructuredPrompt) -> Result<JsonValue> {
        let req = Req {
            model: &prompt.model,
            temperature: prompt.temperature,
            response_format: ResponseFormat {
                r#type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: prompt.schema_name,
                    strict: true,
                    schema: &prompt.schema,
                },
            },
            messages: vec![
                Msg {
                    role: "system",
                    content: &prompt.system,
                },
                Msg {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        tracing::debug!(model = %prompt.model, schema = prompt.schema_name, "Sending request to OpenAI");
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("OpenAI API Error {}: {}", status, text)));
        }

        let body: Resp = res.json().await?;
        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Provider("OpenAI response contained no choices".to_string()))?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(Error::Provider(format!("Model refused the request: {}", refusal)));
        }

        let content = message
            .content
            .ok_or_else(|| Error::Provider("Invalid OpenAI response format".to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Provider(format!("Model returned malformed JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> OpenAiSettings {
        OpenAiSettings {
            api_key: "sk-test".to_string(),
            base_url,
            model: "gpt-4o-mini".to_string(),
            validator_model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn prompt() -> StructuredPrompt {
        StructuredPrompt {
            model: "gpt-4o-mini".to_string(),
            system: "system".to_string(),
            user: "user".to_string(),
            schema_name: "thing",
            schema: json!({"type": "object"}),
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn parses_message_content_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_schema", "json_schema": {"name": "thing", "strict": true}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(server.uri())).unwrap();
        let value = client.complete_json(prompt()).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn non_success_status_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(server.uri())).unwrap();
        let err = client.complete_json(prompt()).await.unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn refusal_and_garbage_content_fail_closed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Sure! Here are your questions:"}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(server.uri())).unwrap();
        let err = client.complete_json(prompt()).await.unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("malformed JSON")));

        let refusing = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": null, "refusal": "I can't help with that."}}]
            })))
            .mount(&refusing)
            .await;

        let client = OpenAiClient::new(&settings(refusing.uri())).unwrap();
        let err = client.complete_json(prompt()).await.unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("refused")));
    }
}
