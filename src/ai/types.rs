use serde::{Deserialize, Serialize};

/// Request body for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self { role: "user".to_string(), content: content.to_string() }
    }
}

/// Response body; only the fields we read.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("hello")],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hello"}],
            })
        );
    }

    #[test]
    fn response_parses_with_and_without_content() {
        let raw = json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]});
        let response: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hi"));

        let raw = json!({"choices": [{"message": {"role": "assistant"}}]});
        let response: ChatResponse = serde_json::from_value(raw).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
