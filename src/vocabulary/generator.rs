//! Definition generator: the slow, external source of meanings used on cache miss.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use super::models::Definition;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Generator returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Generator rejected the request: {0}")]
    Rejected(String),

    #[error("No definition for '{0}'")]
    Empty(String),

    #[error("Generator timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Produces a meaning and an example sentence for a word in a context.
/// May be slow or fail; callers bound it with a timeout.
#[async_trait]
pub trait DefinitionGenerator: Send + Sync {
    async fn generate(&self, word: &str, context: &str) -> Result<Definition>;
}

/// Client for the AI assistant's word endpoint
pub struct HttpDefinitionGenerator {
    client: Client,
    base_url: Url,
}

impl HttpDefinitionGenerator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| GeneratorError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GeneratorError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// `{base}/api/ai/assistant/word/{word}?context={context}`
    fn word_url(&self, word: &str, context: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GeneratorError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "ai", "assistant", "word", word]);
        url.query_pairs_mut().append_pair("context", context);
        Ok(url)
    }
}

#[async_trait]
impl DefinitionGenerator for HttpDefinitionGenerator {
    async fn generate(&self, word: &str, context: &str) -> Result<Definition> {
        let url = self.word_url(word, context)?;
        log::debug!("Requesting definition: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope = response.json().await?;
        if !envelope.success {
            return Err(GeneratorError::Rejected(
                envelope.message.unwrap_or_else(|| format!("code {}", envelope.code)),
            ));
        }

        let info = envelope
            .data
            .ok_or_else(|| GeneratorError::Empty(word.to_string()))?;
        definition_from_word_info(word, info)
    }
}

/// Response envelope shared by the AI service endpoints
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    success: bool,
    data: Option<WordInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct WordInfo {
    #[serde(default)]
    meanings: Vec<Option<String>>,
    #[serde(default)]
    examples: Vec<Option<ExampleSentence>>,
    phonetic: Option<String>,
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExampleSentence {
    english: Option<String>,
    chinese: Option<String>,
}

/// Placeholder the AI service emits instead of an empty meaning list
const NO_MEANING_MARKER: &str = "暂无释义信息";

fn definition_from_word_info(word: &str, info: WordInfo) -> Result<Definition> {
    let meanings: Vec<String> = info
        .meanings
        .into_iter()
        .flatten()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty() && !m.contains(NO_MEANING_MARKER))
        .map(|m| match m.split_once(": ") {
            // Part of speech with nothing after it
            Some((pos, rest)) if rest.trim().is_empty() => format!("{}:", pos),
            _ => m,
        })
        .collect();

    if meanings.is_empty() {
        return Err(GeneratorError::Empty(word.to_string()));
    }

    let example = info
        .examples
        .into_iter()
        .flatten()
        .find_map(|ex| {
            let english = ex.english.filter(|e| !e.trim().is_empty())?;
            Some(match ex.chinese.filter(|c| !c.trim().is_empty()) {
                Some(chinese) => format!("{} 【{}】", english.trim(), chinese.trim()),
                None => english.trim().to_string(),
            })
        })
        .unwrap_or_default();

    Ok(Definition {
        meaning: meanings.join(", "),
        example,
        phonetic: info.phonetic.filter(|p| !p.trim().is_empty()),
        difficulty: info.difficulty.filter(|d| !d.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ApiEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_definition_from_envelope() {
        let envelope = parse(
            r#"{
                "code": 200,
                "success": true,
                "data": {
                    "word": "ubiquitous",
                    "phonetic": "/juːˈbɪkwɪtəs/",
                    "meanings": ["adj.: 无处不在的", "", "暂无释义信息"],
                    "examples": [
                        {"english": "", "chinese": "空"},
                        {"english": "Phones are ubiquitous.", "chinese": "手机无处不在。"}
                    ],
                    "difficulty": "C1"
                }
            }"#,
        );
        assert!(envelope.success);

        let def = definition_from_word_info("ubiquitous", envelope.data.unwrap()).unwrap();
        assert_eq!(def.meaning, "adj.: 无处不在的");
        assert_eq!(def.example, "Phones are ubiquitous. 【手机无处不在。】");
        assert_eq!(def.phonetic.as_deref(), Some("/juːˈbɪkwɪtəs/"));
        assert_eq!(def.difficulty.as_deref(), Some("C1"));
    }

    #[test]
    fn test_meanings_are_joined() {
        let info = WordInfo {
            meanings: vec![Some("n. bond".into()), None, Some("v. to join".into())],
            ..Default::default()
        };
        let def = definition_from_word_info("bond", info).unwrap();
        assert_eq!(def.meaning, "n. bond, v. to join");
        assert_eq!(def.example, "");
    }

    #[test]
    fn test_empty_meanings_are_an_error() {
        let info = WordInfo {
            meanings: vec![Some(NO_MEANING_MARKER.into()), Some("  ".into())],
            ..Default::default()
        };
        assert!(matches!(
            definition_from_word_info("zzz", info),
            Err(GeneratorError::Empty(_))
        ));
    }

    #[test]
    fn test_word_url_encodes_segments() {
        let generator =
            HttpDefinitionGenerator::new("http://localhost:8084/", Duration::from_secs(1)).unwrap();
        let url = generator.word_url("café au lait", "food & drink").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8084/api/ai/assistant/word/caf%C3%A9%20au%20lait?context=food+%26+drink"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            HttpDefinitionGenerator::new("not a url", Duration::from_secs(1)),
            Err(GeneratorError::InvalidUrl(_))
        ));
    }
}
