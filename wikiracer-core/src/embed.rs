// Text embedders backing the vector oracle

use crate::error::{OracleError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Maps texts to fixed-length vectors. Vectors from one embedder are
/// comparable with each other only.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Load or reach the model so latency and failures surface up front.
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Box<E> {
    async fn ensure_ready(&self) -> Result<()> {
        (**self).ensure_ready().await
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    Hashing,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub kind: EmbedderKind,
    /// Dimensions of the local hashing embedder.
    pub dimensions: usize,
    /// OpenAI-compatible embeddings endpoint, e.g. a local sentence-transformers server.
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding a bearer token for the endpoint, if any.
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Hashing,
            dimensions: 512,
            endpoint: "http://127.0.0.1:8000/v1/embeddings".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            api_key_env: None,
            timeout_secs: 30,
        }
    }
}

impl EmbedderConfig {
    pub fn build(&self) -> Result<Box<dyn Embedder>> {
        match self.kind {
            EmbedderKind::Hashing => Ok(Box::new(HashingEmbedder::new(self.dimensions)?)),
            EmbedderKind::Remote => {
                let api_key = self
                    .api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok());
                Ok(Box::new(RemoteEmbedder::new(
                    &self.endpoint,
                    &self.model,
                    api_key,
                    Duration::from_secs(self.timeout_secs),
                )?))
            }
        }
    }
}

/// Local feature-hashing embedder over lowercase words and character
/// trigrams. Deterministic across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(OracleError::Config(
                "hashing embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();

        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(word.as_bytes())] += WORD_WEIGHT;

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let gram: String = window.iter().collect();
                vector[self.bucket(gram.as_bytes())] += TRIGRAM_WEIGHT;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn bucket(&self, bytes: &[u8]) -> usize {
        (fnv1a(bytes) % self.dimensions as u64) as usize
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn ensure_ready(&self) -> Result<()> {
        info!("Warming up embedding model {} at {}", self.model, self.endpoint);
        let probe = self.embed(&["wikiracer".to_string()]).await?;
        match probe.first() {
            Some(vector) if !vector.is_empty() => Ok(()),
            _ => Err(OracleError::NotReady(format!(
                "{} returned an empty embedding",
                self.endpoint
            ))),
        }
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts with {}", texts.len(), self.model);
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(OracleError::ShapeMismatch {
                expected: texts.len(),
                got: parsed.data.len(),
            });
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
