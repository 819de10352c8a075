use crate::error::ConfigError;

/// Maps text to fixed-length vectors. Implementations must be deterministic
/// for identical input and model configuration, and must emit unit-length
/// vectors so the index can rank by dot product.
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, String>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Local hashed character-trigram embedder. Cheap, deterministic, and good
/// enough to rank passages of the same corpus against each other.
#[derive(Debug, Clone)]
pub struct HashedNgramEmbedder {
    model: String,
    dimensions: usize,
}

impl HashedNgramEmbedder {
    /// Resolves a model identifier to its dimension preset. An unknown name
    /// is a configuration error and should halt startup.
    pub fn load(model: &str) -> Result<Self, ConfigError> {
        let dimensions = match model {
            "hashed-ngram-128" => 128,
            "hashed-ngram-256" => 256,
            "hashed-ngram-384" => 384,
            _ => return Err(ConfigError::UnknownEmbeddingModel(model.to_string())),
        };

        Ok(Self {
            model: model.to_string(),
            dimensions,
        })
    }
}

impl Embedder for HashedNgramEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let mut vector = vec![0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return Ok(vector);
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}
