use anyhow::Result;
use std::hash::Hasher;
use twox_hash::XxHash64;

use docrag_core::traits::Embedder;

/// Deterministic bag-of-words embedder: each lowercased alphanumeric token is
/// hashed into one of `dim` buckets. Texts sharing words get a positive
/// cosine similarity, which is enough for tests and offline development.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("hash:d{dim}") }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let idx = usize::try_from(h % self.dim as u64).unwrap_or(0);
            let weight = 1.0 + f32::from(u16::try_from(h >> 48).unwrap_or(0)) / f32::from(u16::MAX);
            v[idx] += weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

    #[test]
    fn shared_words_score_higher() {
        let e = HashEmbedder::new(256);
        let v = e.embed_batch(&["opening hours monday".into(), "Opening HOURS!".into(), "parking garage".into()]).expect("embed");
        assert!(cosine(&v[0], &v[1]) > cosine(&v[0], &v[2]));
    }

    #[test]
    fn text_without_tokens_is_zero_vector() {
        let e = HashEmbedder::new(8);
        let v = e.embed_batch(&["  ...  ".into()]).expect("embed");
        assert!(v[0].iter().all(|x| *x == 0.0));
    }
}
