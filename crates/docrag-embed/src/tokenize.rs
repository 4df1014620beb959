use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Tokenizer, TruncationParams};

/// Makes the tokenizer itself cut encodings to `max_len`, so post-processing
/// still appends the closing special token (`[SEP]`, `</s>`).
pub fn apply_truncation(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..TruncationParams::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(())
}

/// Token ids and attention mask for a batch, each `[B, T]` (u32), where `T` is
/// the longest encoding. Shorter rows are padded with the tokenizer's pad id
/// and a zero mask. Expects [`apply_truncation`] to have been applied; longer
/// encodings are cut at `max_len` as a last resort.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let pad_id = tokenizer.get_padding().map_or(0, |p| p.pad_id);
    let seq_len = encodings.iter().map(|e| e.get_ids().len().min(max_len)).max().unwrap_or(0).max(1);

    let mut ids = Vec::with_capacity(texts.len() * seq_len);
    let mut mask = Vec::with_capacity(texts.len() * seq_len);
    for enc in &encodings {
        let n = enc.get_ids().len().min(seq_len);
        ids.extend_from_slice(&enc.get_ids()[..n]);
        mask.extend_from_slice(&enc.get_attention_mask()[..n]);
        ids.extend(std::iter::repeat(pad_id).take(seq_len - n));
        mask.extend(std::iter::repeat(0u32).take(seq_len - n));
    }
    let input_ids = Tensor::from_vec(ids, (encodings.len(), seq_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (encodings.len(), seq_len), device)?;
    Ok((input_ids, attention_mask))
}
