//! ONNX Runtime sentence embeddings.
//!
//! Mean-pooled, L2-normalised token embeddings from a transformer encoder
//! exported to ONNX. The default model is multilingual-e5-large-instruct
//! (1024 dimensions, 512 tokens), which handles Korean news text. The model
//! directory must contain `model.onnx` and `tokenizer.json`.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Model name recorded alongside index embeddings when the directory name is unusable.
pub const DEFAULT_MODEL_NAME: &str = "multilingual-e5-large-instruct";

const DEFAULT_DIM: usize = 1024;
const MAX_TOKENS: usize = 512;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("{file} not found in {dir:?}")]
    MissingFile { file: &'static str, dir: PathBuf },
    #[error("ONNX Runtime: {0}")]
    Runtime(String),
    #[error("tokenizer: {0}")]
    Tokenizer(String),
    #[error("unexpected output shape {shape:?}, expected [{batch}, _, {dim}]")]
    OutputShape {
        shape: Vec<i64>,
        batch: usize,
        dim: usize,
    },
}

fn runtime(e: impl std::fmt::Display) -> EmbedError {
    EmbedError::Runtime(e.to_string())
}

/// Sentence embedding generator. `embed` takes `&mut self`; share behind a mutex.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
    model_name: String,
    /// BERT-style encoders take segment ids; XLM-R based ones (e5) do not.
    uses_token_types: bool,
}

impl Embedder {
    /// Load a model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> Result<Self, EmbedError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for (file, path) in [("model.onnx", &model_path), ("tokenizer.json", &tokenizer_path)] {
            if !path.exists() {
                return Err(EmbedError::MissingFile {
                    file,
                    dir: model_dir.to_path_buf(),
                });
            }
        }

        let session = Session::builder()
            .map_err(runtime)?
            .commit_from_file(&model_path)
            .map_err(runtime)?;

        let dim = session
            .outputs()
            .first()
            .and_then(|o| infer_dim(o.dtype()))
            .unwrap_or(DEFAULT_DIM);
        let uses_token_types = session
            .inputs()
            .iter()
            .any(|i| i.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedError::Tokenizer(format!("load: {e}")))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| EmbedError::Tokenizer(format!("set truncation: {e}")))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        let model_name = model_dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_MODEL_NAME)
            .to_string();

        info!(
            dim,
            model = %model_name,
            token_types = uses_token_types,
            "loaded embedding model"
        );
        Ok(Self {
            session,
            tokenizer,
            dim,
            model_name,
            uses_token_types,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Directory name of the loaded model, used as provenance in the index.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Embed a single text, returning a unit-length vector.
    pub fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors.pop().ok_or(EmbedError::OutputShape {
            shape: vec![0],
            batch: 1,
            dim: self.dim,
        })
    }

    /// Embed a batch of texts, returning one unit-length vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedError::Tokenizer(format!("encode: {e}")))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Flat [batch_size, seq_len] inputs; padding positions stay zero.
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let row = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[row + j] = i64::from(id);
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[row + j] = i64::from(mask);
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[row + j] = i64::from(tid);
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let ids = Tensor::from_array((shape, input_ids.into_boxed_slice())).map_err(runtime)?;
        let mask = Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))
            .map_err(runtime)?;

        debug!(batch_size, seq_len, "running embedding session");
        let outputs = if self.uses_token_types {
            let types =
                Tensor::from_array((shape, token_type_ids.into_boxed_slice())).map_err(runtime)?;
            self.session
                .run(ort::inputs![
                    "input_ids" => ids,
                    "attention_mask" => mask,
                    "token_type_ids" => types,
                ])
                .map_err(runtime)?
        } else {
            self.session
                .run(ort::inputs![
                    "input_ids" => ids,
                    "attention_mask" => mask,
                ])
                .map_err(runtime)?
        };

        // Token embeddings: [batch_size, seq_len, dim].
        let (output_shape, output_data) =
            outputs[0].try_extract_tensor::<f32>().map_err(runtime)?;
        let dims: &[i64] = output_shape;
        if dims.len() != 3 || dims[0] as usize != batch_size || dims[2] as usize != self.dim {
            return Err(EmbedError::OutputShape {
                shape: dims.to_vec(),
                batch: batch_size,
                dim: self.dim,
            });
        }
        let out_seq_len = dims[1] as usize;

        let embeddings = (0..batch_size)
            .map(|i| {
                let mask_row = &attention_mask[i * seq_len..(i + 1) * seq_len];
                let tokens = &output_data[i * out_seq_len * self.dim..(i + 1) * out_seq_len * self.dim];
                mean_pool(tokens, mask_row, self.dim)
            })
            .collect();
        Ok(embeddings)
    }
}

/// Mask-weighted mean of `tokens` (row-major `[seq, dim]`), then L2-normalised.
fn mean_pool(tokens: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;
    for (j, &m) in mask.iter().enumerate() {
        if m == 0 {
            continue;
        }
        let Some(token) = tokens.get(j * dim..(j + 1) * dim) else {
            break;
        };
        for (p, t) in pooled.iter_mut().zip(token) {
            *p += t;
        }
        count += 1.0;
    }
    if count > 0.0 {
        pooled.iter_mut().for_each(|p| *p /= count);
    }
    normalize(&mut pooled);
    pooled
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Last dimension of the first output, when the model declares it.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| (d > 0).then_some(d as usize)),
        _ => None,
    }
}
