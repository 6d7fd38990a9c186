use anyhow::Result;
use std::str::FromStr;
use tiktoken_rs::CoreBPE;

/// Approximate characters per token for English prose with GPT-family encodings.
pub const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

/// Counts tokens in a piece of text. Implementations must be deterministic.
pub trait Tokenizer {
    fn count_tokens(&self, text: &str) -> usize;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

/// Exact counts from a byte-pair encoding.
pub struct BpeTokenizer {
    bpe: CoreBPE,
}

impl BpeTokenizer {
    /// `o200k_base`, the encoding used by the GPT-4o and GPT-5 model families.
    pub fn o200k() -> Result<Self> {
        let bpe = tiktoken_rs::o200k_base()
            .map_err(|e| anyhow::anyhow!("Failed to load o200k_base encoding: {}", e))?;
        Ok(Self { bpe })
    }

    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| anyhow::anyhow!("Failed to load cl100k_base encoding: {}", e))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for BpeTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Character-count estimate, for when a real encoding is not wanted.
#[derive(Debug, Clone, Copy)]
pub struct CharEstimateTokenizer {
    chars_per_token: usize,
}

impl CharEstimateTokenizer {
    pub fn new() -> Self {
        Self {
            chars_per_token: CHARS_PER_TOKEN_ESTIMATE,
        }
    }

    pub fn with_chars_per_token(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Default for CharEstimateTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for CharEstimateTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    #[default]
    O200k,
    Cl100k,
    Estimate,
}

impl TokenizerKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenizerKind::O200k => "o200k",
            TokenizerKind::Cl100k => "cl100k",
            TokenizerKind::Estimate => "estimate",
        }
    }

    pub fn build(&self) -> Result<Box<dyn Tokenizer>> {
        Ok(match self {
            TokenizerKind::O200k => Box::new(BpeTokenizer::o200k()?),
            TokenizerKind::Cl100k => Box::new(BpeTokenizer::cl100k()?),
            TokenizerKind::Estimate => Box::new(CharEstimateTokenizer::new()),
        })
    }
}

impl FromStr for TokenizerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "o200k" | "o200k_base" => Ok(TokenizerKind::O200k),
            "cl100k" | "cl100k_base" => Ok(TokenizerKind::Cl100k),
            "estimate" => Ok(TokenizerKind::Estimate),
            other => Err(anyhow::anyhow!(
                "Unknown tokenizer '{}' (expected o200k, cl100k or estimate)",
                other
            )),
        }
    }
}
