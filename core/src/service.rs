//! Remote collaborators the game talks to.
//!
//! The game is driven from a single thread, so none of these futures need to
//! be `Send`.
#![allow(async_fn_in_trait)]

use alloc::{string::String, vec::Vec};
use serde::{Deserialize, Serialize};

use crate::*;

/// Text embedding returned by the embedding model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn norm(&self) -> f32 {
        libm::sqrtf(self.0.iter().map(|value| value * value).sum())
    }

    /// Scales the vector to unit length; a zero vector is returned unchanged.
    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 && norm.is_finite() {
            for value in &mut self.0 {
                *value /= norm;
            }
        }
        self
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// One image the matcher considers similar to the text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub id: String,
    pub similarity: f32,
}

impl SimilarityMatch {
    pub fn new(id: impl Into<String>, similarity: f32) -> Self {
        Self {
            id: id.into(),
            similarity,
        }
    }
}

pub trait Embedder {
    async fn embed_text(&self, text: &str) -> core::result::Result<Embedding, ServiceError>;
}

pub trait Matcher {
    async fn match_embedding(
        &self,
        embedding: &Embedding,
        candidate_ids: &[String],
    ) -> core::result::Result<Vec<SimilarityMatch>, ServiceError>;
}

pub trait ImageSource {
    async fn fetch_random_images(&self) -> core::result::Result<Vec<ImageRecord>, ServiceError>;
}

/// What the collaborators said about an attempt.
pub type MatchOutcome = core::result::Result<Vec<SimilarityMatch>, ServiceError>;

/// An attempt that has been accepted and is waiting on the collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingAttempt {
    pub(crate) epoch: Epoch,
    pub(crate) text: String,
    pub(crate) candidates: Vec<String>,
}

impl PendingAttempt {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Embeds the attempt text and asks the matcher which cells it resembles.
    pub async fn evaluate<E, M>(&self, embedder: &E, matcher: &M) -> MatchOutcome
    where
        E: Embedder + ?Sized,
        M: Matcher + ?Sized,
    {
        let embedding = embedder.embed_text(&self.text).await?.normalized();
        matcher
            .match_embedding(&embedding, &self.candidates)
            .await
    }
}
