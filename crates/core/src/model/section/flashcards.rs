use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::model::ids::CardPairId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlashcardsError {
    #[error("duplicate card pair id {0}")]
    DuplicatePairId(CardPairId),

    #[error("card pair {0} not found")]
    PairNotFound(CardPairId),

    #[error("no card pair id is left after {}", u32::MAX)]
    PairIdsExhausted,
}

/// One concept/details card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardPair {
    pub id: CardPairId,
    pub concept: String,
    pub details: String,
}

impl CardPair {
    pub fn new(id: CardPairId, concept: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id,
            concept: concept.into(),
            details: details.into(),
        }
    }
}

/// Payload of a flashcards section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardsData {
    title: String,
    card_pairs: Vec<CardPair>,
}

impl FlashcardsData {
    /// # Errors
    ///
    /// Returns `FlashcardsError::DuplicatePairId` if two pairs share an id.
    pub fn new(title: impl Into<String>, card_pairs: Vec<CardPair>) -> Result<Self, FlashcardsError> {
        let mut seen = BTreeSet::new();
        for pair in &card_pairs {
            if !seen.insert(pair.id) {
                return Err(FlashcardsError::DuplicatePairId(pair.id));
            }
        }
        Ok(Self {
            title: title.into(),
            card_pairs,
        })
    }

    pub(crate) fn placeholder() -> Self {
        Self {
            title: String::new(),
            card_pairs: Vec::new(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn card_pairs(&self) -> &[CardPair] {
        &self.card_pairs
    }

    #[must_use]
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Appends a pair with an id one past the highest in use.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardsError::PairIdsExhausted` if the highest id is
    /// already `u32::MAX`.
    pub fn with_pair_added(
        &self,
        concept: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<Self, FlashcardsError> {
        let next_id = match self.card_pairs.iter().map(|p| p.id.value()).max() {
            None => 1,
            Some(max) => max.checked_add(1).ok_or(FlashcardsError::PairIdsExhausted)?,
        };
        let mut next = self.clone();
        next.card_pairs
            .push(CardPair::new(CardPairId::new(next_id), concept, details));
        Ok(next)
    }

    /// # Errors
    ///
    /// Returns `FlashcardsError::PairNotFound` if no pair has this id.
    pub fn with_pair_updated(
        &self,
        id: CardPairId,
        concept: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<Self, FlashcardsError> {
        let mut next = self.clone();
        let pair = next
            .card_pairs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(FlashcardsError::PairNotFound(id))?;
        pair.concept = concept.into();
        pair.details = details.into();
        Ok(next)
    }

    /// # Errors
    ///
    /// Returns `FlashcardsError::PairNotFound` if no pair has this id.
    pub fn with_pair_removed(&self, id: CardPairId) -> Result<Self, FlashcardsError> {
        let mut next = self.clone();
        let before = next.card_pairs.len();
        next.card_pairs.retain(|p| p.id != id);
        if next.card_pairs.len() == before {
            return Err(FlashcardsError::PairNotFound(id));
        }
        Ok(next)
    }
}
