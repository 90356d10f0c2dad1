//! Random selection without recent repeats

use super::{ContentError, ContentResult};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

/// Recently picked items for one catalog
///
/// Holds at most `max_remember` items, oldest first.
#[derive(Debug, Clone)]
pub struct RotationState<C> {
    recent: VecDeque<C>,
    max_remember: usize,
}

impl<C: Clone + PartialEq> RotationState<C> {
    pub fn new(max_remember: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(max_remember + 1),
            max_remember,
        }
    }

    /// Pick an item from `catalog` that was not picked recently
    ///
    /// Shorthand for [`ContentRotator::pick`] with this state.
    pub fn pick<R: Rng + ?Sized>(&mut self, catalog: &[C], rng: &mut R) -> ContentResult<C> {
        ContentRotator::pick(catalog, self, rng)
    }

    fn remember(&mut self, item: C) {
        if self.max_remember == 0 {
            return;
        }
        self.recent.push_back(item);
        while self.recent.len() > self.max_remember {
            self.recent.pop_front();
        }
    }

    /// Recently picked items, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &C> {
        self.recent.iter()
    }

    pub fn max_remember(&self) -> usize {
        self.max_remember
    }
}

/// Uniform selection from a catalog minus its recent history
pub struct ContentRotator;

impl ContentRotator {
    /// Draw from `catalog - state.recent`, then record the pick
    ///
    /// When every item has been used recently the history is cleared and the
    /// whole catalog is eligible again, so a non-empty catalog always answers.
    pub fn pick<C, R>(catalog: &[C], state: &mut RotationState<C>, rng: &mut R) -> ContentResult<C>
    where
        C: Clone + PartialEq,
        R: Rng + ?Sized,
    {
        if catalog.is_empty() {
            return Err(ContentError::EmptyCatalog("rotation".to_string()));
        }

        let mut available: Vec<&C> = catalog
            .iter()
            .filter(|item| !state.recent.contains(item))
            .collect();

        if available.is_empty() {
            state.recent.clear();
            available = catalog.iter().collect();
        }

        let chosen = available
            .choose(rng)
            .map(|item| (*item).clone())
            .ok_or_else(|| ContentError::EmptyCatalog("rotation".to_string()))?;

        state.remember(chosen.clone());
        Ok(chosen)
    }
}
