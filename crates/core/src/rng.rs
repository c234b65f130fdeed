//! RNG module - piece selection
//!
//! The game loop draws kinds through the [`PieceSource`] trait so the selection
//! policy can be swapped per session. The default is the "7-bag": each bag holds
//! one of each piece (I, O, T, S, Z, J, L), shuffled, and every kind appears
//! once per seven draws. [`FixedSequence`] replays a given list for tests.
//!
//! Also provides a simple LCG for deterministic seeding.

use std::fmt;

use crate::types::PieceKind;

/// Source of upcoming piece kinds
pub trait PieceSource: fmt::Debug {
    /// Remove and return the next kind
    fn draw(&mut self) -> PieceKind;

    /// The kind the next [`draw`](PieceSource::draw) will return, without consuming it
    fn peek(&self) -> PieceKind;
}

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct BagRandomizer {
    /// Current bag of pieces
    bag: [PieceKind; 7],
    /// Index into current bag
    bag_index: usize,
    /// RNG for shuffling
    rng: SimpleRng,
}

impl BagRandomizer {
    /// Create a new bag randomizer with the given seed
    pub fn new(seed: u32) -> Self {
        let mut rng = SimpleRng::new(seed);
        let bag = Self::shuffled_bag(&mut rng);
        Self {
            bag,
            bag_index: 0,
            rng,
        }
    }

    fn shuffled_bag(rng: &mut SimpleRng) -> [PieceKind; 7] {
        let mut bag = PieceKind::ALL;
        rng.shuffle(&mut bag);
        bag
    }

    /// Kinds left in the current bag
    pub fn remaining(&self) -> &[PieceKind] {
        &self.bag[self.bag_index..]
    }
}

impl PieceSource for BagRandomizer {
    fn draw(&mut self) -> PieceKind {
        if self.bag_index >= self.bag.len() {
            self.bag = Self::shuffled_bag(&mut self.rng);
            self.bag_index = 0;
        }

        let piece = self.bag[self.bag_index];
        self.bag_index += 1;
        piece
    }

    fn peek(&self) -> PieceKind {
        if let Some(&kind) = self.bag.get(self.bag_index) {
            return kind;
        }

        // Preview the next bag on a copy of the RNG; `draw` will shuffle
        // identically from the same state.
        let mut preview_rng = self.rng.clone();
        Self::shuffled_bag(&mut preview_rng)[0]
    }
}

impl Default for BagRandomizer {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Cycles through a fixed list of kinds
#[derive(Debug, Clone)]
pub struct FixedSequence {
    kinds: Vec<PieceKind>,
    next: usize,
}

impl FixedSequence {
    /// # Panics
    ///
    /// Panics if `kinds` is empty.
    pub fn new(kinds: impl Into<Vec<PieceKind>>) -> Self {
        let kinds = kinds.into();
        assert!(!kinds.is_empty(), "FixedSequence needs at least one kind");
        Self { kinds, next: 0 }
    }

    /// Always the same kind
    pub fn repeat(kind: PieceKind) -> Self {
        Self::new(vec![kind])
    }
}

impl PieceSource for FixedSequence {
    fn draw(&mut self) -> PieceKind {
        let kind = self.kinds[self.next];
        self.next = (self.next + 1) % self.kinds.len();
        kind
    }

    fn peek(&self) -> PieceKind {
        self.kinds[self.next]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_zero_seed_is_usable() {
        let mut rng = SimpleRng::new(0);
        assert_eq!(rng.state(), 1);
        assert_ne!(rng.next_u32(), rng.next_u32());
    }

    #[test]
    fn test_bag_draws_all_seven() {
        let mut bag = BagRandomizer::new(1);

        for _ in 0..3 {
            let mut drawn: Vec<PieceKind> = (0..7).map(|_| bag.draw()).collect();
            drawn.sort_by_key(|k| k.index());
            assert_eq!(drawn, PieceKind::ALL.to_vec());
        }
    }

    #[test]
    fn test_bag_peek_matches_draw_across_refill() {
        let mut bag = BagRandomizer::new(99);

        for _ in 0..30 {
            let peeked = bag.peek();
            assert_eq!(peeked, bag.draw());
        }
    }

    #[test]
    fn test_bag_same_seed_same_sequence() {
        let mut a = BagRandomizer::new(7);
        let mut b = BagRandomizer::new(7);
        for _ in 0..21 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn test_bag_remaining_shrinks() {
        let mut bag = BagRandomizer::new(3);
        assert_eq!(bag.remaining().len(), 7);
        bag.draw();
        assert_eq!(bag.remaining().len(), 6);
    }

    #[test]
    fn test_fixed_sequence_cycles() {
        let mut seq = FixedSequence::new(vec![PieceKind::O, PieceKind::I]);
        assert_eq!(seq.peek(), PieceKind::O);
        assert_eq!(seq.draw(), PieceKind::O);
        assert_eq!(seq.draw(), PieceKind::I);
        assert_eq!(seq.draw(), PieceKind::O);
    }

    #[test]
    #[should_panic(expected = "at least one kind")]
    fn test_fixed_sequence_rejects_empty() {
        let _ = FixedSequence::new(Vec::<PieceKind>::new());
    }
}
