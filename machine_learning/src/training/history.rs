use std::collections::{VecDeque, vec_deque};

/// The most recent window losses, oldest first.
#[derive(Debug, Clone)]
pub struct LossHistory {
    losses: VecDeque<f32>,
    capacity: usize,
}

impl LossHistory {
    /// Creates a new `LossHistory` keeping at most `capacity` losses.
    pub fn new(capacity: usize) -> Self {
        Self {
            losses: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `loss`, dropping the oldest one if the history is full.
    pub fn push(&mut self, loss: f32) {
        if self.capacity == 0 {
            return;
        }

        if self.losses.len() == self.capacity {
            self.losses.pop_front();
        }

        self.losses.push_back(loss);
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, f32> {
        self.losses.iter()
    }

    pub fn len(&self) -> usize {
        self.losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    pub fn last(&self) -> Option<f32> {
        self.losses.back().copied()
    }

    /// Returns the lowest and highest losses kept.
    pub fn bounds(&self) -> Option<(f32, f32)> {
        let first = *self.losses.front()?;
        Some(
            self.losses
                .iter()
                .fold((first, first), |(lo, hi), &l| (lo.min(l), hi.max(l))),
        )
    }
}
