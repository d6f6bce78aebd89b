//! Ordered, editable list of steps.
//!
//! Every mutation renumbers `order` so that a list of N steps always carries
//! exactly the values `0..N`, in list position order.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::trace;

use super::models::{Step, StepKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepListError {
    #[error("step index {index} is out of range for a list of {len} steps")]
    OutOfRange { index: usize, len: usize },
}

/// An in-memory step list that keeps `order` dense and zero-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepList {
    steps: Vec<Step>,
}

impl StepList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from steps in any order; they are sorted by their
    /// current `order` (stable) and renumbered.
    pub fn from_steps(mut steps: Vec<Step>) -> Self {
        steps.sort_by_key(|s| s.order);
        let mut list = Self { steps };
        list.reindex();
        list
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Owned copy of the current steps, suitable for handing to a run.
    pub fn snapshot(&self) -> Vec<Step> {
        self.steps.clone()
    }

    /// Append a new default step of `kind` and return its index.
    pub fn push(&mut self, kind: StepKind) -> usize {
        self.steps.push(Step::new(kind));
        self.reindex();
        self.steps.len() - 1
    }

    /// Insert `step` at `index` (`index == len` appends).
    pub fn insert(&mut self, index: usize, step: Step) -> Result<(), StepListError> {
        if index > self.steps.len() {
            return Err(self.out_of_range(index));
        }
        self.steps.insert(index, step);
        self.reindex();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Step, StepListError> {
        if index >= self.steps.len() {
            return Err(self.out_of_range(index));
        }
        let removed = self.steps.remove(index);
        self.reindex();
        Ok(removed)
    }

    /// Remove every step at the given positions. Duplicate indices are
    /// tolerated; any out-of-range index aborts without touching the list.
    pub fn remove_many(&mut self, indices: &[usize]) -> Result<Vec<Step>, StepListError> {
        let set = self.checked_set(indices)?;
        let mut removed = Vec::with_capacity(set.len());
        for &index in set.iter().rev() {
            removed.push(self.steps.remove(index));
        }
        removed.reverse();
        self.reindex();
        Ok(removed)
    }

    /// Move the steps at `indices` so they land in front of the step that was
    /// at offset `to` before the move (`to == len` moves them to the end).
    /// The moved steps keep their relative order.
    pub fn move_items(&mut self, indices: &[usize], to: usize) -> Result<(), StepListError> {
        if to > self.steps.len() {
            return Err(self.out_of_range(to));
        }
        let set = self.checked_set(indices)?;
        let shift = set.iter().filter(|&&i| i < to).count();

        let mut moved = Vec::with_capacity(set.len());
        let mut rest = Vec::with_capacity(self.steps.len() - set.len());
        for (i, step) in self.steps.drain(..).enumerate() {
            if set.contains(&i) {
                moved.push(step);
            } else {
                rest.push(step);
            }
        }

        let at = to - shift;
        rest.splice(at..at, moved);
        self.steps = rest;
        self.reindex();
        Ok(())
    }

    /// Insert a copy of the step at `index` right after it; returns the
    /// index of the copy.
    pub fn duplicate(&mut self, index: usize) -> Result<usize, StepListError> {
        let copy = self
            .steps
            .get(index)
            .cloned()
            .ok_or_else(|| self.out_of_range(index))?;
        self.steps.insert(index + 1, copy);
        self.reindex();
        Ok(index + 1)
    }

    /// Insert copies of `copied` (in their own `order`) behind the highest
    /// selected index, or at the front when nothing is selected.
    /// Returns the index of the first pasted step.
    pub fn paste_behind(
        &mut self,
        copied: &[Step],
        selection: &[usize],
    ) -> Result<usize, StepListError> {
        let set = self.checked_set(selection)?;
        let at = set.last().map_or(0, |last| last + 1);

        let mut pasted = copied.to_vec();
        pasted.sort_by_key(|s| s.order);
        self.steps.splice(at..at, pasted);
        self.reindex();
        Ok(at)
    }

    /// Renumber `order` to match list positions.
    fn reindex(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.order = i;
        }
        trace!(target: "automotion::config", len = self.steps.len(), "Step list reindexed");
    }

    fn checked_set(&self, indices: &[usize]) -> Result<BTreeSet<usize>, StepListError> {
        let set: BTreeSet<usize> = indices.iter().copied().collect();
        match set.last() {
            Some(&max) if max >= self.steps.len() => Err(self.out_of_range(max)),
            _ => Ok(set),
        }
    }

    fn out_of_range(&self, index: usize) -> StepListError {
        StepListError::OutOfRange {
            index,
            len: self.steps.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders(list: &StepList) -> Vec<usize> {
        list.steps().iter().map(|s| s.order).collect()
    }

    fn xs(list: &StepList) -> Vec<f64> {
        list.steps().iter().map(|s| s.target.x).collect()
    }

    fn list_of(n: usize) -> StepList {
        let steps = (0..n)
            .map(|i| Step::new(StepKind::Move).with_target(i as f64, 0.0))
            .collect();
        StepList::from_steps(steps)
    }

    fn assert_dense(list: &StepList) {
        let expected: Vec<usize> = (0..list.len()).collect();
        assert_eq!(orders(list), expected);
    }

    #[test]
    fn from_steps_sorts_and_renumbers() {
        let steps = vec![
            Step::new(StepKind::Move).with_target(2.0, 0.0).with_order(7),
            Step::new(StepKind::Move).with_target(0.0, 0.0).with_order(1),
            Step::new(StepKind::Move).with_target(1.0, 0.0).with_order(4),
        ];
        let list = StepList::from_steps(steps);
        assert_eq!(xs(&list), vec![0.0, 1.0, 2.0]);
        assert_dense(&list);
    }

    #[test]
    fn push_insert_remove_keep_order_dense() {
        let mut list = StepList::new();
        list.push(StepKind::Move);
        list.push(StepKind::PrimaryClick);
        list.insert(0, Step::new(StepKind::DragStart)).unwrap();
        assert_dense(&list);
        assert_eq!(list.get(0).unwrap().kind, StepKind::DragStart);

        let removed = list.remove(1).unwrap();
        assert_eq!(removed.kind, StepKind::Move);
        assert_dense(&list);

        assert_eq!(
            list.remove(5),
            Err(StepListError::OutOfRange { index: 5, len: 2 })
        );
        assert!(list.insert(3, Step::new(StepKind::Move)).is_err());
    }

    #[test]
    fn remove_many_handles_duplicates_and_bounds() {
        let mut list = list_of(5);
        let removed = list.remove_many(&[3, 1, 3]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(xs(&list), vec![0.0, 2.0, 4.0]);
        assert_dense(&list);

        assert!(list.remove_many(&[0, 9]).is_err());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn move_items_down_and_up() {
        let mut list = list_of(5);
        // Move [0, 1] in front of the original index 4.
        list.move_items(&[0, 1], 4).unwrap();
        assert_eq!(xs(&list), vec![2.0, 3.0, 0.0, 1.0, 4.0]);
        assert_dense(&list);

        let mut list = list_of(5);
        list.move_items(&[3], 0).unwrap();
        assert_eq!(xs(&list), vec![3.0, 0.0, 1.0, 2.0, 4.0]);

        let mut list = list_of(3);
        list.move_items(&[0], 3).unwrap();
        assert_eq!(xs(&list), vec![1.0, 2.0, 0.0]);
        assert_dense(&list);
    }

    #[test]
    fn duplicate_inserts_after_source() {
        let mut list = list_of(3);
        let at = list.duplicate(1).unwrap();
        assert_eq!(at, 2);
        assert_eq!(xs(&list), vec![0.0, 1.0, 1.0, 2.0]);
        assert_dense(&list);
        assert!(list.duplicate(10).is_err());
    }

    #[test]
    fn paste_behind_last_selected() {
        let mut list = list_of(4);
        let copied = vec![
            Step::new(StepKind::SecondaryClick).with_target(20.0, 0.0).with_order(2),
            Step::new(StepKind::PrimaryClick).with_target(10.0, 0.0).with_order(0),
        ];
        let at = list.paste_behind(&copied, &[0, 2]).unwrap();
        assert_eq!(at, 3);
        assert_eq!(xs(&list), vec![0.0, 1.0, 2.0, 10.0, 20.0, 3.0]);
        assert_dense(&list);

        let at = list.paste_behind(&copied, &[]).unwrap();
        assert_eq!(at, 0);
        assert_eq!(list.len(), 8);
        assert_dense(&list);
    }

    #[test]
    fn order_stays_dense_across_mixed_edits() {
        let mut list = list_of(6);
        list.remove(2).unwrap();
        list.move_items(&[4, 0], 2).unwrap();
        list.duplicate(0).unwrap();
        list.insert(list.len(), Step::new(StepKind::DragEnd)).unwrap();
        list.remove_many(&[1, 5]).unwrap();
        list.paste_behind(&list.snapshot()[..2], &[1]).unwrap();
        list.push(StepKind::Move);
        assert_dense(&list);
    }
}
