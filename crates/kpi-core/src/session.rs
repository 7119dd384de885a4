//! Per-session ownership of the loaded datasets.
//!
//! A session holds at most one [`Dataset`] per [`Partition`]. Loading is the
//! caller's job (it needs a store and is async); the session only remembers
//! what was loaded and threads each dataset through its mutations.
//!
//! A partition whose stored copy could not be read is held empty and marked
//! unreadable until it is installed again or saved on purpose, so callers can
//! keep warning about it and avoid overwriting the stored rows.

use std::collections::BTreeMap;

use crate::{
  record::{IndicatorPatch, IndicatorRecord},
  store::{Partition, PartitionScheme},
  table::{Change, Dataset, DuplicatePolicy, Mutation, TableError},
};

#[derive(Debug, Default)]
pub struct Session {
  datasets:   BTreeMap<Partition, Dataset>,
  /// Why the stored copy of a partition could not be read.
  unreadable: BTreeMap<Partition, String>,
  scheme:     PartitionScheme,
  policy:     DuplicatePolicy,
}

impl Session {
  pub fn new(scheme: PartitionScheme, policy: DuplicatePolicy) -> Self {
    Self {
      datasets: BTreeMap::new(),
      unreadable: BTreeMap::new(),
      scheme,
      policy,
    }
  }

  pub fn scheme(&self) -> PartitionScheme { self.scheme }

  pub fn policy(&self) -> DuplicatePolicy { self.policy }

  pub fn is_loaded(&self, partition: Partition) -> bool {
    self.datasets.contains_key(&partition)
  }

  pub fn dataset(&self, partition: Partition) -> Option<&Dataset> {
    self.datasets.get(&partition)
  }

  /// Install `dataset` as the current version of `partition`, replacing
  /// whatever was there. The session's duplicate policy is applied.
  pub fn install(&mut self, partition: Partition, dataset: Dataset) -> &Dataset {
    self.unreadable.remove(&partition);
    let dataset = dataset.with_policy(self.policy);
    self.datasets.insert(partition, dataset);
    &self.datasets[&partition]
  }

  /// Hold `partition` empty because its stored copy could not be read.
  pub fn install_unreadable(&mut self, partition: Partition, reason: impl Into<String>) {
    self.datasets.insert(partition, Dataset::new(self.policy));
    self.unreadable.insert(partition, reason.into());
  }

  /// The load failure recorded for `partition`, if it is still unresolved.
  pub fn load_failure(&self, partition: Partition) -> Option<&str> {
    self.unreadable.get(&partition).map(String::as_str)
  }

  /// The in-memory copy of `partition` is now what the store holds.
  pub fn mark_saved(&mut self, partition: Partition) { self.unreadable.remove(&partition); }

  /// Partitions currently held in memory.
  pub fn loaded(&self) -> Vec<Partition> { self.datasets.keys().copied().collect() }

  /// Run `op` against the dataset of `partition` (empty if never loaded) and
  /// keep the version it returns.
  pub fn mutate(
    &mut self,
    partition: Partition,
    op: impl FnOnce(Dataset) -> Mutation,
  ) -> Result<Change, TableError> {
    let current = self
      .datasets
      .remove(&partition)
      .unwrap_or_else(|| Dataset::new(self.policy));
    let Mutation { dataset, outcome } = op(current);
    self.datasets.insert(partition, dataset);
    outcome
  }

  pub fn add(&mut self, partition: Partition, record: IndicatorRecord) -> Result<Change, TableError> {
    self.mutate(partition, |ds| ds.add(record))
  }

  pub fn update(
    &mut self,
    partition: Partition,
    key: &str,
    patch: IndicatorPatch,
  ) -> Result<Change, TableError> {
    self.mutate(partition, |ds| ds.update(key, patch))
  }

  pub fn delete(&mut self, partition: Partition, key: &str) -> Result<Change, TableError> {
    self.mutate(partition, |ds| ds.delete(key))
  }

  pub fn clear(&mut self, partition: Partition) -> Result<Change, TableError> {
    self.mutate(partition, Dataset::clear)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::RawRow;

  #[test]
  fn mutations_on_unloaded_partition_start_empty() {
    let mut session = Session::new(PartitionScheme::Yearly, DuplicatePolicy::Allow);
    assert!(!session.is_loaded(Partition::Year(2024)));
    session
      .add(Partition::Year(2024), IndicatorRecord::named("Revenue"))
      .unwrap();
    assert_eq!(session.dataset(Partition::Year(2024)).unwrap().len(), 1);
    assert!(session.dataset(Partition::Year(2023)).is_none());
  }

  #[test]
  fn partitions_are_independent() {
    let mut session = Session::new(PartitionScheme::Yearly, DuplicatePolicy::Reject);
    session.add(Partition::Year(2023), IndicatorRecord::named("Revenue")).unwrap();
    session.add(Partition::Year(2024), IndicatorRecord::named("Revenue")).unwrap();
    assert_eq!(
      session.add(Partition::Year(2024), IndicatorRecord::named("Revenue")),
      Err(TableError::DuplicateName("Revenue".into()))
    );
    assert_eq!(
      session.delete(Partition::Year(2023), "Revenue"),
      Ok(Change::Deleted { removed: 1 })
    );
    assert_eq!(session.dataset(Partition::Year(2024)).unwrap().len(), 1);
    assert_eq!(session.loaded(), vec![Partition::Year(2023), Partition::Year(2024)]);
  }

  #[test]
  fn install_applies_session_policy() {
    let mut session = Session::new(PartitionScheme::Single, DuplicatePolicy::Reject);
    let loaded = Dataset::load(vec![RawRow { name: Some("Revenue".into()), ..RawRow::default() }]);
    session.install(Partition::All, loaded);
    assert_eq!(
      session.add(Partition::All, IndicatorRecord::named("Revenue")),
      Err(TableError::DuplicateName("Revenue".into()))
    );
  }

  #[test]
  fn unreadable_partition_stays_flagged_until_installed_or_saved() {
    let mut session = Session::default();
    session.install_unreadable(Partition::All, "share is offline");
    assert!(session.is_loaded(Partition::All));
    session.add(Partition::All, IndicatorRecord::named("Revenue")).unwrap();
    assert_eq!(session.load_failure(Partition::All), Some("share is offline"));

    session.install(Partition::All, Dataset::default());
    assert_eq!(session.load_failure(Partition::All), None);

    session.install_unreadable(Partition::All, "share is offline");
    session.mark_saved(Partition::All);
    assert_eq!(session.load_failure(Partition::All), None);
  }

  #[test]
  fn not_found_keeps_dataset() {
    let mut session = Session::default();
    session.add(Partition::All, IndicatorRecord::named("Revenue")).unwrap();
    assert_eq!(
      session.update(Partition::All, "Ghost", IndicatorPatch::default()),
      Err(TableError::NotFound("Ghost".into()))
    );
    assert_eq!(session.clear(Partition::All), Ok(Change::Cleared { removed: 1 }));
    assert!(session.dataset(Partition::All).unwrap().is_empty());
  }
}
