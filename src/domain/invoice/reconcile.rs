use std::collections::HashMap;
use uuid::Uuid;

/// Ids whose multiplicity differs between `current` and `requested`.
///
/// Both inputs are treated as multisets; every id whose count in `current`
/// minus its count in `requested` is nonzero is returned once. The order of the
/// result is unspecified.
pub fn items_to_delete(current: &[Uuid], requested: &[Uuid]) -> Vec<Uuid> {
  let mut counts: HashMap<Uuid, i64> = HashMap::with_capacity(current.len());

  for id in current {
    *counts.entry(*id).or_insert(0) += 1;
  }
  for id in requested {
    *counts.entry(*id).or_insert(0) -= 1;
  }

  counts
    .into_iter()
    .filter(|(_, count)| *count != 0)
    .map(|(id, _)| id)
    .collect()
}
