//! Incremental reconciliation of a fresh batch into the displayed collection.
//!
//! Identity is the record timestamp. Removal, matching, and dedup are all
//! keyed on it; full-record equality is never used, because output values
//! are recomputed on every ingest cycle and would defeat identity matching.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use pt_core::Record;

/// Merge `incoming` into `current` in three passes:
///
/// 1. Remove every record whose timestamp no longer occurs in `incoming`.
/// 2. Upsert each incoming record in order: overwrite the values of the
///    entry with the same timestamp, or append when there is none.
/// 3. Sort ascending by timestamp.
///
/// Afterwards `current` holds exactly one record per distinct timestamp in
/// `incoming`, in ascending order. An empty `incoming` empties the
/// collection; an empty `current` becomes the sorted `incoming`.
pub fn reconcile(current: &mut Vec<Record>, incoming: &[Record]) {
    let live: HashSet<NaiveDateTime> = incoming.iter().map(|rec| rec.timestamp).collect();
    current.retain(|rec| live.contains(&rec.timestamp));

    for inc in incoming {
        match current.iter_mut().find(|rec| rec.same_identity(inc)) {
            Some(existing) => {
                existing.input_value = inc.input_value;
                existing.set_point = inc.set_point;
                existing.output_value = inc.output_value;
            }
            None => current.push(inc.clone()),
        }
    }

    current.sort_by_key(|rec| rec.timestamp);
}
