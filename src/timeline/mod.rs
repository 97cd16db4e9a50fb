// Lap timeline reconciliation.
//
// The upstream paginates lap timings by row, not by lap boundary, so a
// single lap's rows may straddle two pages. Reconciliation unions the rows
// per lap number, dedupes by driver within a lap, and hands consumers one
// gap-free, lap-ordered timeline.

pub(crate) mod cache;

use std::collections::btree_map::{BTreeMap, Entry};

use futures::future::try_join_all;
use log::{debug, warn};

use crate::api::RaceDataSource;
use crate::errors::ChicaneError;
use crate::model::{Lap, Timeline};

pub use cache::{RaceData, RaceDataCache};

/// Fixed page size of the upstream lap endpoint.
pub const PAGE_SIZE: usize = 100;

/// Reconstruct the full lap timeline for one round.
///
/// The first page reports the total row count; every remaining page is
/// fetched concurrently and the merge runs only after all of them have
/// resolved, so arrival order never shows in the output. Any failed page
/// fails the whole reconciliation as [`ChicaneError::DataUnavailable`] —
/// a partial timeline is worse than none.
///
/// A race with no published laps yields an empty timeline, which is a
/// valid "data not yet available" state rather than an error.
pub async fn fetch_timeline(
    source: &dyn RaceDataSource,
    round: u32,
) -> Result<Timeline, ChicaneError> {
    let first = source
        .lap_page(round, PAGE_SIZE, 0)
        .await
        .map_err(|e| ChicaneError::unavailable(round, e))?;
    let total = first.total;

    let mut pages = vec![first.laps];
    if total > PAGE_SIZE {
        let requests = (PAGE_SIZE..total)
            .step_by(PAGE_SIZE)
            .map(|offset| source.lap_page(round, PAGE_SIZE, offset));
        let remaining = try_join_all(requests)
            .await
            .map_err(|e| ChicaneError::unavailable(round, e))?;
        pages.extend(remaining.into_iter().map(|page| page.laps));
    }

    let timeline = merge_pages(pages);
    debug!(
        "reconciled round {}: {} timing rows across {} laps",
        round,
        timeline.iter().map(|lap| lap.timings.len()).sum::<usize>(),
        timeline.len()
    );
    if let Some(last) = timeline.last() {
        if timeline.len() as u32 != last.number {
            warn!(
                "timeline for round {} has gaps: {} laps observed, last lap number {}",
                round,
                timeline.len(),
                last.number
            );
        }
    }
    Ok(timeline)
}

/// Merge row-sliced pages into one lap-ordered timeline.
///
/// Pages are consumed in offset order (the caller joins them before
/// calling), a lap already seen has only its missing drivers appended in
/// source order, and the result is sorted ascending by lap number. The
/// merge is deterministic for any fetch completion order.
pub fn merge_pages<I>(pages: I) -> Timeline
where
    I: IntoIterator<Item = Vec<Lap>>,
{
    let mut merged: BTreeMap<u32, Lap> = BTreeMap::new();
    for lap in pages.into_iter().flatten() {
        match merged.entry(lap.number) {
            Entry::Vacant(vacant) => {
                vacant.insert(lap);
            }
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                for timing in lap.timings {
                    if !existing
                        .timings
                        .iter()
                        .any(|t| t.driver_id == timing.driver_id)
                    {
                        existing.timings.push(timing);
                    }
                }
            }
        }
    }
    merged.into_values().collect()
}
