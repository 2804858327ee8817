use tracing::debug;

use crate::limits::{MAX_COMBINED_TABLES, MIN_COMBINED_TABLES};
use crate::model::*;

use super::conflict::blocks;

// ── Table Allocation Search ──────────────────────────────────────

/// Find the table, or the tightest combination of tables, that seats the
/// request's party for its whole span.
///
/// 1. Drop every table held by another reservation on the same date whose
///    span blocks the requested one (`request.excluding` is skipped).
/// 2. Exact single-table fit wins outright; otherwise the single table with
///    the least leftover seats.
/// 3. Otherwise combinations of 2, 3, then 4 tables: first exact fit in that
///    order, else the least leftover across all three sizes.
///
/// `None` means no availability. The party size and span are trusted as given.
pub fn find_tables(
    tables: &[Table],
    reservations: &[Reservation],
    request: &AllocationRequest,
) -> Option<Allocation> {
    let free = available_tables(tables, reservations, request);
    if free.is_empty() {
        debug!(date = %request.date, "no free tables");
        return None;
    }

    if let Some(table) = select_single_table(&free, request.party_size) {
        return Some(Allocation::Single(table));
    }

    combine_tables(&free, request.party_size).map(Allocation::Combined)
}

/// Tables with no blocking reservation on the request's date, in input order.
pub fn available_tables(
    tables: &[Table],
    reservations: &[Reservation],
    request: &AllocationRequest,
) -> Vec<Table> {
    let conflicting: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.date == request.date)
        .filter(|r| request.excluding != Some(r.id))
        .filter(|r| blocks(&r.span, &request.span))
        .collect();

    tables
        .iter()
        .filter(|t| !conflicting.iter().any(|r| r.holds_table(&t.id)))
        .copied()
        .collect()
}

/// Exact fit returns immediately; otherwise the first table with the fewest
/// seats left over. `None` if every table is too small.
pub fn select_single_table(tables: &[Table], party_size: u32) -> Option<Table> {
    let mut best: Option<(u32, Table)> = None;
    for &table in tables {
        if table.capacity == party_size {
            return Some(table);
        }
        if table.capacity > party_size {
            let leftover = table.capacity - party_size;
            if best.is_none_or(|(least, _)| leftover < least) {
                best = Some((leftover, table));
            }
        }
    }
    best.map(|(_, table)| table)
}

/// Search combinations of `MIN_COMBINED_TABLES..=MAX_COMBINED_TABLES` tables.
///
/// The first exact fit in enumeration order short-circuits, so a 2-table
/// exact fit beats any 3- or 4-table one. Without an exact fit the least
/// leftover across every size wins; ties go to the earlier combination.
pub fn combine_tables(tables: &[Table], party_size: u32) -> Option<Vec<Table>> {
    let mut best: Option<(u32, Vec<usize>)> = None;

    for k in MIN_COMBINED_TABLES..=MAX_COMBINED_TABLES {
        for combo in Combinations::new(tables.len(), k) {
            let combined: u32 = combo.iter().map(|&i| tables[i].capacity).sum();
            if combined == party_size {
                return Some(pick(tables, &combo));
            }
            if combined > party_size {
                let leftover = combined - party_size;
                if best.as_ref().is_none_or(|(least, _)| leftover < *least) {
                    best = Some((leftover, combo));
                }
            }
        }
    }

    best.map(|(_, combo)| pick(tables, &combo))
}

fn pick(tables: &[Table], indices: &[usize]) -> Vec<Table> {
    indices.iter().map(|&i| tables[i]).collect()
}

/// Lexicographic k-combinations of `0..n`: `[0,1]`, `[0,2]`, …, `[n-2,n-1]`.
pub(crate) struct Combinations {
    indices: Vec<usize>,
    n: usize,
    done: bool,
}

impl Combinations {
    pub(crate) fn new(n: usize, k: usize) -> Self {
        Self {
            indices: (0..k).collect(),
            n,
            done: k == 0 || k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        // Advance: rightmost index that can still move right.
        let k = self.indices.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(current)
    }
}
