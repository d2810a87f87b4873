//! # Calendar Alignment
//!
//! $$
//! \mathcal D = \bigcap_i \mathcal D_i \quad\text{or}\quad
//! x_i(d) = x_i(d'),\ d' = \max\{s \in \mathcal D_i : s \le d\},\ d-d' \le g
//! $$
//!
//! Date intersection and gap-bounded forward fill used when combining assets
//! traded on different calendars.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

/// Default calendar-day tolerance for forward filling.
pub const DEFAULT_MAX_GAP_DAYS: u32 = 3;

/// Policy for aligning several dated series onto one calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentPolicy {
  /// Keep only dates present in every series.
  Intersection,
  /// Union of dates inside the common range, each series forward filled for at
  /// most `max_gap_days` calendar days.
  ForwardFill { max_gap_days: u32 },
}

impl Default for AlignmentPolicy {
  fn default() -> Self {
    Self::Intersection
  }
}

/// Dates shared by every input calendar, ascending.
pub fn intersect_dates(calendars: &[&[NaiveDate]]) -> Vec<NaiveDate> {
  let Some((first, rest)) = calendars.split_first() else {
    return Vec::new();
  };

  let mut common: BTreeSet<NaiveDate> = first.iter().copied().collect();
  for cal in rest {
    let other: BTreeSet<NaiveDate> = cal.iter().copied().collect();
    common = common.intersection(&other).copied().collect();
  }
  common.into_iter().collect()
}

/// Union of all calendars restricted to `[max(first), min(last)]`, ascending.
pub fn bounded_union(calendars: &[&[NaiveDate]]) -> Vec<NaiveDate> {
  let start = calendars.iter().filter_map(|c| c.first()).max().copied();
  let end = calendars.iter().filter_map(|c| c.last()).min().copied();
  let (Some(start), Some(end)) = (start, end) else {
    return Vec::new();
  };
  if calendars.iter().any(|c| c.is_empty()) || start > end {
    return Vec::new();
  }

  let all: BTreeSet<NaiveDate> = calendars
    .iter()
    .flat_map(|c| c.iter().copied())
    .filter(|d| *d >= start && *d <= end)
    .collect();
  all.into_iter().collect()
}

/// Index of the latest source date usable for each target date.
///
/// `dates` must be ascending. A target resolves to `None` when no source date
/// lies within `max_gap_days` calendar days at or before it.
pub fn forward_fill_indices(
  dates: &[NaiveDate],
  targets: &[NaiveDate],
  max_gap_days: u32,
) -> Vec<Option<usize>> {
  let mut out = Vec::with_capacity(targets.len());
  let mut cursor = 0usize;
  let mut last: Option<usize> = None;

  for target in targets {
    while cursor < dates.len() && dates[cursor] <= *target {
      last = Some(cursor);
      cursor += 1;
    }
    let resolved = last.filter(|&i| (*target - dates[i]).num_days() <= i64::from(max_gap_days));
    out.push(resolved);
  }

  out
}

/// Pairs of values observed on shared dates.
pub fn paired_on_intersection(
  a_dates: &[NaiveDate],
  a: &[f64],
  b_dates: &[NaiveDate],
  b: &[f64],
) -> (Vec<f64>, Vec<f64>) {
  let mut xs = Vec::new();
  let mut ys = Vec::new();
  let (mut i, mut j) = (0usize, 0usize);

  while i < a_dates.len() && j < b_dates.len() {
    match a_dates[i].cmp(&b_dates[j]) {
      std::cmp::Ordering::Less => i += 1,
      std::cmp::Ordering::Greater => j += 1,
      std::cmp::Ordering::Equal => {
        xs.push(a[i]);
        ys.push(b[j]);
        i += 1;
        j += 1;
      }
    }
  }

  (xs, ys)
}

/// Pairs of values on the union calendar after gap-bounded forward fill.
pub fn paired_forward_filled(
  a_dates: &[NaiveDate],
  a: &[f64],
  b_dates: &[NaiveDate],
  b: &[f64],
  max_gap_days: u32,
) -> (Vec<f64>, Vec<f64>) {
  let union: Vec<NaiveDate> = a_dates
    .iter()
    .chain(b_dates.iter())
    .copied()
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();

  let ia = forward_fill_indices(a_dates, &union, max_gap_days);
  let ib = forward_fill_indices(b_dates, &union, max_gap_days);

  ia.into_iter()
    .zip(ib)
    .filter_map(|(x, y)| Some((a[x?], b[y?])))
    .unzip()
}
