// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure monitoring-set computation.
//!
//! Turns the full set of stored messages into the deduplicated list of
//! regions to monitor plus the two nearest future instants at which the set
//! must be recomputed (next activation and next expiry). Deterministic and
//! side-effect-free so it can be tested in isolation from the monitor.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use geomon_core::types::{Geo, Message, MonitoringPlan, Region};

/// Compute the monitoring plan for the given stored messages.
///
/// - Every attachment with a non-empty area list contributes to the expiry
///   fold, regardless of campaign lifecycle state, so a cleanup pass is
///   scheduled even for just-expired attachments.
/// - Attachments of finished campaigns contribute nothing else.
/// - Eligible, unexpired attachments contribute their valid areas,
///   deduplicated by area id: the entry with the later expiry wins, a
///   never-expires entry beats any instant, and the first-seen entry wins an
///   exact tie.
pub fn compute_plan(
    messages: &[Message],
    finished: &HashSet<String>,
    now: DateTime<Utc>,
) -> MonitoringPlan {
    let mut next_refresh: Option<DateTime<Utc>> = None;
    let mut next_expiry: Option<DateTime<Utc>> = None;

    // First-seen order of area ids, so the region list is deterministic.
    let mut order: Vec<String> = Vec::new();
    let mut chosen: HashMap<String, (Option<DateTime<Utc>>, Region)> = HashMap::new();

    for message in messages {
        let Some(geo) = &message.geo else { continue };
        if geo.areas.is_empty() {
            continue;
        }

        next_expiry = fold_expiry(geo.expiry, next_expiry, now);

        if finished.contains(&geo.campaign_id) {
            continue;
        }

        if geo.is_eligible(finished, now) && !geo.is_expired(now) {
            for area in geo.areas.iter().filter(|a| a.is_valid()) {
                let existing = chosen.get(&area.id).map(|(expiry, _)| *expiry);
                match existing {
                    Some(existing) if !beats(geo.expiry, existing) => {}
                    Some(_) => {
                        chosen.insert(area.id.clone(), (geo.expiry, area.to_region(geo.expiry)));
                    }
                    None => {
                        order.push(area.id.clone());
                        chosen.insert(area.id.clone(), (geo.expiry, area.to_region(geo.expiry)));
                    }
                }
            }
        }

        next_refresh = fold_start(geo, next_refresh, now);
    }

    MonitoringPlan {
        regions: order
            .into_iter()
            .filter_map(|id| chosen.remove(&id))
            .map(|(_, region)| region)
            .collect(),
        next_refresh,
        next_expiry,
    }
}

/// Whether a candidate expiry replaces the currently chosen one for an area
/// id. `None` means never-expires and cannot be beaten; an exact tie keeps
/// the first-seen entry.
fn beats(candidate: Option<DateTime<Utc>>, existing: Option<DateTime<Utc>>) -> bool {
    match (candidate, existing) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(c), Some(e)) => c > e,
    }
}

/// Fold one attachment's expiry date into the next-expiry accumulator:
/// earliest expiry still >= now wins, clamped to now when the expiry has
/// already passed and no better candidate exists.
fn fold_expiry(
    expiry: Option<DateTime<Utc>>,
    acc: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let Some(expiry) = expiry else { return acc };

    if let Some(acc) = acc {
        if acc < expiry {
            return Some(if acc < now { now } else { acc });
        }
    }

    if expiry < now {
        return Some(now);
    }
    Some(expiry)
}

/// Fold one attachment's start date into the next-activation accumulator:
/// earliest future start date, skipping attachments that are already expired
/// or already active.
fn fold_start(
    geo: &Geo,
    acc: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if geo.expiry.is_some_and(|expiry| expiry < now) {
        return acc;
    }
    let Some(start) = geo.start else { return acc };
    if start < now {
        return acc;
    }
    if acc.is_some_and(|acc| acc < start) {
        return acc;
    }
    Some(start)
}
