//! Proximity ranking for search results.

use std::cmp::Ordering;

use crate::domain::{Coordinate, SearchResult};

use super::distance::distance_meters;

/// Rank search results by distance from `observer`.
///
/// Returns an annotated copy; the input is left untouched.
///
/// - Without an observer the catalog order is kept and no distances are
///   assigned.
/// - With an observer, every result whose raw coordinates parse gets a
///   `distance_meters` and results are sorted nearest first. The sort is
///   stable, so equal distances keep their catalog order.
/// - Results with malformed coordinates are left unranked and follow all
///   ranked results, in their original relative order.
pub fn rank_by_distance(
    observer: Option<Coordinate>,
    results: &[SearchResult],
) -> Vec<SearchResult> {
    let Some(observer) = observer else {
        return results.to_vec();
    };

    let mut ranked: Vec<SearchResult> = results
        .iter()
        .cloned()
        .map(|mut result| {
            result.distance_meters = Coordinate::parse(&result.lat, &result.lng)
                .ok()
                .map(|position| distance_meters(observer, position));
            result
        })
        .collect();

    ranked.sort_by(nearest_first);
    ranked
}

fn nearest_first(a: &SearchResult, b: &SearchResult) -> Ordering {
    match (a.distance_meters, b.distance_meters) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
