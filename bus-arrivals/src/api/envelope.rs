//! Envelope unwrapping for catalog and arrival payloads.
//!
//! The same logical item list shows up at different depths depending on
//! which provider mode answered. Extraction walks a fixed, ordered list of
//! paths and takes the first one that is present. A payload that matches
//! none of them but is not empty is logged as an unrecognized shape.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{ArrivalRecord, SearchResult, Station};

use super::error::ApiError;
use super::types::{ArrivalItem, MsgHeader, StationItem};

/// A JSON path, one object key per step.
pub type EnvelopePath = &'static [&'static str];

/// Where catalog search results may live, in priority order.
pub const SEARCH_ITEM_PATHS: &[EnvelopePath] = &[
    &["msgBody", "itemList"],
    &["ServiceResult", "msgBody", "itemList"],
    &["response", "msgBody", "itemList"],
];

/// Where arrival items may live, in priority order.
pub const ARRIVAL_ITEM_PATHS: &[EnvelopePath] = &[
    &["msgBody", "itemList"],
    &["response", "msgBody", "itemList"],
];

/// Where the provider header may live, in priority order.
pub const HEADER_PATHS: &[EnvelopePath] = &[
    &["msgHeader"],
    &["ServiceResult", "msgHeader"],
    &["response", "msgHeader"],
];

fn lookup<'a>(root: &'a Value, path: EnvelopePath) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, key| node.get(*key))
        .filter(|v| !v.is_null())
}

/// First present value along `paths`.
pub fn find_first<'a>(root: &'a Value, paths: &[EnvelopePath]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(root, path))
}

/// Extract the item list, normalizing a single object to a one-element list.
///
/// Returns an empty list when no path matches.
pub fn extract_items(root: &Value, paths: &[EnvelopePath]) -> Vec<Value> {
    match find_first(root, paths) {
        Some(Value::Array(items)) => items.clone(),
        Some(item) => vec![item.clone()],
        None => {
            if let Value::Object(map) = root
                && !map.is_empty()
                && find_first(root, HEADER_PATHS).is_none()
            {
                warn!(
                    keys = ?map.keys().collect::<Vec<_>>(),
                    "unrecognized envelope shape, treating as empty"
                );
            }
            Vec::new()
        }
    }
}

/// The provider header, if the envelope carries one.
pub fn header(root: &Value) -> Option<MsgHeader> {
    find_first(root, HEADER_PATHS).and_then(|h| serde_json::from_value(h.clone()).ok())
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(error = %e, "skipping undecodable item");
                None
            }
        })
        .collect()
}

/// Search results carried by a catalog envelope.
///
/// Items without a usable ARS id are skipped.
pub fn search_results(root: &Value) -> Vec<SearchResult> {
    decode_items::<StationItem>(extract_items(root, SEARCH_ITEM_PATHS))
        .into_iter()
        .filter_map(|item| {
            let name = item.st_nm.clone();
            let converted = item.into_search_result();
            if converted.is_none() {
                debug!(station = %name, "skipping search item without ARS id");
            }
            converted
        })
        .collect()
}

/// Arrival records carried by an arrival envelope.
///
/// A header with a non-zero `headerCd` is an upstream failure even though
/// the HTTP exchange succeeded. An envelope without a header is accepted.
pub fn arrival_records(root: &Value) -> Result<Vec<ArrivalRecord>, ApiError> {
    if root.is_null() {
        return Err(ApiError::Json {
            message: "empty arrival response".to_string(),
            body: None,
        });
    }

    if let Some(h) = header(root)
        && !h.is_ok()
    {
        return Err(ApiError::Upstream {
            code: h.header_cd,
            message: h.header_msg,
        });
    }

    Ok(decode_items::<ArrivalItem>(extract_items(root, ARRIVAL_ITEM_PATHS))
        .into_iter()
        .map(ArrivalRecord::from)
        .collect())
}

/// Saved favorites from the backend's plain JSON list.
///
/// The store does not validate what it is given, so a row that does not
/// decode (a missing or placeholder ARS id, say) is skipped instead of
/// failing the whole list.
pub fn saved_stations(rows: Value) -> Result<Vec<Station>, ApiError> {
    match rows {
        Value::Array(rows) => Ok(decode_items(rows)),
        other => Err(ApiError::Json {
            message: "expected a list of saved stations".to_string(),
            body: Some(other.to_string().chars().take(500).collect()),
        }),
    }
}
