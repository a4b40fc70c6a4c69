//! Raw item shapes inside the catalog and arrival envelopes.
//!
//! The backend proxies an XML provider through a generic XML→JSON mapper,
//! so every scalar arrives as a string and missing elements are simply
//! absent. All fields default to empty.

use serde::Deserialize;

use crate::domain::{ArrivalRecord, ArsId, Crowding, RouteType, SearchResult};

/// Provider message header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgHeader {
    pub header_cd: String,
    pub header_msg: String,
}

impl MsgHeader {
    /// `headerCd` of `"0"` means the call succeeded.
    pub fn is_ok(&self) -> bool {
        self.header_cd.trim() == "0"
    }
}

/// One station in a catalog search result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StationItem {
    #[serde(rename = "stId")]
    pub st_id: String,
    #[serde(rename = "stNm")]
    pub st_nm: String,
    #[serde(rename = "arsId")]
    pub ars_id: String,
    /// Longitude.
    #[serde(rename = "tmX")]
    pub tm_x: String,
    /// Latitude.
    #[serde(rename = "tmY")]
    pub tm_y: String,
}

impl StationItem {
    /// Convert to a search result. Items without a usable ARS id yield `None`.
    pub fn into_search_result(self) -> Option<SearchResult> {
        let ars_id = ArsId::parse(&self.ars_id).ok()?;
        Some(SearchResult {
            station_id: self.st_id,
            station_name: self.st_nm,
            ars_id,
            lat: self.tm_y,
            lng: self.tm_x,
            distance_meters: None,
        })
    }
}

/// One route in an arrival board.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArrivalItem {
    #[serde(rename = "rtNm")]
    pub rt_nm: String,
    pub arrmsg1: String,
    pub arrmsg2: String,
    #[serde(rename = "routeType")]
    pub route_type: String,
    #[serde(rename = "isLast1")]
    pub is_last1: String,
    #[serde(rename = "reride_Num1")]
    pub reride_num1: String,
    #[serde(rename = "busType1")]
    pub bus_type1: String,
    #[serde(rename = "nxtStn")]
    pub nxt_stn: String,
    pub adirection: String,
    #[serde(rename = "stNm")]
    pub st_nm: String,
}

impl From<ArrivalItem> for ArrivalRecord {
    fn from(item: ArrivalItem) -> Self {
        ArrivalRecord {
            route_type: RouteType::from_code(&item.route_type),
            is_last_bus: item.is_last1.trim() == "1",
            crowding: Crowding::from_code(&item.reride_num1),
            low_floor: item.bus_type1.trim() == "1",
            route_name: item.rt_nm,
            first_message: item.arrmsg1,
            second_message: item.arrmsg2,
            next_stop: item.nxt_stn,
            direction: item.adirection,
        }
    }
}
