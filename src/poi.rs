//! Points of interest from an external search provider.
use crate::{
    datum::{self, Datum},
    error::Result,
    geo::GeoPoint,
    navigation::Waypoint,
    store::{SearchEntry, SearchHistory},
};
use chrono::Utc;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A search result as returned by the provider.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Poi {
    pub name: String,
    pub address: Option<String>,
    /// Position in the provider's shifted datum.
    pub point: GeoPoint,
}

impl Poi {
    /// Position in the global datum.
    pub fn global_point(&self) -> GeoPoint {
        datum::to_global(self.point)
    }

    /// Converts the result into an unsaved waypoint in the global datum.
    pub fn into_waypoint(self) -> Waypoint {
        Waypoint::from_datum(self.name, self.point, Datum::Shifted)
    }
}

/// Callback receiving the outcome of a search.
pub type SearchReply = Box<dyn FnOnce(Result<Vec<Poi>>) + Send>;

/// An asynchronous POI search provider.
///
/// Failures are reported through `reply` as [`Error::PoiSearch`](crate::Error::PoiSearch)
/// carrying the provider's code.
pub trait PoiSearch {
    fn search(&self, query: &str, reply: SearchReply);
}

/// Records `query` in `history` and forwards it to `provider`.
///
/// A failure to record is logged and does not stop the search.
pub fn search_and_record<P, H>(provider: &P, history: &H, query: &str, reply: SearchReply)
where
    P: PoiSearch + ?Sized,
    H: SearchHistory + ?Sized,
{
    match history.record_search(query, Utc::now()) {
        Ok(SearchEntry { id, .. }) => log::debug!("recorded search {id}: '{query}'"),
        Err(err) => log::warn!("failed to record search '{query}': {err}"),
    }

    provider.search(query, reply);
}
