//! Active node locations pulled from the backend on a fixed interval.

use std::fmt;
use std::io::{self, Read};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::DataEvent;
use crate::geo::GeoPoint;
use crate::scheduler::{RepeatingTask, TaskHandle};

pub const LOCATIONS_PATH: &str = "/node-locations";
pub const PLACEHOLDER_NAME: &str = "Waiting for Nodes...";

/// Upper bound on a feed response body
const MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Transport(#[source] Box<ureq::Transport>),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("reading response body: {0}")]
    Io(#[from] io::Error),
    #[error("malformed location payload: {0}")]
    Decode(#[from] simd_json::Error),
}

impl From<ureq::Error> for FeedError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => FeedError::Status(code),
            ureq::Error::Transport(t) => FeedError::Transport(Box::new(t)),
        }
    }
}

/// A place with active network participants
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveLocation {
    pub display_name: String,
    pub point: GeoPoint,
    pub count: u64,
}

impl ActiveLocation {
    pub fn new(display_name: impl Into<String>, lon: f64, lat: f64, count: u64) -> Self {
        Self {
            display_name: display_name.into(),
            point: GeoPoint::new(lon, lat),
            count,
        }
    }

    /// Shown until the first successful poll so the globe is never empty
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_NAME, 0.0, 0.0, 0)
    }
}

/// Wire shape of one `/node-locations` entry
#[derive(Deserialize)]
struct LocationRecord {
    #[serde(rename = "city", alias = "displayName", alias = "display_name")]
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default, deserialize_with = "lenient_count")]
    count: u64,
}

/// Node counts arrive as integers, floats (`3.0`) or numeric strings
/// (`"3"`, as SQL `COUNT(*)` often serializes). `null` reads as zero.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative count as a number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
            if v.is_finite() && v >= 0.0 {
                Ok(v.round() as u64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            let trimmed = v.trim();
            if let Ok(n) = trimmed.parse::<u64>() {
                return Ok(n);
            }
            match trimmed.parse::<f64>() {
                Ok(f) => self.visit_f64(f),
                Err(_) => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<u64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<u64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

impl From<LocationRecord> for ActiveLocation {
    fn from(r: LocationRecord) -> Self {
        ActiveLocation::new(r.name, r.lng, r.lat, r.count)
    }
}

/// Decode a `/node-locations` response body (JSON array).
pub fn decode_locations(body: &mut [u8]) -> Result<Vec<ActiveLocation>, FeedError> {
    let records: Vec<LocationRecord> = simd_json::serde::from_slice(body)?;
    Ok(records.into_iter().map(ActiveLocation::from).collect())
}

/// HTTP client for the location endpoint
#[derive(Clone)]
pub struct LocationFeed {
    agent: ureq::Agent,
    url: String,
}

impl LocationFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            url: format!("{}{}", base_url.trim_end_matches('/'), LOCATIONS_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One poll. Non-2xx, transport and decode failures all come back as `Err`.
    pub fn fetch(&self) -> Result<Vec<ActiveLocation>, FeedError> {
        let response = self
            .agent
            .get(&self.url)
            .set("ngrok-skip-browser-warning", "true")
            .call()?;

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut body)?;
        decode_locations(&mut body)
    }

    /// Poll now and then every `interval`. Each tick runs the request on its
    /// own worker so a slow backend never delays the next tick; overlapping
    /// polls are not coordinated and the last result to arrive wins.
    pub fn spawn_poller(self, interval: Duration, tx: Sender<DataEvent>) -> io::Result<TaskHandle> {
        info!(url = %self.url, ?interval, "starting location poller");
        RepeatingTask::spawn("location-poller", interval, move || {
            let feed = self.clone();
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name("location-fetch".into())
                .spawn(move || {
                    let outcome = feed.fetch();
                    // Receiver gone means the view was torn down
                    let _ = tx.send(DataEvent::Locations(outcome));
                });
            if let Err(e) = spawned {
                warn!(error = %e, "could not start location fetch");
            }
        })
    }
}

/// The location set currently on screen.
///
/// Replaced wholesale by each successful, non-empty poll. Failed or empty
/// polls leave it untouched; before the first success it holds the placeholder.
pub struct LocationBoard {
    locations: Vec<ActiveLocation>,
    live: bool,
}

impl Default for LocationBoard {
    fn default() -> Self {
        Self {
            locations: vec![ActiveLocation::placeholder()],
            live: false,
        }
    }
}

impl LocationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locations(&self) -> &[ActiveLocation] {
        &self.locations
    }

    /// True once any poll has delivered data
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Sum of node counts across displayed locations
    pub fn total_nodes(&self) -> u64 {
        self.locations.iter().map(|l| l.count).sum()
    }

    /// Apply one poll outcome. Returns whether the displayed set changed.
    pub fn apply(&mut self, outcome: Result<Vec<ActiveLocation>, FeedError>) -> bool {
        match outcome {
            Ok(locations) if !locations.is_empty() => {
                debug!(count = locations.len(), "location set replaced");
                self.locations = locations;
                self.live = true;
                true
            }
            Ok(_) => {
                debug!("empty location poll; keeping previous set");
                false
            }
            Err(e) => {
                warn!(error = %e, "location poll failed; keeping previous set");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nyc() -> ActiveLocation {
        ActiveLocation::new("NYC", -74.0, 40.0, 3)
    }

    #[test]
    fn test_placeholder_before_first_success() {
        let mut board = LocationBoard::new();
        assert_eq!(board.locations(), &[ActiveLocation::placeholder()]);

        assert!(!board.apply(Ok(vec![])));
        assert_eq!(board.locations(), &[ActiveLocation::placeholder()]);
        assert!(!board.is_live());
    }

    #[test]
    fn test_success_replaces_placeholder() {
        let mut board = LocationBoard::new();
        assert!(board.apply(Ok(vec![nyc()])));
        assert_eq!(board.locations(), &[nyc()]);
        assert!(board.is_live());
        assert_eq!(board.total_nodes(), 3);
    }

    #[test]
    fn test_failure_and_empty_keep_previous() {
        let mut board = LocationBoard::new();
        board.apply(Ok(vec![nyc()]));

        assert!(!board.apply(Err(FeedError::Status(502))));
        assert_eq!(board.locations(), &[nyc()]);

        assert!(!board.apply(Ok(vec![])));
        assert_eq!(board.locations(), &[nyc()]);
    }

    #[test]
    fn test_replacement_is_whole_set() {
        let mut board = LocationBoard::new();
        board.apply(Ok(vec![nyc(), ActiveLocation::new("Berlin", 13.4, 52.5, 7)]));
        board.apply(Ok(vec![ActiveLocation::new("Tokyo", 139.7, 35.7, 1)]));
        assert_eq!(board.locations().len(), 1);
        assert_eq!(board.locations()[0].display_name, "Tokyo");
    }

    #[test]
    fn test_decode_wire_records() {
        let mut body = br#"[
            {"city": "NYC", "lat": 40, "lng": -74, "count": 3},
            {"displayName": "Lagos", "lat": 6.5, "lng": 3.4}
        ]"#
        .to_vec();
        let locations = decode_locations(&mut body).unwrap();
        assert_eq!(locations[0], nyc());
        assert_eq!(locations[1], ActiveLocation::new("Lagos", 3.4, 6.5, 0));
    }

    #[test]
    fn test_decode_loose_counts() {
        let mut body = br#"[
            {"city": "NYC", "lat": 40, "lng": -74, "count": 3.0},
            {"city": "Lagos", "lat": 6.5, "lng": 3.4, "count": "12"},
            {"city": "Oslo", "lat": 59.9, "lng": 10.7, "count": " 2.0 "},
            {"city": "Lima", "lat": -12.0, "lng": -77.0, "count": null}
        ]"#
        .to_vec();
        let counts: Vec<u64> = decode_locations(&mut body).unwrap().iter().map(|l| l.count).collect();
        assert_eq!(counts, vec![3, 12, 2, 0]);
    }

    #[test]
    fn test_decode_rejects_bad_counts() {
        let mut negative = br#"[{"city": "NYC", "lat": 40, "lng": -74, "count": -1}]"#.to_vec();
        assert!(decode_locations(&mut negative).is_err());

        let mut words = br#"[{"city": "NYC", "lat": 40, "lng": -74, "count": "many"}]"#.to_vec();
        assert!(decode_locations(&mut words).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let mut not_array = br#"{"city": "NYC"}"#.to_vec();
        assert!(matches!(decode_locations(&mut not_array), Err(FeedError::Decode(_))));

        let mut missing_coords = br#"[{"city": "NYC", "count": 1}]"#.to_vec();
        assert!(decode_locations(&mut missing_coords).is_err());

        let mut garbage = b"<html>ngrok</html>".to_vec();
        assert!(decode_locations(&mut garbage).is_err());
    }

    #[test]
    fn test_feed_url() {
        let feed = LocationFeed::new("http://localhost:3001/", Duration::from_secs(5));
        assert_eq!(feed.url(), "http://localhost:3001/node-locations");
    }

    #[test]
    fn test_unreachable_backend_is_error() {
        // Port 9 (discard) on localhost is essentially never listening
        let feed = LocationFeed::new("http://127.0.0.1:9", Duration::from_millis(500));
        assert!(feed.fetch().is_err());
    }
}
