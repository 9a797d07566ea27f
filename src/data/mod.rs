pub mod feed;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::geo::GeoPoint;
use crate::map::{DotField, DotFieldBuilder, LandShape, Polygon, Ring};
use feed::{ActiveLocation, FeedError};

/// Natural Earth 110m physical land polygons
pub const DEFAULT_LAND_URL: &str =
    "https://raw.githubusercontent.com/martynafford/natural-earth-geojson/refs/heads/master/110m/physical/ne_110m_land.json";

/// Results delivered from background workers to the render thread
pub enum DataEvent {
    Locations(Result<Vec<ActiveLocation>, FeedError>),
    Land(Result<DotField>),
}

/// Where the landmass polygons come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LandSource {
    Url(String),
    File(PathBuf),
}

impl LandSource {
    /// `http://` / `https://` strings are URLs, anything else is a file path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            LandSource::Url(source.to_string())
        } else {
            LandSource::File(PathBuf::from(source))
        }
    }

    fn read(&self, timeout: Duration) -> Result<String> {
        match self {
            LandSource::Url(url) => {
                let agent = ureq::AgentBuilder::new().timeout(timeout).build();
                let response = agent
                    .get(url)
                    .call()
                    .with_context(|| format!("fetching {url}"))?;
                response
                    .into_string()
                    .with_context(|| format!("reading body of {url}"))
            }
            LandSource::File(path) => {
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
            }
        }
    }
}

impl std::fmt::Display for LandSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandSource::Url(url) => f.write_str(url),
            LandSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse GeoJSON text into land shapes (one per Polygon / MultiPolygon geometry).
pub fn parse_land(content: &str) -> Result<Vec<LandShape>> {
    let geojson: GeoJson = content.parse().context("parsing land GeoJSON")?;
    let mut shapes = Vec::new();
    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    collect_shapes(geometry, &mut shapes);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                collect_shapes(geometry, &mut shapes);
            }
        }
        GeoJson::Geometry(geometry) => collect_shapes(geometry, &mut shapes),
    }
    Ok(shapes)
}

fn collect_shapes(geometry: &Geometry, shapes: &mut Vec<LandShape>) {
    match &geometry.value {
        Value::Polygon(rings) => {
            if let Some(polygon) = polygon_from_rings(rings) {
                shapes.push(LandShape::new(vec![polygon]));
            }
        }
        Value::MultiPolygon(polygons) => {
            let parts: Vec<Polygon> = polygons.iter().filter_map(|rings| polygon_from_rings(rings)).collect();
            if !parts.is_empty() {
                shapes.push(LandShape::new(parts));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_shapes(g, shapes);
            }
        }
        _ => debug!("skipping non-polygon geometry"),
    }
}

/// First ring is the outline, the rest are holes. Positions with fewer
/// than two ordinates are dropped.
fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .filter(|c| c.len() >= 2)
            .map(|c| GeoPoint::new(c[0], c[1]))
            .collect::<Ring>()
    });
    let outer = rings.next().filter(|ring| !ring.is_empty())?;
    let holes = rings.filter(|ring| !ring.is_empty()).collect();
    Some(Polygon::new(outer, holes))
}

/// Fetch, parse and sample the land dataset.
pub fn load_dot_field(source: &LandSource, builder: DotFieldBuilder, timeout: Duration) -> Result<DotField> {
    let started = Instant::now();
    let content = source.read(timeout)?;
    let shapes = parse_land(&content)?;
    let field = builder.build(&shapes);
    info!(
        %source,
        shapes = shapes.len(),
        dots = field.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "land dot field built"
    );
    Ok(field)
}

/// Load the land dataset once on a background thread and hand the finished
/// dot field (or the failure) to the render thread.
pub fn spawn_land_loader(
    source: LandSource,
    builder: DotFieldBuilder,
    timeout: Duration,
    tx: Sender<DataEvent>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("land-loader".into()).spawn(move || {
        let result = load_dot_field(&source, builder, timeout);
        let _ = tx.send(DataEvent::Land(result));
    })
}
