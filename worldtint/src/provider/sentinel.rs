//! Sentinel-2 rendering provider.
//!
//! Talks to the Sentinel Hub Process API on the Copernicus Data Space:
//! a tile's bounds go in as a closed polygon ring in EPSG:3857, and a
//! rendered true-color PNG comes back. The per-pixel shading program
//! ([`EVALSCRIPT`]) is carried verbatim as an opaque string; this crate
//! never interprets it.

use serde::Serialize;

use super::http::HttpClient;
use super::types::{HttpResponse, ProviderError};
use crate::coord::Rect;

/// Process API endpoint on the Copernicus Data Space.
const CDSE_PROCESS_URL: &str = "https://sh.dataspace.copernicus.eu/api/v1/process";

/// CRS identifier for Web Mercator, as the Process API expects it.
const CRS_EPSG_3857: &str = "http://www.opengis.net/def/crs/EPSG/0/3857";

/// Dataset identifier for atmospherically corrected Sentinel-2 imagery.
const DATA_TYPE_S2_L2A: &str = "sentinel-2-l2a";

/// Rendered image edge length in pixels.
const DEFAULT_OUTPUT_EDGE_PX: u32 = 512;

/// Maximum acceptable cloud coverage, percent.
const DEFAULT_MAX_CLOUD_COVERAGE: u8 = 10;

/// Per-pixel shading program: gamma-corrected true color from the
/// visible bands. Executed by the rendering service, opaque here.
const EVALSCRIPT: &str = r#"
//VERSION=3
function setup() {
    return {
        input: [{
            bands: ["B02", "B03", "B04", "CLM"],
            units: "DN"
        }],
        output: {
            bands: 3,
            sampleType: "AUTO"
        }
    };
}

function evaluatePixel(sample) {
    let r = sample.B04 / 10000;
    let g = sample.B03 / 10000;
    let b = sample.B02 / 10000;

    r = Math.pow(r * 3.5, 0.8);
    g = Math.pow(g * 3.5, 0.8);
    b = Math.pow(b * 3.5, 0.8);

    r = Math.min(1, Math.max(0, r));
    g = Math.min(1, Math.max(0, g));
    b = Math.min(1, Math.max(0, b));

    return [r, g, b];
}
"#;

/// Trait for the remote rendering collaborator.
///
/// Returns `Ok` with the full HTTP response whatever the status (the
/// retry policy in [`crate::fetch`] branches on it) and `Err` only for
/// transport-level failures.
pub trait RenderProvider: Send + Sync {
    /// Request a rendered image for the given bounds.
    fn render(&self, bounds: &Rect, bearer_token: &str) -> Result<HttpResponse, ProviderError>;
}

/// Rendering configuration: the fixed filters and output shape sent with
/// every request.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output width and height in pixels.
    pub output_edge_px: u32,
    /// Inclusive start of the acquisition time filter, RFC 3339.
    pub time_from: String,
    /// Inclusive end of the acquisition time filter, RFC 3339.
    pub time_to: String,
    /// Maximum cloud coverage percentage accepted for a scene.
    pub max_cloud_coverage: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        // One full calendar year gives the mosaicking enough scenes to
        // find a cloud-free view of almost every tile.
        Self {
            output_edge_px: DEFAULT_OUTPUT_EDGE_PX,
            time_from: "2023-01-01T00:00:00Z".to_string(),
            time_to: "2023-12-31T23:59:59Z".to_string(),
            max_cloud_coverage: DEFAULT_MAX_CLOUD_COVERAGE,
        }
    }
}

/// Sentinel-2 provider over the Process API.
pub struct SentinelProvider<C: HttpClient> {
    http_client: C,
    config: RenderConfig,
    process_url: String,
}

impl<C: HttpClient> SentinelProvider<C> {
    /// Creates a provider against the production Process API endpoint.
    pub fn new(http_client: C) -> Self {
        Self {
            http_client,
            config: RenderConfig::default(),
            process_url: CDSE_PROCESS_URL.to_string(),
        }
    }

    /// Override the rendering configuration.
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the Process API endpoint.
    pub fn with_process_url(mut self, url: impl Into<String>) -> Self {
        self.process_url = url.into();
        self
    }

    /// Build the request payload for one tile.
    pub fn request_payload(&self, bounds: &Rect) -> ProcessRequest {
        ProcessRequest {
            input: Input {
                bounds: Bounds {
                    geometry: Geometry {
                        kind: "Polygon".to_string(),
                        coordinates: vec![closed_ring(bounds)],
                    },
                    properties: CrsProperties {
                        crs: CRS_EPSG_3857.to_string(),
                    },
                },
                data: vec![DataSpec {
                    kind: DATA_TYPE_S2_L2A.to_string(),
                    data_filter: DataFilter {
                        time_range: TimeRange {
                            from: self.config.time_from.clone(),
                            to: self.config.time_to.clone(),
                        },
                        max_cloud_coverage: self.config.max_cloud_coverage,
                    },
                    processing: Processing {
                        atmospheric_correction: "SURFACE_REFLECTANCE".to_string(),
                    },
                }],
            },
            output: Output {
                width: self.config.output_edge_px,
                height: self.config.output_edge_px,
                responses: vec![ResponseSpec {
                    identifier: "default".to_string(),
                    format: ResponseFormat {
                        kind: "image/png".to_string(),
                    },
                }],
            },
            evalscript: EVALSCRIPT.to_string(),
        }
    }
}

impl<C: HttpClient> RenderProvider for SentinelProvider<C> {
    fn render(&self, bounds: &Rect, bearer_token: &str) -> Result<HttpResponse, ProviderError> {
        let payload = self.request_payload(bounds);
        let body = serde_json::to_string(&payload)
            .map_err(|e| ProviderError::MalformedResponse(format!("request payload: {}", e)))?;

        self.http_client
            .post_json(&self.process_url, bearer_token, &body)
    }
}

/// The rectangle's four corners as a closed ring: the first corner is
/// repeated at the end, winding west/south counter-clockwise.
fn closed_ring(bounds: &Rect) -> Vec<[f64; 2]> {
    vec![
        [bounds.west, bounds.south],
        [bounds.east, bounds.south],
        [bounds.east, bounds.north],
        [bounds.west, bounds.north],
        [bounds.west, bounds.south],
    ]
}

// Process API request body. Field names follow the wire format.

#[derive(Debug, Serialize)]
pub struct ProcessRequest {
    input: Input,
    output: Output,
    evalscript: String,
}

#[derive(Debug, Serialize)]
struct Input {
    bounds: Bounds,
    data: Vec<DataSpec>,
}

#[derive(Debug, Serialize)]
struct Bounds {
    geometry: Geometry,
    properties: CrsProperties,
}

#[derive(Debug, Serialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Serialize)]
struct CrsProperties {
    crs: String,
}

#[derive(Debug, Serialize)]
struct DataSpec {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "dataFilter")]
    data_filter: DataFilter,
    processing: Processing,
}

#[derive(Debug, Serialize)]
struct DataFilter {
    #[serde(rename = "timeRange")]
    time_range: TimeRange,
    #[serde(rename = "maxCloudCoverage")]
    max_cloud_coverage: u8,
}

#[derive(Debug, Serialize)]
struct TimeRange {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct Processing {
    #[serde(rename = "atmosphericCorrection")]
    atmospheric_correction: String,
}

#[derive(Debug, Serialize)]
struct Output {
    width: u32,
    height: u32,
    responses: Vec<ResponseSpec>,
}

#[derive(Debug, Serialize)]
struct ResponseSpec {
    identifier: String,
    format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::tests::MockHttpClient;

    fn sample_bounds() -> Rect {
        Rect::new(-100.0, 100.0, -50.0, 50.0).unwrap()
    }

    #[test]
    fn test_payload_polygon_is_a_closed_ring() {
        let mock = MockHttpClient::new(vec![]);
        let provider = SentinelProvider::new(mock);
        let payload = provider.request_payload(&sample_bounds());
        let json = serde_json::to_value(&payload).unwrap();

        let ring = &json["input"]["bounds"]["geometry"]["coordinates"][0];
        let points = ring.as_array().unwrap();
        assert_eq!(points.len(), 5, "ring must repeat its first corner");
        assert_eq!(points[0], points[4]);
        assert_eq!(points[0][0], -100.0);
        assert_eq!(points[0][1], -50.0);
        assert_eq!(points[2][0], 100.0);
        assert_eq!(points[2][1], 50.0);
    }

    #[test]
    fn test_payload_wire_field_names() {
        let mock = MockHttpClient::new(vec![]);
        let provider = SentinelProvider::new(mock);
        let json = serde_json::to_value(provider.request_payload(&sample_bounds())).unwrap();

        assert_eq!(json["input"]["bounds"]["geometry"]["type"], "Polygon");
        assert_eq!(
            json["input"]["bounds"]["properties"]["crs"],
            "http://www.opengis.net/def/crs/EPSG/0/3857"
        );
        let data = &json["input"]["data"][0];
        assert_eq!(data["type"], "sentinel-2-l2a");
        assert_eq!(data["dataFilter"]["maxCloudCoverage"], 10);
        assert_eq!(data["dataFilter"]["timeRange"]["from"], "2023-01-01T00:00:00Z");
        assert_eq!(data["dataFilter"]["timeRange"]["to"], "2023-12-31T23:59:59Z");
        assert_eq!(data["processing"]["atmosphericCorrection"], "SURFACE_REFLECTANCE");
    }

    #[test]
    fn test_payload_output_shape() {
        let mock = MockHttpClient::new(vec![]);
        let provider = SentinelProvider::new(mock);
        let json = serde_json::to_value(provider.request_payload(&sample_bounds())).unwrap();

        assert_eq!(json["output"]["width"], 512);
        assert_eq!(json["output"]["height"], 512);
        assert_eq!(json["output"]["responses"][0]["identifier"], "default");
        assert_eq!(json["output"]["responses"][0]["format"]["type"], "image/png");
        assert!(json["evalscript"]
            .as_str()
            .unwrap()
            .contains("evaluatePixel"));
    }

    #[test]
    fn test_custom_config_flows_into_payload() {
        let mock = MockHttpClient::new(vec![]);
        let provider = SentinelProvider::new(mock).with_config(RenderConfig {
            output_edge_px: 64,
            time_from: "2020-01-01T00:00:00Z".to_string(),
            time_to: "2020-06-30T23:59:59Z".to_string(),
            max_cloud_coverage: 25,
        });
        let json = serde_json::to_value(provider.request_payload(&sample_bounds())).unwrap();

        assert_eq!(json["output"]["width"], 64);
        assert_eq!(json["input"]["data"][0]["dataFilter"]["maxCloudCoverage"], 25);
        assert_eq!(
            json["input"]["data"][0]["dataFilter"]["timeRange"]["from"],
            "2020-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_render_posts_payload_to_process_endpoint() {
        let mock = MockHttpClient::single(Ok(HttpResponse {
            status: 200,
            body: vec![0x89, b'P', b'N', b'G'],
        }));
        let provider = SentinelProvider::new(mock).with_process_url("http://localhost/process");

        let response = provider.render(&sample_bounds(), "token").unwrap();
        assert!(response.is_success());

        let requests = provider.http_client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://localhost/process");
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["input"]["data"][0]["type"], "sentinel-2-l2a");
    }

    #[test]
    fn test_render_passes_through_error_statuses() {
        let mock = MockHttpClient::single(Ok(HttpResponse {
            status: 429,
            body: b"slow down".to_vec(),
        }));
        let provider = SentinelProvider::new(mock);

        let response = provider.render(&sample_bounds(), "token").unwrap();
        assert!(response.is_rate_limited());
    }
}
