//! Chartshot
//!
//! A headless chart rendering pipeline: declarative chart requests in, PNG
//! bytes out. Heterogeneous input shapes are normalized into a canonical
//! [`spec::ChartSpec`], turned into a declarative scene tree, serialized to a
//! self-contained markup document, and rasterized by a headless browser
//! session that is owned exclusively by one request and torn down on every
//! exit path.
//!
//! # Example
//!
//! ```no_run
//! use chartshot::{pipeline, spec::ChartRequest, RenderConfig};
//!
//! # async fn run() -> chartshot::Result<()> {
//! let request: ChartRequest = serde_json::from_str(
//!     r#"{"type": "bar", "data": [{"x": "HDL", "y": 55}], "ylabel": "mg/dL"}"#,
//! ).map_err(|e| chartshot::Error::Validation(e.to_string()))?;
//!
//! let rendered = pipeline::render_chart(&request, &RenderConfig::default()).await?;
//! println!("{} PNG bytes", rendered.png.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod backend;
pub mod capture;
pub mod markup;
pub mod pipeline;
pub mod scene;
pub mod server;
pub mod session;
pub mod spec;
pub mod sync;

/// Configuration for one rendering session
///
/// The defaults follow the service's historical behavior: an 800x600 surface,
/// a sub-100ms poll interval, a deadline inside the 5-10s policy window, and a
/// one-second settle delay to absorb late layout passes. The settle delay is a
/// tunable safety margin, not a correctness guarantee.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Raster dimensions of the captured image
    pub viewport: Viewport,
    /// Interval between readiness probes (must stay at or below 100ms)
    pub poll_interval: Duration,
    /// Deadline for the readiness predicate to hold
    pub render_deadline: Duration,
    /// Fixed delay between readiness and capture
    pub settle_delay: Duration,
    /// Captures smaller than this are rejected as truncated
    pub min_capture_bytes: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            poll_interval: Duration::from_millis(50),
            render_deadline: Duration::from_secs(8),
            settle_delay: Duration::from_secs(1),
            min_capture_bytes: 100,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}
