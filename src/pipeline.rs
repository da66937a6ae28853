//! Request pipeline: chart request in, validated PNG out
//!
//! A render job moves through a fixed sequence of stages; `Failed` is
//! reachable from every non-terminal stage. Validation happens before any
//! session exists; once a session is acquired it is released on every exit
//! path, success or failure, before the result propagates.

use std::fmt;

use log::debug;

use crate::backend::{CdpSurface, Surface};
use crate::session::RenderSession;
use crate::spec::{normalize, ChartRequest};
use crate::{capture, markup, scene, sync, RenderConfig, Result};

/// Stages of one render job, in order. Used for observability only; control
/// flow is the plain function below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Created,
    Normalized,
    SceneBuilt,
    SessionAcquired,
    Loaded,
    RenderConfirmed,
    Captured,
    Validated,
    Completed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Created => "created",
            JobStage::Normalized => "normalized",
            JobStage::SceneBuilt => "scene_built",
            JobStage::SessionAcquired => "session_acquired",
            JobStage::Loaded => "loaded",
            JobStage::RenderConfirmed => "render_confirmed",
            JobStage::Captured => "captured",
            JobStage::Validated => "validated",
            JobStage::Completed => "completed",
        };
        write!(f, "{name}")
    }
}

fn enter(stage: JobStage) {
    debug!("render job stage: {stage}");
}

/// Terminal value of a successful render job.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    /// Raw PNG bytes with a verified signature
    pub png: Vec<u8>,
    /// The same bytes as padded standard base64
    pub image_base64: String,
}

/// Render a chart request with a fresh headless Chrome session.
pub async fn render_chart(request: &ChartRequest, config: &RenderConfig) -> Result<RenderedChart> {
    let factory_config = config.clone();
    render_with(request, config, move || CdpSurface::new(&factory_config)).await
}

/// Render a chart request against any surface the factory produces.
///
/// The factory is only invoked after the request has normalized, so invalid
/// input never costs a browser launch.
pub async fn render_with<S, F>(
    request: &ChartRequest,
    config: &RenderConfig,
    factory: F,
) -> Result<RenderedChart>
where
    S: Surface + 'static,
    F: FnOnce() -> Result<S> + Send + 'static,
{
    enter(JobStage::Created);

    let spec = normalize(request)?;
    enter(JobStage::Normalized);

    let scene = scene::build(&spec);
    enter(JobStage::SceneBuilt);

    let html = markup::document(&scene, config.viewport);

    let session = RenderSession::start(factory).await?;
    enter(JobStage::SessionAcquired);

    // From here on the session must be released whatever happens below.
    let outcome = render_loaded(&session, html, config).await;
    let released = session.release().await;

    let rendered = outcome?;
    released?;

    enter(JobStage::Completed);
    Ok(rendered)
}

async fn render_loaded(
    session: &RenderSession,
    html: String,
    config: &RenderConfig,
) -> Result<RenderedChart> {
    session.load(html).await?;
    enter(JobStage::Loaded);

    sync::await_rendered(session, config).await?;
    enter(JobStage::RenderConfirmed);

    let raw = session.capture().await?;
    enter(JobStage::Captured);

    let png = capture::validate(raw, config.min_capture_bytes)?;
    enter(JobStage::Validated);

    let image_base64 = capture::encode(&png)?;
    Ok(RenderedChart { png, image_base64 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_have_stable_names() {
        assert_eq!(JobStage::SessionAcquired.to_string(), "session_acquired");
        assert_eq!(JobStage::Completed.to_string(), "completed");
    }
}
