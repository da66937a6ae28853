//! Render synchronizer
//!
//! The scene renderer emits no completion event, so readiness is inferred by
//! polling a structural predicate against the loaded page: the chart counts as
//! drawn once at least one SVG shape element has a non-degenerate bounding
//! box. The predicate and its timing are configuration
//! ([`RenderConfig::poll_interval`], [`RenderConfig::render_deadline`],
//! [`RenderConfig::settle_delay`]); the trailing settle delay is a safety
//! margin for late layout passes, not a correctness guarantee.

use std::time::Instant;

use log::{debug, trace};

use crate::session::RenderSession;
use crate::{Error, RenderConfig, Result};

/// Structural readiness probe evaluated inside the page.
///
/// A hairline (zero width or zero height, not both) still counts as drawn so
/// single reference lines and flat series are not mistaken for an empty page.
const READINESS_PROBE: &str = r#"
(function() {
    const shapes = document.querySelectorAll('svg path, svg rect, svg circle, svg polyline, svg line');
    for (const shape of shapes) {
        const box = shape.getBBox();
        if (box.width > 0 || box.height > 0) return true;
    }
    return false;
})()
"#;

/// Wait until the loaded scene has finished drawing.
///
/// Fails with [`Error::RenderTimeout`] when the predicate never holds within
/// the deadline. The caller still owns the session and must release it.
pub async fn await_rendered(session: &RenderSession, config: &RenderConfig) -> Result<()> {
    let started = Instant::now();
    let deadline = started + config.render_deadline;

    loop {
        let ready = session.eval(READINESS_PROBE).await?;
        if ready.as_bool() == Some(true) {
            debug!(
                "scene confirmed rendered after {}ms",
                started.elapsed().as_millis()
            );
            break;
        }
        trace!("readiness predicate not satisfied yet");

        if Instant::now() >= deadline {
            return Err(Error::RenderTimeout(config.render_deadline.as_millis() as u64));
        }
        tokio::time::sleep(config.poll_interval).await;
    }

    // Absorb late layout passes before the snapshot is taken
    tokio::time::sleep(config.settle_delay).await;
    Ok(())
}
