//! Render session manager
//!
//! A [`RenderSession`] owns exactly one headless rendering surface for the
//! duration of one request. The surface API is blocking (CDP calls are
//! synchronous), so the session spawns a dedicated worker thread that owns the
//! surface and executes commands sent from async tasks; callers await oneshot
//! replies and never block a runtime thread.
//!
//! Teardown contract: `release` must be called on every exit path. As a
//! backstop, dropping the session closes the command channel, which ends the
//! worker loop and drops the surface, killing the child process. A leaked
//! session therefore cannot outlive its request.

use std::sync::mpsc::{self, Sender};
use std::thread;

use log::debug;
use tokio::sync::oneshot;

use crate::backend::{CdpSurface, Surface};
use crate::{Error, RenderConfig, Result};

enum Command {
    Load(String, oneshot::Sender<Result<()>>),
    Eval(String, oneshot::Sender<Result<serde_json::Value>>),
    Capture(oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// One exclusively-owned headless rendering session.
pub struct RenderSession {
    cmd_tx: Sender<Command>,
}

impl RenderSession {
    /// Acquire a session backed by a fresh headless Chrome process.
    pub async fn acquire(config: &RenderConfig) -> Result<Self> {
        let config = config.clone();
        Self::start(move || CdpSurface::new(&config)).await
    }

    /// Acquire a session over any surface produced by `factory`.
    ///
    /// The factory runs on the worker thread, so the surface itself does not
    /// need to be `Send`. Tests use this to drive the full pipeline against a
    /// stub surface.
    pub async fn start<S, F>(factory: F) -> Result<Self>
    where
        S: Surface + 'static,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut surface = match factory() {
                Ok(s) => s,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Load(html, resp) => {
                        let _ = resp.send(surface.load_html(&html));
                    }
                    Command::Eval(script, resp) => {
                        let _ = resp.send(surface.eval(&script));
                    }
                    Command::Capture(resp) => {
                        let _ = resp.send(surface.capture_png());
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(surface.close());
                        return;
                    }
                }
            }

            // Channel dropped without an explicit Close: the surface goes down
            // with the thread.
            debug!("render session dropped without release; discarding surface");
        });

        init_rx
            .await
            .map_err(|_| Error::Infrastructure("Render worker exited during startup".into()))??;

        Ok(Self { cmd_tx })
    }

    /// Load a markup document into the session's page.
    pub async fn load(&self, html: String) -> Result<()> {
        self.dispatch(|resp| Command::Load(html, resp)).await
    }

    /// Evaluate a script against the session's page.
    pub async fn eval(&self, script: &str) -> Result<serde_json::Value> {
        self.dispatch(|resp| Command::Eval(script.to_string(), resp))
            .await
    }

    /// Capture the current page as PNG bytes.
    pub async fn capture(&self) -> Result<Vec<u8>> {
        self.dispatch(Command::Capture).await
    }

    /// Tear down the surface and its process.
    pub async fn release(self) -> Result<()> {
        self.dispatch(Command::Close).await
    }

    async fn dispatch<T, F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(oneshot::Sender<Result<T>>) -> Command,
    {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| Error::Infrastructure("Render worker terminated".into()))?;
        rx.await
            .map_err(|_| Error::Infrastructure("Render worker dropped reply".into()))?
    }
}
