use crate::engine::Engine;
use crate::{EngineConfig, Error, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::{oneshot, OwnedSemaphorePermit};

enum Command {
    SetContent(String, oneshot::Sender<Result<()>>),
    Screenshot(oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly browser abstraction backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous [`Engine`] instance and executes
/// commands sent from async tasks, so callers get an async interface and the
/// blocking CDP calls never run on the runtime. The engine does not need to
/// be `Send`.
///
/// The worker exits, dropping the engine and with it the browser process, as
/// soon as every `Browser` and `Page` handle is gone. An early return or a
/// cancelled future therefore still releases the browser.
///
/// A permit passed to [`Browser::launch`] is owned by the worker and released
/// only after the engine is gone, so it counts live browsers rather than
/// pending futures.
pub struct Browser {
    cmd_tx: Sender<Command>,
}

/// A handle representing the browser's page.
#[derive(Clone)]
pub struct Page {
    cmd_tx: Sender<Command>,
}

impl Browser {
    /// Launch a browser (spawns a background thread that owns the engine).
    ///
    /// `permit` is held by the worker thread until the engine has been
    /// closed or dropped.
    pub async fn launch<E>(config: EngineConfig, permit: Option<OwnedSemaphorePermit>) -> Result<Self>
    where
        E: Engine + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::Builder::new()
            .name("ogpshot-browser".to_string())
            .spawn(move || {
                // Declared first so it is dropped after the engine
                let _permit = permit;

                // Initialize engine on the worker thread
                let mut engine = match E::new(config) {
                    Ok(e) => e,
                    Err(err) => {
                        let _ = init_tx.send(Err(err));
                        return;
                    }
                };

                // If the caller went away during launch there is nobody to serve
                if init_tx.send(Ok(())).is_err() {
                    let _ = engine.close();
                    return;
                }

                // Command loop; ends when every handle has been dropped
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::SetContent(html, resp) => {
                            let res = engine.load_html(&html);
                            let _ = resp.send(res);
                        }
                        Command::Screenshot(resp) => {
                            let res = engine.render_png();
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            let res = engine.close();
                            let _ = resp.send(res);
                            return;
                        }
                    }
                }

                if let Err(e) = engine.close() {
                    log::warn!("Failed to close abandoned browser: {}", e);
                }
            })
            .map_err(|e| Error::InitializationError(format!("Failed to spawn browser worker: {}", e)))?;

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Open a page handle backed by the same worker thread.
    pub fn new_page(&self) -> Page {
        Page {
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    /// Shutdown the background worker and close the browser.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        send(&self.cmd_tx, Command::Close(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}

impl Page {
    /// Replace the page content and wait until it has settled
    pub async fn set_content(&self, html: String) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        send(&self.cmd_tx, Command::SetContent(html, tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("SetContent canceled: {}", e)))?
    }

    /// Take a PNG screenshot of the viewport
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        send(&self.cmd_tx, Command::Screenshot(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Screenshot canceled: {}", e)))?
    }
}

fn send(cmd_tx: &Sender<Command>, cmd: Command) -> Result<()> {
    cmd_tx
        .send(cmd)
        .map_err(|_| Error::Other("Browser worker has exited".to_string()))
}
