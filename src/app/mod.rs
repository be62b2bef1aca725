//! Presentation loop.
//!
//! The [`App`] task is the only place the status changes. Interfaces talk to
//! it through an [`AppHandle`]; pipeline results come back as
//! [`Completion`] messages and are applied on the loop task.

pub mod dispatch;
pub mod presenter;

pub use dispatch::{Completion, Dispatcher, RequestId};
pub use presenter::{Presenter, Status, StatusKind, StatusView};

use crate::config::Locale;
use crate::location::{LocationResolver, LocationSource};
use crate::sensors::{PermissionGate, REQUIRED_PERMISSIONS};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

/// Outcome of asking for a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "id", rename_all = "lowercase")]
pub enum Submission {
    Dispatched(RequestId),
    Denied,
}

#[derive(Debug)]
pub enum Command {
    /// First display: check permissions, ask once if missing.
    Start,
    Locate {
        source: LocationSource,
        reply: oneshot::Sender<Submission>,
    },
    Cancel {
        id: RequestId,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub workers: usize,
    pub timeout: Duration,
    pub locale: Locale,
}

type Observer = Box<dyn FnMut(&Status) + Send>;

pub struct App {
    presenter: Presenter,
    dispatcher: Dispatcher,
    gate: Arc<dyn PermissionGate>,
    commands: mpsc::Receiver<Command>,
    completions: mpsc::UnboundedReceiver<Completion>,
    status: watch::Sender<StatusView>,
    observer: Option<Observer>,
}

/// Cloneable interface side of the app.
#[derive(Clone)]
pub struct AppHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<StatusView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppClosed;

impl std::fmt::Display for AppClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "application loop has stopped")
    }
}

impl std::error::Error for AppClosed {}

impl App {
    pub fn new(resolver: Arc<LocationResolver>, gate: Arc<dyn PermissionGate>, settings: AppSettings) -> (Self, AppHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let presenter = Presenter::new(settings.locale);
        let (status_tx, status_rx) = watch::channel(presenter.view());

        let app = Self {
            presenter,
            dispatcher: Dispatcher::new(resolver, settings.workers, settings.timeout, done_tx),
            gate,
            commands: cmd_rx,
            completions: done_rx,
            status: status_tx,
            observer: None,
        };
        let handle = AppHandle {
            commands: cmd_tx,
            status: status_rx,
        };
        (app, handle)
    }

    /// Called on the loop task after every status change.
    pub fn on_transition(mut self, f: impl FnMut(&Status) + Send + 'static) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    /// Run until `Shutdown` or until every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                Some(done) = self.completions.recv() => self.complete(done),
            }
        }
        self.dispatcher.cancel_all();
        debug!("app loop stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start => {
                if !self.gate.granted(&REQUIRED_PERMISSIONS) && !self.gate.request(&REQUIRED_PERMISSIONS) {
                    info!("permission request denied");
                    self.presenter.deny();
                    self.publish();
                }
            }
            Command::Locate { source, reply } => {
                let outcome = if self.gate.granted(&REQUIRED_PERMISSIONS) {
                    self.presenter.begin(source);
                    Submission::Dispatched(self.dispatcher.submit(source))
                } else {
                    info!(%source, "location requested without permission");
                    self.presenter.deny();
                    Submission::Denied
                };
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::Cancel { id, reply } => {
                let cancelled = match self.dispatcher.cancel(id) {
                    Some(source) => {
                        self.after_cancel(source);
                        true
                    }
                    None => false,
                };
                let _ = reply.send(cancelled);
            }
            Command::Shutdown => {}
        }
    }

    /// The status only shows the cancellation once nothing else is running.
    /// If the cancelled source was on display, the newest remaining request
    /// takes its place.
    fn after_cancel(&mut self, source: LocationSource) {
        match self.dispatcher.latest() {
            None => self.presenter.cancel(source),
            Some(running) if self.presenter.status() == &Status::Fetching(source) && running != source => {
                self.presenter.begin(running)
            }
            Some(_) => return,
        }
        self.publish();
    }

    fn complete(&mut self, done: Completion) {
        if !self.dispatcher.finish(done.id) {
            debug!(id = %done.id, source = %done.source, "dropping completion of cancelled request");
            return;
        }
        debug!(
            id = %done.id,
            source = %done.source,
            ok = done.result.is_ok(),
            remaining = self.dispatcher.in_flight(),
            "request completed"
        );
        self.presenter.complete(done.source, &done.result);
        self.publish();
    }

    fn publish(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(self.presenter.status());
        }
        self.status.send_replace(self.presenter.view());
    }
}

impl AppHandle {
    pub async fn start(&self) -> Result<(), AppClosed> {
        self.commands.send(Command::Start).await.map_err(|_| AppClosed)
    }

    pub async fn locate(&self, source: LocationSource) -> Result<Submission, AppClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Locate { source, reply })
            .await
            .map_err(|_| AppClosed)?;
        rx.await.map_err(|_| AppClosed)
    }

    pub async fn cancel(&self, id: RequestId) -> Result<bool, AppClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Cancel { id, reply })
            .await
            .map_err(|_| AppClosed)?;
        rx.await.map_err(|_| AppClosed)
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    pub fn status(&self) -> StatusView {
        self.status.borrow().clone()
    }

    /// Wait until nothing is being fetched and return that status.
    pub async fn settled(&self) -> Result<StatusView, AppClosed> {
        let mut rx = self.status.clone();
        let view = rx.wait_for(|v| !v.is_fetching()).await.map_err(|_| AppClosed)?;
        Ok(view.clone())
    }
}
