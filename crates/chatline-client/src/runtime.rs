//! Effectful shell around the fold.
//!
//! All inputs (dial results, envelopes, keys, resizes, ticks) arrive on one
//! channel and are folded in arrival order. After each fold the returned
//! intents are performed, then the screen is redrawn. Reads go through a
//! dedicated reader task that reads exactly one envelope per `Listen`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ratatui::crossterm::event::{self as term, Event as TermEvent};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chatline_core::error::{ChatError, Result};
use chatline_core::protocol::{LoginRequest, Payload};

use crate::event::Event;
use crate::intent::Intent;
use crate::model::Model;
use crate::transport::{self, WsReader, WsStream, WsWriter};
use crate::update::update;
use crate::{tui, view};

const DIAL_TIMEOUT: Duration = Duration::from_secs(10);
const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub dial_timeout: Duration,
}

impl ClientConfig {
    /// `addr` is `host:port`; a full `ws://` / `wss://` URL is used as is.
    pub fn new(addr: &str, path: &str) -> Self {
        let url = if addr.starts_with("ws://") || addr.starts_with("wss://") {
            addr.to_string()
        } else {
            format!("ws://{addr}{path}")
        };
        Self {
            url,
            dial_timeout: DIAL_TIMEOUT,
        }
    }
}

enum Input {
    Event(Event),
    Dialed(Result<WsStream>),
}

/// Run until the fold asks to quit or every input source is gone.
pub async fn run(cfg: ClientConfig, terminal: &mut DefaultTerminal) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Input>();
    spawn_terminal_input(tx.clone());

    let mut model = Model::new();
    let mut driver = Driver::new(cfg, tx.clone());

    for intent in model.init() {
        driver.perform(intent).await;
    }
    redraw(terminal, &model)?;

    while let Some(input) = rx.recv().await {
        let event = match input {
            Input::Event(e) => e,
            Input::Dialed(Ok(ws)) => {
                driver.attach(ws);
                Event::Connected
            }
            Input::Dialed(Err(e)) => Event::ConnectFailed(e.to_string()),
        };

        let (next, intents) = update(model, event);
        model = next;

        let mut quit = false;
        for intent in intents {
            quit |= driver.perform(intent).await;
        }
        if quit {
            break;
        }
        redraw(terminal, &model)?;
    }

    info!("client stopped");
    Ok(())
}

fn redraw(terminal: &mut DefaultTerminal, model: &Model) -> Result<()> {
    let screen = view::render(model);
    terminal
        .draw(|frame| tui::draw(frame, &screen))
        .map_err(|e| ChatError::Internal(format!("terminal draw failed: {e}")))?;
    Ok(())
}

/// Performs intents. Owns the write half and the reader task's listen gate.
struct Driver {
    cfg: ClientConfig,
    tx: mpsc::UnboundedSender<Input>,
    writer: Option<WsWriter>,
    listen: Option<mpsc::Sender<()>>,
}

impl Driver {
    fn new(cfg: ClientConfig, tx: mpsc::UnboundedSender<Input>) -> Self {
        Self {
            cfg,
            tx,
            writer: None,
            listen: None,
        }
    }

    fn attach(&mut self, ws: WsStream) {
        let (writer, reader) = ws.split();
        let (listen_tx, listen_rx) = mpsc::channel(1);
        tokio::spawn(read_on_demand(reader, listen_rx, self.tx.clone()));
        self.writer = Some(writer);
        self.listen = Some(listen_tx);
    }

    /// Returns `true` when the runtime should stop.
    async fn perform(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Connect => {
                let tx = self.tx.clone();
                let url = self.cfg.url.clone();
                let within = self.cfg.dial_timeout;
                tokio::spawn(async move {
                    let _ = tx.send(Input::Dialed(transport::dial(&url, within).await));
                });
            }
            Intent::Login(username) => {
                self.write(Payload::LoginRequest(LoginRequest { username })).await;
            }
            Intent::Send(msg) => self.write(Payload::Chat(msg)).await,
            Intent::Listen => match &self.listen {
                Some(gate) => {
                    if gate.try_send(()).is_err() {
                        debug!("listen already pending");
                    }
                }
                None => self.emit(Event::Disconnected("not connected".into())),
            },
            Intent::Disconnect => {
                // Closing the writer makes the server close too, which resolves
                // any outstanding read.
                if let Some(mut writer) = self.writer.take() {
                    if let Err(e) = writer.close().await {
                        debug!(error = %e, "close failed");
                    }
                }
                self.listen = None;
            }
            Intent::ScheduleTick(after) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(Input::Event(Event::Tick));
                });
            }
            Intent::Quit => return true,
        }
        false
    }

    async fn write(&mut self, payload: Payload) {
        let Some(writer) = self.writer.as_mut() else {
            self.emit(Event::Disconnected("not connected".into()));
            return;
        };
        if let Err(e) = transport::write(writer, &payload).await {
            warn!(error = %e, "write failed");
            self.writer = None;
            self.emit(Event::Disconnected(e.to_string()));
        }
    }

    fn emit(&self, event: Event) {
        let _ = self.tx.send(Input::Event(event));
    }
}

/// Reader task: one envelope per listen permit.
async fn read_on_demand(
    mut reader: WsReader,
    mut listen: mpsc::Receiver<()>,
    tx: mpsc::UnboundedSender<Input>,
) {
    while listen.recv().await.is_some() {
        let event = match transport::read_payload(&mut reader).await {
            Ok(payload) => Event::Received(payload),
            Err(e) => Event::Disconnected(e.to_string()),
        };
        let closed = matches!(event, Event::Disconnected(_));
        if tx.send(Input::Event(event)).is_err() || closed {
            break;
        }
    }
    debug!("reader stopped");
}

/// Blocking crossterm poll loop on its own thread.
fn spawn_terminal_input(tx: mpsc::UnboundedSender<Input>) {
    std::thread::spawn(move || loop {
        if tx.is_closed() {
            break;
        }
        match term::poll(INPUT_POLL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!(error = %e, "terminal poll failed");
                break;
            }
        }
        let event = match term::read() {
            Ok(TermEvent::Key(key)) => tui::map_key(key).map(Event::Key),
            Ok(TermEvent::Resize(width, height)) => Some(Event::Resize { width, height }),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "terminal read failed");
                break;
            }
        };
        if let Some(event) = event {
            if tx.send(Input::Event(event)).is_err() {
                break;
            }
        }
    });
}
