//! The command reader: single entry point for keyboard input.
//!
//! ## Learning: Channels as Queues
//!
//! Input and selection feedback arrive on two `tokio::sync::mpsc`
//! unbounded channels. The reader is their only consumer, so events are
//! handled strictly in order, and feedback produced by one command is
//! drained before the next input event is looked at.
//!
//! ```text
//! InputHandle ──► input queue ──► CommandReader::handle
//!                                    │ Mode::resolve
//!                                    │ History::push ──► buffer
//!                                    ▼                     │
//!                      Mode::update_selections ◄── feedback queue
//! ```

use chordal_buffer::{
    BufferError, ChangeObserver, ChangeSet, ObserverId, SelectionChange, TextRange,
};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};

use crate::builtins;
use crate::command::{Command, CommandRegistry, CommandThunk};
use crate::config::Config;
use crate::document::{Document, DocumentId};
use crate::event::{EditorEvent, EventBus};
use crate::history::{Execution, History};
use crate::keymap;
use crate::mode::{Mode, Resolution};
use crate::shortcut::{RawKeyEvent, Shortcut, normalize, sequence_to_string};
use crate::{CoreError, CoreResult};

/// One item on the input queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A normalized key press; `at` defaults to the time it is handled
    Key {
        shortcut: Shortcut,
        at: Option<Instant>,
    },
    /// A platform key event still to be normalized
    Raw {
        event: RawKeyEvent,
        at: Option<Instant>,
    },
    /// Insert a string as one command (paste, scripted input)
    Insert { text: String, at: Option<Instant> },
    /// The view layer moved the selections
    Selection(SelectionChange),
}

/// Outcome of dispatching one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The key was a chord prefix; waiting for the next key
    Pending,
    /// A command ran
    Executed(Execution),
}

/// Sending half of the input queue.
///
/// Cloneable; the reader's `run` loop ends once every handle is dropped.
#[derive(Debug, Clone)]
pub struct InputHandle {
    sender: mpsc::UnboundedSender<InputEvent>,
}

impl InputHandle {
    /// Queues an event.
    pub fn send(&self, event: InputEvent) -> CoreResult<()> {
        self.sender.send(event).map_err(|_| CoreError::InputClosed)
    }

    /// Queues a key press stamped when it is handled.
    pub fn key(&self, shortcut: Shortcut) -> CoreResult<()> {
        self.send(InputEvent::Key { shortcut, at: None })
    }

    /// Queues a key press with an explicit timestamp.
    pub fn key_at(&self, shortcut: Shortcut, at: Instant) -> CoreResult<()> {
        self.send(InputEvent::Key {
            shortcut,
            at: Some(at),
        })
    }

    /// Queues a raw platform key event.
    pub fn raw(&self, event: RawKeyEvent) -> CoreResult<()> {
        self.send(InputEvent::Raw { event, at: None })
    }

    /// Queues a text insertion.
    pub fn insert(&self, text: impl Into<String>, at: Option<Instant>) -> CoreResult<()> {
        self.send(InputEvent::Insert {
            text: text.into(),
            at,
        })
    }

    /// Queues a selection change from the view layer.
    pub fn selection(&self, from: Vec<TextRange>, to: Vec<TextRange>) -> CoreResult<()> {
        self.send(InputEvent::Selection(SelectionChange::new(from, to)))
    }
}

/// Selections reported by a buffer after a committed transaction.
#[derive(Debug)]
struct SelectionFeedback {
    document: DocumentId,
    selections: Vec<TextRange>,
}

/// Buffer observer that puts selection changes on the feedback queue.
struct SelectionForwarder {
    document: DocumentId,
    sender: mpsc::UnboundedSender<SelectionFeedback>,
}

impl ChangeObserver for SelectionForwarder {
    fn on_change(&mut self, change: &ChangeSet) {
        let _ = self.sender.send(SelectionFeedback {
            document: self.document,
            selections: change.selections.to.clone(),
        });
    }
}

/// Dispatches input against the active mode and records history.
pub struct CommandReader {
    mode: Mode,
    history: History,
    registry: CommandRegistry,
    grouping_delta: Duration,
    /// Chord keys typed so far
    pending: Vec<Shortcut>,
    input: mpsc::UnboundedReceiver<InputEvent>,
    feedback_tx: mpsc::UnboundedSender<SelectionFeedback>,
    feedback_rx: mpsc::UnboundedReceiver<SelectionFeedback>,
    /// Forwarder registered on the bound document's buffer
    observer: Option<ObserverId>,
    events: EventBus,
}

impl CommandReader {
    /// Creates a reader with the built-in commands.
    pub fn new(config: &Config) -> CoreResult<(Self, InputHandle)> {
        Self::with_registry(config, CommandRegistry::with_builtins())
    }

    /// Creates a reader whose config bindings may name commands from
    /// `registry`.
    pub fn with_registry(
        config: &Config,
        registry: CommandRegistry,
    ) -> CoreResult<(Self, InputHandle)> {
        let table = keymap::table_from_config(config, &registry)?;
        let mode = Mode::from_kind(config.mode.default, table);
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();

        tracing::info!(mode = %mode.name(), "Command reader ready");

        let reader = Self {
            mode,
            history: History::new(config.history.undo_limit),
            registry,
            grouping_delta: config.history.grouping_delta(),
            pending: Vec::new(),
            input: input_rx,
            feedback_tx,
            feedback_rx,
            observer: None,
            events: EventBus::new(),
        };
        Ok((reader, InputHandle { sender: input_tx }))
    }

    /// Rebuilds bindings and history limits from `config`.
    ///
    /// On error the previous bindings stay in place.
    pub fn apply_config(&mut self, config: &Config) -> CoreResult<()> {
        let table = keymap::table_from_config(config, &self.registry)?;
        self.mode.set_table(table);
        self.grouping_delta = config.history.grouping_delta();
        self.history.set_limit(config.history.undo_limit);
        self.pending.clear();
        self.events.emit(EditorEvent::ConfigChanged);
        Ok(())
    }

    /// Makes `document` the target of all following commands.
    ///
    /// Binding a different document clears the history, since its
    /// commands describe the old buffer, and moves the selection
    /// forwarder over to the new buffer.
    pub fn bind_document(&mut self, document: Document) -> CoreResult<()> {
        let id = document.id();
        let previous = self.mode.document().cloned();
        let rebinding = previous.as_ref().is_some_and(|current| current.id() == id);

        if !rebinding {
            let observer = document
                .buffer()
                .try_borrow_mut()
                .map_err(|_| BufferError::TransactionInProgress)?
                .observe(Box::new(SelectionForwarder {
                    document: id,
                    sender: self.feedback_tx.clone(),
                }));
            if let (Some(previous), Some(old)) = (&previous, self.observer.replace(observer)) {
                match previous.buffer().try_borrow_mut() {
                    Ok(mut buffer) => {
                        buffer.unobserve(old);
                    }
                    Err(_) => {
                        tracing::warn!(document = %previous.id(), "Could not detach selection forwarder");
                    }
                }
            }
            if previous.is_some() {
                self.history.clear();
            }
        }

        self.mode.bind(document)?;
        self.pending.clear();

        tracing::debug!(document = %id, rebinding, "Document bound");
        self.events.emit(EditorEvent::DocumentBound(id));
        Ok(())
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_mut(&mut self) -> &mut Mode {
        &mut self.mode
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn grouping_delta(&self) -> Duration {
        self.grouping_delta
    }

    /// Subscribes to reader events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Returns true if a chord prefix is waiting for its next key.
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Chord keys typed so far.
    pub fn pending_keys(&self) -> &[Shortcut] {
        &self.pending
    }

    /// Dispatches a key press stamped now.
    pub fn dispatch(&mut self, shortcut: Shortcut) -> CoreResult<Dispatch> {
        self.dispatch_at(shortcut, Instant::now())
    }

    /// Dispatches a key press stamped `now`.
    ///
    /// Any failure discards a pending chord and leaves history alone.
    pub fn dispatch_at(&mut self, shortcut: Shortcut, now: Instant) -> CoreResult<Dispatch> {
        self.drain_feedback();

        let resolution = self
            .mode
            .resolve(&self.pending, &shortcut, now, self.grouping_delta);
        match resolution {
            Ok(Resolution::Prefix) => {
                self.pending.push(shortcut);
                let keys = sequence_to_string(&self.pending);
                tracing::trace!(keys = %keys, "Prefix pending");
                self.events.emit(EditorEvent::PrefixPending { keys });
                Ok(Dispatch::Pending)
            }
            Ok(Resolution::Command(command)) => {
                self.pending.clear();
                self.execute(command).map(Dispatch::Executed)
            }
            Err(err) => {
                self.pending.clear();
                Err(err)
            }
        }
    }

    /// Runs a registered command by name.
    pub fn execute_named(&mut self, name: &str, now: Instant) -> CoreResult<Execution> {
        let thunk = self
            .registry
            .get(name)
            .ok_or_else(|| CoreError::CommandNotFound(name.to_string()))?;
        self.execute_thunk(&thunk, now)
    }

    /// Inserts `text` at the selection as one command.
    pub fn insert_text(&mut self, text: impl Into<String>, now: Instant) -> CoreResult<Execution> {
        self.execute_thunk(&builtins::insert_text(text), now)
    }

    /// Produces a command from `thunk` and executes it.
    pub fn execute_thunk(&mut self, thunk: &CommandThunk, now: Instant) -> CoreResult<Execution> {
        self.drain_feedback();
        self.pending.clear();
        let command = self
            .mode
            .produce(now, self.grouping_delta, |ctx| thunk(ctx))?;
        self.execute(command)
    }

    /// Executes an already produced command through history.
    pub fn execute(&mut self, command: Command) -> CoreResult<Execution> {
        let document = self.mode.document().cloned().ok_or(CoreError::DocumentNil)?;
        let name = command.name().to_string();

        let result = {
            let mut storage = document
                .buffer()
                .try_borrow_mut()
                .map_err(|_| BufferError::TransactionInProgress)?;
            self.history.push(command, &mut *storage)
        };
        self.drain_feedback();
        let execution = result?;

        tracing::debug!(command = %name, ?execution, "Executed");
        self.events.emit(match execution {
            Execution::Undone(count) => EditorEvent::Undone { count },
            Execution::Redone(count) => EditorEvent::Redone { count },
            Execution::Recorded | Execution::Transient => EditorEvent::CommandExecuted {
                name,
                document: document.id(),
            },
        });
        Ok(execution)
    }

    /// Handles one input event, reporting failures instead of returning
    /// them.
    pub fn handle(&mut self, event: InputEvent) {
        let result = match event {
            InputEvent::Key { shortcut, at } => self
                .dispatch_at(shortcut, at.unwrap_or_else(Instant::now))
                .map(|_| ()),
            InputEvent::Raw { event, at } => match normalize(&event) {
                Some(shortcut) => self
                    .dispatch_at(shortcut, at.unwrap_or_else(Instant::now))
                    .map(|_| ()),
                None => {
                    tracing::trace!(?event, "Ignoring key event without characters");
                    Ok(())
                }
            },
            InputEvent::Insert { text, at } => self
                .insert_text(text, at.unwrap_or_else(Instant::now))
                .map(|_| ()),
            InputEvent::Selection(change) => {
                self.drain_feedback();
                self.mode.update_selections(change.to);
                if let Some(document) = self.mode.document() {
                    self.events.emit(EditorEvent::SelectionChanged(document.id()));
                }
                Ok(())
            }
        };

        if let Err(err) = result {
            self.report(&err);
        }
    }

    /// Handles every event already queued. Returns how many there were.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.input.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Handles input until every [`InputHandle`] has been dropped.
    pub async fn run(&mut self) {
        while let Some(event) = self.input.recv().await {
            self.handle(event);
        }
        tracing::debug!("Input closed");
    }

    fn report(&self, err: &CoreError) {
        if err.is_recoverable() {
            tracing::debug!("Dispatch failed: {}", err);
        } else {
            tracing::warn!("Dispatch failed: {}", err);
        }
        self.events.emit(EditorEvent::Beep {
            reason: err.to_string(),
        });
    }

    fn drain_feedback(&mut self) {
        let current = self.mode.document().map(Document::id);
        while let Ok(feedback) = self.feedback_rx.try_recv() {
            if Some(feedback.document) != current {
                tracing::trace!(document = %feedback.document, "Ignoring stale selection feedback");
                continue;
            }
            self.mode.update_selections(feedback.selections);
            self.events.emit(EditorEvent::SelectionChanged(feedback.document));
        }
    }
}
