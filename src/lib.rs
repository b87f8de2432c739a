//! Reactive MVI state engine.
//!
//! Screens submit intents to an [`Engine`]; a [`ChangeProducer`] turns them
//! into partial changes; the reducer folds those into immutable state
//! snapshots and routes side outputs into typed or common one-shot events.
//! Independent engines coordinate through an injected [`GlobalEventBus`].

pub mod buffer;
pub mod bus;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logging;
pub mod mvi;
pub mod producer;
pub mod scope;
pub mod subscription;

pub use bus::{EventFilter, GlobalEvent, GlobalEventBus, GlobalEventKind};
pub use context::ExecutionContext;
pub use engine::{Engine, EngineBuilder, Lifecycle};
pub use error::EngineError;
pub use producer::{ChangeProducer, IntentRouter, SequentialPolicy, Strategy};
pub use scope::{Scope, ScopeHandle};
