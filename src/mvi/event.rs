//! One-shot side-effect events.
//!
//! Two universes exist: events typed per engine (each screen's own enum)
//! and the fixed [`CommonUiEvent`] vocabulary understood by any generic
//! handler. Neither has a persisted representation; consuming an event
//! twice or never does not corrupt state.

use std::fmt::Debug;
use std::time::Duration;

/// Marker trait for one-shot events.
pub trait UiEvent: Debug + Send + 'static {}

/// How long a transient message stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastDuration {
    #[default]
    Short,
    Long,
}

impl ToastDuration {
    pub fn as_duration(self) -> Duration {
        match self {
            ToastDuration::Short => Duration::from_millis(2000),
            ToastDuration::Long => Duration::from_millis(3500),
        }
    }
}

/// Media accepted by an image/video picker flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    ImageAndVideo,
}

/// Shared event vocabulary handled by any screen host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonUiEvent {
    /// Scroll the primary list back to its first item.
    ScrollToTop,
    /// Leave the current screen.
    NavigateUp,
    /// Show a transient message.
    Toast {
        message: String,
        duration: ToastDuration,
    },
    /// Ask the content identified by `key` to reload.
    Refresh { key: String },
    StartSelectImages {
        id: String,
        max_count: u32,
        media_kind: MediaKind,
    },
    SelectedImages { id: String, images: Vec<String> },
    /// Begin an external flow whose result is reported back to `requester_id`.
    StartActivityForResult { requester_id: String, target: String },
    /// Result of a flow started with [`CommonUiEvent::StartActivityForResult`].
    ActivityResult {
        requester_id: String,
        result_code: i32,
        data: Option<String>,
    },
}

impl CommonUiEvent {
    /// Short transient message, the usual rendering of a failed operation.
    pub fn toast(message: impl Into<String>) -> Self {
        CommonUiEvent::Toast {
            message: message.into(),
            duration: ToastDuration::Short,
        }
    }
}

impl UiEvent for CommonUiEvent {}

/// Output of an engine's event mapping step.
///
/// The dispatcher routes `Common` to the common-event buffer and `Typed` to
/// the engine's own buffer. `Other` carries an event that belongs to neither
/// vocabulary; it is logged and discarded.
#[derive(Debug)]
pub enum RoutedEvent<E> {
    Common(CommonUiEvent),
    Typed(E),
    Other(Box<dyn UiEvent>),
}

impl<E> RoutedEvent<E> {
    pub fn other(event: impl UiEvent) -> Self {
        RoutedEvent::Other(Box::new(event))
    }
}

impl<E> From<CommonUiEvent> for RoutedEvent<E> {
    fn from(event: CommonUiEvent) -> Self {
        RoutedEvent::Common(event)
    }
}
