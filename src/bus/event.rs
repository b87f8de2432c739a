//! Broadcast-scope events and subscription filters.

use std::fmt;
use std::sync::Arc;

use crate::mvi::{MediaKind, UiEvent};

/// Events used for choreography between engines that hold no reference to
/// one another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalEvent {
    /// The active account changed; screens reload account-bound content.
    AccountSwitched,
    ScrollToTop,
    Refresh { key: String },
    StartSelectImages {
        id: String,
        max_count: u32,
        media_kind: MediaKind,
    },
    SelectedImages { id: String, images: Vec<String> },
    /// A reply was posted; any open screen showing the thread reconciles.
    ReplySuccess(ReplySuccess),
    StartActivityForResult { requester_id: String, target: String },
    ActivityResult {
        requester_id: String,
        result_code: i32,
        data: Option<String>,
    },
}

/// Identifiers of a successfully posted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplySuccess {
    pub thread_id: i64,
    pub new_post_id: i64,
    /// Set when replying inside a floor.
    pub post_id: Option<i64>,
    /// Set when replying to a comment inside a floor.
    pub sub_post_id: Option<i64>,
    pub new_sub_post_id: Option<i64>,
}

impl ReplySuccess {
    pub fn to_thread(thread_id: i64, new_post_id: i64) -> Self {
        Self {
            thread_id,
            new_post_id,
            post_id: None,
            sub_post_id: None,
            new_sub_post_id: None,
        }
    }
}

/// Payload-free discriminant of a [`GlobalEvent`], used as type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalEventKind {
    AccountSwitched,
    ScrollToTop,
    Refresh,
    StartSelectImages,
    SelectedImages,
    ReplySuccess,
    StartActivityForResult,
    ActivityResult,
}

impl GlobalEvent {
    pub fn kind(&self) -> GlobalEventKind {
        match self {
            GlobalEvent::AccountSwitched => GlobalEventKind::AccountSwitched,
            GlobalEvent::ScrollToTop => GlobalEventKind::ScrollToTop,
            GlobalEvent::Refresh { .. } => GlobalEventKind::Refresh,
            GlobalEvent::StartSelectImages { .. } => GlobalEventKind::StartSelectImages,
            GlobalEvent::SelectedImages { .. } => GlobalEventKind::SelectedImages,
            GlobalEvent::ReplySuccess(_) => GlobalEventKind::ReplySuccess,
            GlobalEvent::StartActivityForResult { .. } => GlobalEventKind::StartActivityForResult,
            GlobalEvent::ActivityResult { .. } => GlobalEventKind::ActivityResult,
        }
    }
}

impl UiEvent for GlobalEvent {}

type Predicate = Arc<dyn Fn(&GlobalEvent) -> bool + Send + Sync>;

/// Which publications a subscriber wants: an optional set of kinds and an
/// optional predicate. The default filter accepts everything.
#[derive(Clone, Default)]
pub struct EventFilter {
    kinds: Option<Vec<GlobalEventKind>>,
    predicate: Option<Predicate>,
}

impl EventFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn kind(kind: GlobalEventKind) -> Self {
        Self::kinds([kind])
    }

    pub fn kinds(kinds: impl IntoIterator<Item = GlobalEventKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
            predicate: None,
        }
    }

    /// Additionally require `predicate` to hold.
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&GlobalEvent) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn matches(&self, event: &GlobalEvent) -> bool {
        let kind_ok = self
            .kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&event.kind()));
        kind_ok && self.predicate.as_ref().is_none_or(|predicate| predicate(event))
    }
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFilter")
            .field("kinds", &self.kinds)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
