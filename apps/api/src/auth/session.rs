//! Session state machine and the saved-roadmaps view that follows it.
//!
//! States: `Anonymous`, `Authenticated(UserId)`. Events: login, logout, failed sign-in.
//! Subscribers see one `Transition` per actual state change. Work that depends on
//! the signed-in user (listing saved roadmaps) runs on entering `Authenticated`,
//! never from the call that triggered the event.
//!
//! The HTTP server does not use this module; it identifies each request on its
//! own. It is for a client shell embedding the crate (a desktop or TUI front end)
//! that feeds login, logout and sign-in-failure events from its OAuth flow into a
//! `SessionObserver` and hands a subscription to `SavedRoadmaps::follow`, usually
//! on a spawned task.

use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::auth::{SignInFailure, UserId};
use crate::models::roadmap::SavedRoadmap;
use crate::store::RoadmapStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Login(UserId),
    Logout,
    SignInFailed { code: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
}

/// Result of feeding one event to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Transitioned(Transition),
    Unchanged,
    SignInFailed(SignInFailure),
}

#[derive(Default)]
pub struct SessionObserver {
    state: SessionState,
    subscribers: Vec<UnboundedSender<Transition>>,
}

impl SessionObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&UserId> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Anonymous => None,
        }
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<Transition> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn apply(&mut self, event: SessionEvent) -> Applied {
        let next = match event {
            SessionEvent::Login(user) => SessionState::Authenticated(user),
            SessionEvent::Logout => SessionState::Anonymous,
            SessionEvent::SignInFailed { code } => {
                let failure = SignInFailure::from_code(&code);
                match &failure {
                    SignInFailure::UserCancelled => debug!("Sign-in cancelled by user ({code})"),
                    SignInFailure::Configuration { .. } => {
                        error!("Sign-in blocked by provider configuration: {code}")
                    }
                    SignInFailure::Other { .. } => warn!("Sign-in failed: {code}"),
                }
                return Applied::SignInFailed(failure);
            }
        };

        if next == self.state {
            return Applied::Unchanged;
        }

        let transition = Transition {
            from: std::mem::replace(&mut self.state, next.clone()),
            to: next,
        };
        info!("Session {:?} -> {:?}", transition.from, transition.to);

        // Drop subscribers whose receiver is gone.
        self.subscribers
            .retain(|tx| tx.send(transition.clone()).is_ok());

        Applied::Transitioned(transition)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Saved roadmaps view
// ────────────────────────────────────────────────────────────────────────────

/// The signed-in user's saved roadmaps, kept in step with session transitions.
pub struct SavedRoadmaps {
    store: Arc<dyn RoadmapStore>,
    roadmaps: Vec<SavedRoadmap>,
    last_error: Option<String>,
    fetches: usize,
}

impl SavedRoadmaps {
    pub fn new(store: Arc<dyn RoadmapStore>) -> Self {
        Self {
            store,
            roadmaps: Vec::new(),
            last_error: None,
            fetches: 0,
        }
    }

    pub fn roadmaps(&self) -> &[SavedRoadmap] {
        &self.roadmaps
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of listings issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    pub async fn on_transition(&mut self, transition: &Transition) {
        match &transition.to {
            SessionState::Anonymous => {
                self.roadmaps.clear();
                self.last_error = None;
            }
            SessionState::Authenticated(user) => {
                self.fetches += 1;
                match self.store.list_by_owner(user).await {
                    Ok(roadmaps) => {
                        debug!("Loaded {} saved roadmaps for {user}", roadmaps.len());
                        self.roadmaps = roadmaps;
                        self.last_error = None;
                    }
                    Err(e) => {
                        error!("Error fetching roadmaps for {user}: {e}");
                        self.roadmaps.clear();
                        self.last_error = Some(e.to_string());
                    }
                }
            }
        }
    }

    /// Applies transitions until every sender is dropped, then hands the view back.
    pub async fn follow(mut self, mut transitions: UnboundedReceiver<Transition>) -> Self {
        while let Some(transition) = transitions.recv().await {
            self.on_transition(&transition).await;
        }
        self
    }
}
