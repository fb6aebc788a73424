//! Navigation chrome state: sidebar, mobile drawer, notifications, logout.

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::auth::SessionStore;
use crate::gate::AUTH_PATH;
use crate::models::{NavigationItem, Section};

/// Sidebar entries in display order.
pub const NAVIGATION: [NavigationItem; 3] = [
    Section::Dashboard.descriptor(),
    Section::Documents.descriptor(),
    Section::Search.descriptor(),
];

/// Section whose path equals `location` exactly, if any.
pub fn active_section(location: &str) -> Option<Section> {
    NAVIGATION
        .iter()
        .find(|item| item.path == location)
        .map(|item| item.section)
}

/// Ephemeral chrome state, reset whenever the shell is mounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiState {
    pub collapsed: bool,
    pub mobile_open: bool,
}

impl UiState {
    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn open_drawer(&mut self) {
        self.mobile_open = true;
    }

    pub fn close_drawer(&mut self) {
        self.mobile_open = false;
    }

    /// Navigate from the drawer: closes it and returns the target path.
    pub fn select_from_drawer(&mut self, section: Section) -> &'static str {
        self.mobile_open = false;
        section.descriptor().path
    }

    pub fn reset(&mut self) {
        *self = UiState::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient, dismissible message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// FIFO of pending notices; each one is rendered exactly once.
#[derive(Debug, Default)]
pub struct Notices {
    queue: Mutex<VecDeque<Notice>>,
}

impl Notices {
    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeKind::Error, message.into());
    }

    fn push(&self, kind: NoticeKind, message: String) {
        self.queue.lock().push_back(Notice { kind, message });
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Session ended; go to this path
    Navigate(&'static str),
    /// Logout failed; stay where we are
    Stay,
}

/// Shell logout action: on success the shell unmounts, so its UI state resets.
pub async fn logout(store: &SessionStore, ui: &Mutex<UiState>, notices: &Notices) -> LogoutOutcome {
    match store.logout().await {
        Ok(()) => {
            ui.lock().reset();
            notices.success("Logged out successfully");
            LogoutOutcome::Navigate(AUTH_PATH)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Logout failed");
            notices.error("Failed to logout");
            LogoutOutcome::Stay
        }
    }
}
