//! Push, notification click and background sync events.

use serde::{Deserialize, Serialize};

use crate::config::NotificationDefaults;

/// Tag of the background sync registration the worker answers.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Data attached to a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationData {
    /// Page opened when the notification is clicked.
    pub url: String,
}

/// Notification to show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Icon url.
    pub icon: String,
    /// Badge url.
    pub badge: String,
    /// Attached data.
    pub data: NotificationData,
}

/// What the host must do with its clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open (or focus) a window on this url.
    OpenWindow(String),
}

/// Outcome of a background sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The tag is ours. Nothing is queued for replay yet, so the hook
    /// completes without doing any work.
    Replayed,
    /// The tag belongs to somebody else.
    Ignored,
}

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
}

/// Builds the notification announced by a push message.
///
/// The payload is JSON `{title, body, url}` with every field optional. A
/// payload that is not a JSON object is shown as the body text.
pub(crate) fn notification_from_push(
    defaults: &NotificationDefaults,
    payload: Option<&[u8]>,
) -> Notification {
    let payload = match payload {
        None => PushPayload::default(),
        Some(data) => serde_json::from_slice::<PushPayload>(data).unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(data).trim().to_owned();
            PushPayload {
                body: (!text.is_empty()).then_some(text),
                ..PushPayload::default()
            }
        }),
    };

    Notification {
        title: payload.title.unwrap_or_else(|| defaults.title.clone()),
        body: payload.body.unwrap_or_else(|| defaults.body.clone()),
        icon: defaults.icon.clone(),
        badge: defaults.badge.clone(),
        data: NotificationData {
            url: payload.url.unwrap_or_else(|| defaults.url.clone()),
        },
    }
}

pub(crate) fn click_action(notification: &Notification) -> ClientAction {
    let url = if notification.data.url.is_empty() {
        "/".to_owned()
    } else {
        notification.data.url.clone()
    };
    ClientAction::OpenWindow(url)
}

pub(crate) fn sync_outcome(tag: &str) -> SyncOutcome {
    if tag == BACKGROUND_SYNC_TAG {
        SyncOutcome::Replayed
    } else {
        SyncOutcome::Ignored
    }
}
