//! Push messages and the notifications they produce.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Action id that opens the application.
pub const ACTION_EXPLORE: &str = "explore";
/// Action id that only dismisses.
pub const ACTION_CLOSE: &str = "close";

/// Notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NotificationId(u64);

impl NotificationId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Fixed presentation of push notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationOptions {
    /// Body used when the push carries no payload.
    pub default_body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds.
    pub vibrate: Vec<u32>,
    /// Route opened by the explore action, relative to the origin.
    pub open_url: String,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            default_body: "New notification from Math Tutor".to_string(),
            icon: "/static/icons/icon-192x192.png".to_string(),
            badge: "/static/icons/icon-72x72.png".to_string(),
            vibrate: vec![100, 50, 100],
            open_url: "/student/home".to_string(),
        }
    }
}

/// A received push message.
#[derive(Debug, Clone, Default)]
pub struct PushMessage {
    pub data: Option<Bytes>,
}

impl PushMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            data: Some(Bytes::from(body.into())),
        }
    }

    /// Payload as text, lossily decoded.
    pub fn payload_text(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|d| String::from_utf8_lossy(d).into_owned())
    }
}

/// Button on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    /// Milliseconds since the epoch.
    pub date_of_arrival: u64,
    pub primary_key: String,
}

/// A shown notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// Build the notification for one push message.
    pub fn for_push(title: &str, options: &NotificationOptions, message: &PushMessage) -> Self {
        let action = |id: &str, label: &str| NotificationAction {
            action: id.to_string(),
            title: label.to_string(),
            icon: options.badge.clone(),
        };

        Self {
            id: NotificationId::new(),
            title: title.to_string(),
            body: message
                .payload_text()
                .unwrap_or_else(|| options.default_body.clone()),
            icon: options.icon.clone(),
            badge: options.badge.clone(),
            vibrate: options.vibrate.clone(),
            data: NotificationData {
                date_of_arrival: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or_default(),
                primary_key: "1".to_string(),
            },
            actions: vec![action(ACTION_EXPLORE, "View"), action(ACTION_CLOSE, "Close")],
        }
    }
}

/// A click on a notification or one of its actions.
#[derive(Debug, Clone)]
pub struct NotificationClick {
    pub notification: NotificationId,
    /// `None` when the body rather than a button was clicked.
    pub action: Option<String>,
}

/// Notifications currently on screen.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: Vec<Notification>,
}

impl NotificationCenter {
    pub fn show(&mut self, notification: Notification) {
        self.shown.push(notification);
    }

    /// Close a notification; false if it was not showing.
    pub fn close(&mut self, id: NotificationId) -> bool {
        let before = self.shown.len();
        self.shown.retain(|n| n.id != id);
        self.shown.len() != before
    }

    pub fn shown(&self) -> &[Notification] {
        &self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_without_payload_uses_default_body() {
        let n = Notification::for_push("Math Tutor", &NotificationOptions::default(), &PushMessage::default());

        assert_eq!(n.title, "Math Tutor");
        assert_eq!(n.body, "New notification from Math Tutor");
        assert_eq!(n.vibrate, vec![100, 50, 100]);
        assert_eq!(n.data.primary_key, "1");
        assert!(n.data.date_of_arrival > 0);
    }

    #[test]
    fn test_push_payload_and_actions() {
        let n = Notification::for_push(
            "Math Tutor",
            &NotificationOptions::default(),
            &PushMessage::text("New assignment: fractions"),
        );

        assert_eq!(n.body, "New assignment: fractions");
        let ids: Vec<&str> = n.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(ids, vec![ACTION_EXPLORE, ACTION_CLOSE]);
        assert_eq!(n.actions[0].title, "View");
        assert!(n.actions.iter().all(|a| a.icon == "/static/icons/icon-72x72.png"));
    }

    #[test]
    fn test_center_close() {
        let mut center = NotificationCenter::default();
        let n = Notification::for_push("T", &NotificationOptions::default(), &PushMessage::default());
        let id = n.id;
        center.show(n);

        assert_eq!(center.shown().len(), 1);
        assert!(center.close(id));
        assert!(!center.close(id));
        assert!(center.shown().is_empty());
    }
}
