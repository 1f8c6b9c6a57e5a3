//! Page-side install prompt.
//!
//! The browser offers one deferred install prompt per page load. The
//! controller holds it from the `beforeinstallprompt` event until the user
//! answers or the page unloads.

use std::time::Instant;

use tracing::{debug, info};

/// The deferred prompt handle.
#[derive(Debug, Clone)]
pub struct DeferredPrompt {
    /// Platforms the browser offered, e.g. `["web"]`.
    pub platforms: Vec<String>,
    pub deferred_at: Instant,
}

impl DeferredPrompt {
    pub fn new(platforms: Vec<String>) -> Self {
        Self {
            platforms,
            deferred_at: Instant::now(),
        }
    }
}

/// The user's answer to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Accepted,
    Dismissed,
}

/// Owner of the single deferred prompt.
#[derive(Debug, Default)]
pub struct InstallPromptController {
    deferred: Option<DeferredPrompt>,
    showing: bool,
}

impl InstallPromptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash the prompt instead of letting the browser show it. Replaces any older one.
    pub fn defer(&mut self, prompt: DeferredPrompt) {
        debug!(platforms = ?prompt.platforms, "Install prompt deferred");
        self.deferred = Some(prompt);
        self.showing = false;
    }

    /// Whether an install button should be visible.
    pub fn can_install(&self) -> bool {
        self.deferred.is_some() && !self.showing
    }

    /// Show the prompt (install button clicked). `None` if nothing is deferred
    /// or it is already showing.
    pub fn show(&mut self) -> Option<&DeferredPrompt> {
        if self.showing {
            return None;
        }
        let prompt = self.deferred.as_ref()?;
        self.showing = true;
        Some(prompt)
    }

    /// Record the user's choice; the prompt cannot be reused afterwards.
    pub fn resolve(&mut self, outcome: PromptOutcome) -> Option<DeferredPrompt> {
        if !self.showing {
            return None;
        }
        match outcome {
            PromptOutcome::Accepted => info!("User accepted the install prompt"),
            PromptOutcome::Dismissed => info!("User dismissed the install prompt"),
        }
        self.showing = false;
        self.deferred.take()
    }

    /// Page unload drops the handle.
    pub fn clear(&mut self) {
        self.deferred = None;
        self.showing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lifecycle() {
        let mut controller = InstallPromptController::new();
        assert!(!controller.can_install());
        assert!(controller.show().is_none());

        controller.defer(DeferredPrompt::new(vec!["web".into()]));
        assert!(controller.can_install());

        assert!(controller.show().is_some());
        assert!(!controller.can_install());
        assert!(controller.show().is_none());

        let used = controller.resolve(PromptOutcome::Accepted).unwrap();
        assert_eq!(used.platforms, vec!["web".to_string()]);
        assert!(!controller.can_install());
        assert!(controller.resolve(PromptOutcome::Dismissed).is_none());
    }

    #[test]
    fn test_resolve_requires_showing() {
        let mut controller = InstallPromptController::new();
        controller.defer(DeferredPrompt::new(vec![]));
        assert!(controller.resolve(PromptOutcome::Dismissed).is_none());
        assert!(controller.can_install());
    }

    #[test]
    fn test_clear_on_unload() {
        let mut controller = InstallPromptController::new();
        controller.defer(DeferredPrompt::new(vec!["web".into()]));
        controller.clear();
        assert!(!controller.can_install());
    }
}
