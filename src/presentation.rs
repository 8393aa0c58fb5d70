// ABOUTME: Presentation handoff - the coordinator's only output to the UI.
// ABOUTME: Publishes {visible, payload} on a watch channel for the shared-link screen.

use tokio::sync::watch;

/// What the shared-link screen should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharePresentation {
    pub visible: bool,
    pub payload: String,
}

impl SharePresentation {
    pub fn shown(payload: impl Into<String>) -> Self {
        Self {
            visible: true,
            payload: payload.into(),
        }
    }

    pub fn hidden() -> Self {
        Self::default()
    }
}

/// Publisher side of the presentation channel.
pub(crate) struct Presenter {
    tx: watch::Sender<SharePresentation>,
}

impl Presenter {
    pub(crate) fn new() -> (Self, watch::Receiver<SharePresentation>) {
        let (tx, rx) = watch::channel(SharePresentation::hidden());
        (Self { tx }, rx)
    }

    pub(crate) fn show(&self, payload: &str) {
        self.tx.send_replace(SharePresentation::shown(payload));
    }

    pub(crate) fn hide(&self) {
        self.tx.send_if_modified(|current| {
            if current.visible {
                *current = SharePresentation::hidden();
                true
            } else {
                false
            }
        });
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SharePresentation> {
        self.tx.subscribe()
    }
}
