// ABOUTME: Readiness tracker holding four monotonic start-up flags.
// ABOUTME: Flags only ever move from false to true within one coordinator lifetime.

/// One of the start-up signals the coordinator waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadinessFlag {
    /// Fonts, images and other bundled resources are loaded.
    ResourcesLoaded,
    /// The authentication check has completed (successfully or not).
    AuthChecked,
    /// The remote-data client and its cache are usable.
    DataLayerReady,
    /// The navigator is mounted and accepts route changes.
    NavigationReady,
}

impl ReadinessFlag {
    pub const ALL: [ReadinessFlag; 4] = [
        ReadinessFlag::ResourcesLoaded,
        ReadinessFlag::AuthChecked,
        ReadinessFlag::DataLayerReady,
        ReadinessFlag::NavigationReady,
    ];
}

impl std::fmt::Display for ReadinessFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadinessFlag::ResourcesLoaded => write!(f, "resources_loaded"),
            ReadinessFlag::AuthChecked => write!(f, "auth_checked"),
            ReadinessFlag::DataLayerReady => write!(f, "data_layer_ready"),
            ReadinessFlag::NavigationReady => write!(f, "navigation_ready"),
        }
    }
}

/// Snapshot of all four readiness flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessState {
    pub resources_loaded: bool,
    pub auth_checked: bool,
    pub data_layer_ready: bool,
    pub navigation_ready: bool,
}

impl ReadinessState {
    /// Read a single flag.
    pub fn get(&self, flag: ReadinessFlag) -> bool {
        match flag {
            ReadinessFlag::ResourcesLoaded => self.resources_loaded,
            ReadinessFlag::AuthChecked => self.auth_checked,
            ReadinessFlag::DataLayerReady => self.data_layer_ready,
            ReadinessFlag::NavigationReady => self.navigation_ready,
        }
    }

    fn slot(&mut self, flag: ReadinessFlag) -> &mut bool {
        match flag {
            ReadinessFlag::ResourcesLoaded => &mut self.resources_loaded,
            ReadinessFlag::AuthChecked => &mut self.auth_checked,
            ReadinessFlag::DataLayerReady => &mut self.data_layer_ready,
            ReadinessFlag::NavigationReady => &mut self.navigation_ready,
        }
    }
}

/// A partial update: `None` leaves a flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessUpdate {
    pub resources_loaded: Option<bool>,
    pub auth_checked: Option<bool>,
    pub data_layer_ready: Option<bool>,
    pub navigation_ready: Option<bool>,
}

impl ReadinessUpdate {
    /// An update that sets exactly one flag to true.
    pub fn set(flag: ReadinessFlag) -> Self {
        let mut update = Self::default();
        match flag {
            ReadinessFlag::ResourcesLoaded => update.resources_loaded = Some(true),
            ReadinessFlag::AuthChecked => update.auth_checked = Some(true),
            ReadinessFlag::DataLayerReady => update.data_layer_ready = Some(true),
            ReadinessFlag::NavigationReady => update.navigation_ready = Some(true),
        }
        update
    }

    /// An update that sets every flag to true.
    pub fn all() -> Self {
        Self {
            resources_loaded: Some(true),
            auth_checked: Some(true),
            data_layer_ready: Some(true),
            navigation_ready: Some(true),
        }
    }

    fn entries(&self) -> [(ReadinessFlag, Option<bool>); 4] {
        [
            (ReadinessFlag::ResourcesLoaded, self.resources_loaded),
            (ReadinessFlag::AuthChecked, self.auth_checked),
            (ReadinessFlag::DataLayerReady, self.data_layer_ready),
            (ReadinessFlag::NavigationReady, self.navigation_ready),
        ]
    }
}

/// Tracks start-up readiness for one coordinator lifetime.
///
/// Updates are merged monotonically: setting a flag to `false` after it has
/// become `true` is silently ignored, so `is_ready()` never regresses and the
/// final answer does not depend on the order in which signals arrive.
#[derive(Debug, Clone, Default)]
pub struct ReadinessTracker {
    state: ReadinessState,
}

impl ReadinessTracker {
    /// Create a tracker with every flag unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update.
    ///
    /// Returns the flags that flipped from false to true.
    pub fn update(&mut self, update: ReadinessUpdate) -> Vec<ReadinessFlag> {
        let mut raised = Vec::new();
        for (flag, value) in update.entries() {
            if value != Some(true) {
                continue;
            }
            let slot = self.state.slot(flag);
            if !*slot {
                *slot = true;
                raised.push(flag);
            }
        }
        raised
    }

    /// True iff all four flags are set.
    pub fn is_ready(&self) -> bool {
        ReadinessFlag::ALL.iter().all(|flag| self.state.get(*flag))
    }

    /// True iff resources are loaded and the auth check has completed.
    ///
    /// This is the least the router needs to make a safe forced decision
    /// once the timeout guard fires.
    pub fn is_minimally_ready(&self) -> bool {
        self.state.resources_loaded && self.state.auth_checked
    }

    /// Current flag snapshot.
    pub fn state(&self) -> ReadinessState {
        self.state
    }

    /// Flags still outstanding, in declaration order.
    pub fn missing(&self) -> Vec<ReadinessFlag> {
        ReadinessFlag::ALL
            .into_iter()
            .filter(|flag| !self.state.get(*flag))
            .collect()
    }
}
