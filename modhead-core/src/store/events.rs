use crate::models::{HeaderOverride, PauseFlag, ProfileActionsTab, RequestProfile, UrlFilter};
use crate::notification::NotificationInfo;

/// Everything that can change the application state
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Persisted state read at startup; replaces the store contents without side effects
    StateHydrated {
        profiles: Vec<RequestProfile>,
        selected_profile_id: Option<String>,
        is_paused: PauseFlag,
    },

    // Profile collection
    ProfileCreated(RequestProfile),
    ProfileUpdated(RequestProfile),
    ProfileRenamed { id: String, name: String },
    ProfileEnabledChanged { id: String, enabled: bool },
    ProfileRemoved(String),
    /// Drag-handle reorder: move the profile to position `to`
    ProfileMoved { id: String, to: usize },
    ProfilesImported(Vec<RequestProfile>),

    // Header overrides of one profile
    HeaderAdded { profile_id: String, header: HeaderOverride },
    HeaderUpdated { profile_id: String, index: usize, header: HeaderOverride },
    HeaderRemoved { profile_id: String, index: usize },
    HeaderEnabledChanged { profile_id: String, index: usize, enabled: bool },

    // URL filters of one profile
    UrlFilterAdded { profile_id: String, filter: UrlFilter },
    UrlFilterRemoved { profile_id: String, index: usize },
    UrlFilterEnabledChanged { profile_id: String, index: usize, enabled: bool },

    // Selection
    SelectedRequestProfileIdChanged(String),
    ActiveProfileActionsTabChanged(ProfileActionsTab),

    // Pause flag
    ToggleIsPaused,

    // Modals
    ExportModalOpened,
    ExportModalClosed,
    ImportModalOpened,
    ImportModalClosed,
    ImportFromExtensionModalOpened,
    ImportFromExtensionModalClosed,

    // Notifications
    NotificationAdded(NotificationInfo),
    NotificationCleared,
}

/// Side effects requested by the reducer, executed in order by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Write the profile collection to local storage
    PersistProfiles,
    /// Write the selected profile id to local storage
    PersistSelectedProfile,
    /// Write the pause flag, then reinstall overrides once the write succeeded
    SaveIsPaused(bool),
    /// Hand the current rule set to the override installer
    InstallOverrides,
}
