pub mod app;
pub mod config;
pub mod error;
pub mod import_export;
pub mod installer;
pub mod models;
pub mod notification;
pub mod pause;
pub mod rules;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use app::{App, ImportSource};
pub use config::{get_config_path, get_data_dir, Config};
pub use error::{ImportError, StorageError, StoreError};
pub use import_export::{
    export_profiles, parse_extension_export, parse_profiles, read_json_file,
};
pub use installer::{JsonRulesInstaller, OverrideInstaller, RulesDocument};
pub use models::{
    generate_profile_id, HeaderOverride, ModalState, PauseFlag, ProfileActionsTab,
    RequestProfile, UrlFilter,
};
pub use notification::{NotificationInfo, NotificationVariant};
pub use pause::{load_is_paused, save_is_paused_to_browser};
pub use rules::{apply_rules, compile_rules, url_filter_matches, HeaderOperation, OverrideRule};
pub use storage::{
    FileStorage, LocalStorage, MemoryStorage, IS_PAUSED_KEY, PROFILES_KEY, SELECTED_PROFILE_KEY,
};
pub use store::{AppState, Effect, Event, Store, SubscriptionId};
