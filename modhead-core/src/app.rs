//! Application runtime
//!
//! [`App`] is the composition root: it owns the store, the local storage and
//! the override installer, and executes the effects the reducer asks for.
//! Effects run in order and stop at the first failure, so the installer never
//! sees state whose persistence failed.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

use crate::error::ImportError;
use crate::import_export::{export_profiles, parse_extension_export, parse_profiles, read_json_file};
use crate::installer::OverrideInstaller;
use crate::models::RequestProfile;
use crate::notification::{NotificationInfo, NotificationVariant};
use crate::pause::{load_is_paused, save_is_paused_to_browser};
use crate::rules::{compile_rules, OverrideRule};
use crate::storage::{read_key, write_key, LocalStorage, PROFILES_KEY, SELECTED_PROFILE_KEY};
use crate::store::{AppState, Effect, Event, Store};

/// Source format of a profile import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    /// Profiles exported by this application
    Profiles,
    /// Profiles exported by the third-party header extension
    Extension,
}

pub struct App {
    store: Store,
    storage: Box<dyn LocalStorage>,
    installer: Box<dyn OverrideInstaller>,
}

impl App {
    /// Hydrates the store from local storage and installs the current rules
    pub fn bootstrap(
        storage: Box<dyn LocalStorage>,
        installer: Box<dyn OverrideInstaller>,
    ) -> Result<Self> {
        let is_paused = load_is_paused(storage.as_ref()).context("Failed to read pause flag")?;
        let profiles: Vec<RequestProfile> = read_key(storage.as_ref(), PROFILES_KEY)
            .context("Failed to read profiles")?
            .unwrap_or_default();
        let selected_profile_id: Option<String> = read_key(storage.as_ref(), SELECTED_PROFILE_KEY)
            .context("Failed to read selected profile")?;

        log::debug!(
            "bootstrap: {} profiles, selected {:?}, {}",
            profiles.len(),
            selected_profile_id,
            is_paused
        );

        let mut app = Self {
            store: Store::default(),
            storage,
            installer,
        };
        app.store.dispatch(Event::StateHydrated {
            profiles,
            selected_profile_id,
            is_paused,
        })?;
        app.install_overrides()?;
        Ok(app)
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    /// Dispatches an event and executes the effects it produces
    pub fn dispatch(&mut self, event: Event) -> Result<()> {
        let effects = self.store.dispatch(event)?;
        for effect in effects {
            self.run_effect(effect)?;
        }
        Ok(())
    }

    /// Rules for the current state
    pub fn rules(&self) -> Vec<OverrideRule> {
        let state = self.store.state();
        compile_rules(&state.profiles, state.is_paused)
    }

    /// Posts a notification
    pub fn notify(
        &mut self,
        message: impl Into<String>,
        variant: NotificationVariant,
    ) -> Result<()> {
        self.dispatch(Event::NotificationAdded(NotificationInfo::new(message, variant)))
    }

    /// Serializes every profile for export
    pub fn export_json(&self) -> Result<String> {
        export_profiles(&self.store.state().profiles).context("Failed to serialize profiles")
    }

    /// Imports profiles from a file, reporting the outcome as a notification
    pub fn import_file(&mut self, path: &Path, source: ImportSource) -> Result<usize> {
        let parsed = File::open(path)
            .map_err(ImportError::from)
            .and_then(read_json_file)
            .and_then(|content| match source {
                ImportSource::Profiles => parse_profiles(&content),
                ImportSource::Extension => parse_extension_export(&content),
            });

        match parsed {
            Ok(profiles) => {
                let count = profiles.len();
                self.dispatch(Event::ProfilesImported(profiles))?;
                self.notify(
                    format!("Imported {} profile(s)", count),
                    NotificationVariant::ImportProfileSuccess,
                )?;
                Ok(count)
            }
            Err(e) => {
                log::warn!("Import from {:?} failed: {}", path, e);
                self.notify(e.to_string(), NotificationVariant::ImportProfileError)?;
                Err(e).with_context(|| format!("Failed to import profiles from {:?}", path))
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) -> Result<()> {
        match effect {
            Effect::PersistProfiles => {
                write_key(self.storage.as_ref(), PROFILES_KEY, &self.store.state().profiles)
                    .context("Failed to save profiles")
            }
            Effect::PersistSelectedProfile => write_key(
                self.storage.as_ref(),
                SELECTED_PROFILE_KEY,
                &self.store.state().selected_profile_id,
            )
            .context("Failed to save selected profile"),
            Effect::SaveIsPaused(is_paused) => {
                let rules = self.rules();
                let installer = &mut self.installer;
                save_is_paused_to_browser(self.storage.as_ref(), is_paused, || {
                    installer.install(&rules)
                })
            }
            Effect::InstallOverrides => self.install_overrides(),
        }
    }

    fn install_overrides(&mut self) -> Result<()> {
        let rules = self.rules();
        self.installer
            .install(&rules)
            .context("Failed to install header overrides")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeaderOverride, PauseFlag, ProfileActionsTab};
    use crate::storage::{MemoryStorage, IS_PAUSED_KEY};
    use serde_json::json;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records every install together with the pause flag stored at that moment
    struct RecordingInstaller {
        storage: Arc<MemoryStorage>,
        installs: Installs,
    }

    impl OverrideInstaller for RecordingInstaller {
        fn install(&mut self, rules: &[OverrideRule]) -> Result<()> {
            let stored = self.storage.get(IS_PAUSED_KEY)?;
            self.installs.lock().unwrap().push((rules.len(), stored));
            Ok(())
        }
    }

    type Installs = Arc<Mutex<Vec<(usize, Option<serde_json::Value>)>>>;

    fn test_app(storage: Arc<MemoryStorage>) -> (App, Installs) {
        let installs = Arc::new(Mutex::new(Vec::new()));
        let installer = RecordingInstaller {
            storage: Arc::clone(&storage),
            installs: Arc::clone(&installs),
        };
        let app = App::bootstrap(Box::new(storage), Box::new(installer)).unwrap();
        (app, installs)
    }

    fn app_with_header() -> (App, Arc<MemoryStorage>, Installs) {
        let storage = Arc::new(MemoryStorage::new());
        let (mut app, installs) = test_app(Arc::clone(&storage));
        let profile = RequestProfile::with_id("p1", "Dev");
        app.dispatch(Event::ProfileCreated(profile)).unwrap();
        app.dispatch(Event::HeaderAdded {
            profile_id: "p1".to_string(),
            header: HeaderOverride::new("X-Env", "dev"),
        })
        .unwrap();
        installs.lock().unwrap().clear();
        (app, storage, installs)
    }

    #[test]
    fn test_bootstrap_defaults_and_installs() {
        let storage = Arc::new(MemoryStorage::new());
        let (app, installs) = test_app(storage);

        assert_eq!(app.state().is_paused, PauseFlag::Active);
        assert!(app.state().profiles.is_empty());
        assert_eq!(installs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_bootstrap_reads_persisted_state() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(IS_PAUSED_KEY, json!(true)).unwrap();
        storage
            .set(PROFILES_KEY, json!([{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]))
            .unwrap();
        storage.set(SELECTED_PROFILE_KEY, json!("b")).unwrap();

        let (app, _) = test_app(storage);
        assert_eq!(app.state().is_paused, PauseFlag::Paused);
        assert_eq!(app.state().profiles_name(), vec!["a", "b"]);
        assert_eq!(app.state().selected_profile().map(|p| p.name.as_str()), Some("B"));
    }

    #[test]
    fn test_toggle_persists_before_install() {
        let (mut app, storage, installs) = app_with_header();

        app.dispatch(Event::ToggleIsPaused).unwrap();

        assert_eq!(storage.get(IS_PAUSED_KEY).unwrap(), Some(json!(true)));
        let installs = installs.lock().unwrap();
        assert_eq!(installs.len(), 1);
        // Paused: no rules, and the flag was already stored when installing
        assert_eq!(installs[0], (0, Some(json!(true))));
    }

    #[test]
    fn test_failed_pause_write_skips_install() {
        let (mut app, storage, installs) = app_with_header();
        storage.set_fail_writes(true);

        assert!(app.dispatch(Event::ToggleIsPaused).is_err());
        assert!(installs.lock().unwrap().is_empty());
        // In-memory state keeps the toggle
        assert_eq!(app.state().is_paused, PauseFlag::Paused);
    }

    #[test]
    fn test_profile_changes_persist_and_install() {
        let (mut app, storage, installs) = app_with_header();

        app.dispatch(Event::HeaderAdded {
            profile_id: "p1".to_string(),
            header: HeaderOverride::new("X-Two", "2"),
        })
        .unwrap();

        let stored: Vec<RequestProfile> = read_key(&*storage, PROFILES_KEY).unwrap().unwrap();
        assert_eq!(stored[0].headers.len(), 2);
        assert_eq!(installs.lock().unwrap().last().map(|i| i.0), Some(2));
    }

    #[test]
    fn test_selection_persists_and_resets_tab() {
        let (mut app, storage, _) = app_with_header();
        app.dispatch(Event::ActiveProfileActionsTabChanged(ProfileActionsTab::UrlFilters))
            .unwrap();

        app.dispatch(Event::SelectedRequestProfileIdChanged("other".to_string()))
            .unwrap();

        assert_eq!(app.state().active_profile_actions_tab, ProfileActionsTab::Headers);
        assert_eq!(storage.get(SELECTED_PROFILE_KEY).unwrap(), Some(json!("other")));
    }

    #[test]
    fn test_import_file_success_and_failure() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(MemoryStorage::new());
        let (mut app, _) = test_app(storage);

        let good = temp_dir.path().join("profiles.json");
        fs::write(&good, r#"[{"id": "x", "name": "Imported"}]"#).unwrap();
        assert_eq!(app.import_file(&good, ImportSource::Profiles).unwrap(), 1);
        assert_eq!(
            app.state().notification.as_ref().map(|n| n.variant),
            Some(NotificationVariant::ImportProfileSuccess)
        );

        let bad = temp_dir.path().join("bad.json");
        fs::write(&bad, [0xffu8, 0xfe, 0x00]).unwrap();
        assert!(app.import_file(&bad, ImportSource::Profiles).is_err());
        let notification = app.state().notification.clone().unwrap();
        assert_eq!(notification.variant, NotificationVariant::ImportProfileError);
        assert_eq!(notification.message, "File content is not text");
        assert_eq!(app.state().profiles.len(), 1);
    }

    #[test]
    fn test_export_json_roundtrips_through_import() {
        let (app, _, _) = app_with_header();
        let json = app.export_json().unwrap();
        let profiles = parse_profiles(&json).unwrap();
        assert_eq!(profiles, app.state().profiles);
    }
}
