use std::collections::HashSet;

use crate::error::StoreError;
use crate::models::{
    generate_profile_id, ModalState, PauseFlag, ProfileActionsTab, RequestProfile,
};
use crate::notification::NotificationInfo;

use super::events::{Effect, Event};

/// Effects for any change to the profile collection
const PROFILES_CHANGED: [Effect; 2] = [Effect::PersistProfiles, Effect::InstallOverrides];

/// The complete UI state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Ordered profile collection
    pub profiles: Vec<RequestProfile>,
    /// Weak reference into `profiles`; may dangle
    pub selected_profile_id: Option<String>,
    pub is_paused: PauseFlag,
    pub active_profile_actions_tab: ProfileActionsTab,
    pub modals: ModalState,
    pub notification: Option<NotificationInfo>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered ids of the profile collection
    pub fn profiles_name(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.id.clone()).collect()
    }

    pub fn profile(&self, id: &str) -> Option<&RequestProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// The selected profile, or `None` if nothing is selected or the id dangles
    pub fn selected_profile(&self) -> Option<&RequestProfile> {
        self.selected_profile_id
            .as_deref()
            .and_then(|id| self.profile(id))
    }

    /// Looks up a profile by id, falling back to a case-insensitive name match
    pub fn find_profile(&self, id_or_name: &str) -> Option<&RequestProfile> {
        self.profile(id_or_name).or_else(|| {
            self.profiles
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(id_or_name))
        })
    }

    pub fn notification_message(&self) -> Option<&str> {
        self.notification.as_ref().map(|n| n.message.as_str())
    }

    fn profile_mut(&mut self, id: &str) -> Result<&mut RequestProfile, StoreError> {
        self.profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::ProfileNotFound(id.to_string()))
    }

    fn select(&mut self, id: Option<String>) {
        self.selected_profile_id = id;
        self.active_profile_actions_tab = ProfileActionsTab::Headers;
    }

    /// Gives a profile a fresh id if its id is empty or already taken
    fn ensure_unique_id(&self, profile: &mut RequestProfile, taken: &mut HashSet<String>) {
        if profile.id.is_empty()
            || taken.contains(&profile.id)
            || self.profile(&profile.id).is_some()
        {
            profile.id = generate_profile_id();
        }
        taken.insert(profile.id.clone());
    }

    /// Applies `event`, returning the side effects it requires
    ///
    /// On error the state is left unchanged.
    pub fn reduce(&mut self, event: Event) -> Result<Vec<Effect>, StoreError> {
        let effects = match event {
            Event::StateHydrated {
                profiles,
                selected_profile_id,
                is_paused,
            } => {
                self.profiles = profiles;
                self.selected_profile_id = selected_profile_id;
                self.is_paused = is_paused;
                Vec::new()
            }

            Event::ProfileCreated(mut profile) => {
                self.ensure_unique_id(&mut profile, &mut HashSet::new());
                let id = profile.id.clone();
                self.profiles.push(profile);
                self.select(Some(id));
                vec![
                    Effect::PersistProfiles,
                    Effect::PersistSelectedProfile,
                    Effect::InstallOverrides,
                ]
            }

            Event::ProfileUpdated(profile) => {
                let existing = self.profile_mut(&profile.id)?;
                *existing = profile;
                PROFILES_CHANGED.to_vec()
            }

            Event::ProfileRenamed { id, name } => {
                self.profile_mut(&id)?.name = name;
                PROFILES_CHANGED.to_vec()
            }

            Event::ProfileEnabledChanged { id, enabled } => {
                self.profile_mut(&id)?.enabled = enabled;
                PROFILES_CHANGED.to_vec()
            }

            Event::ProfileRemoved(id) => {
                let index = self
                    .profiles
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| StoreError::ProfileNotFound(id.clone()))?;
                self.profiles.remove(index);

                let mut effects = vec![Effect::PersistProfiles];
                if self.selected_profile_id.as_deref() == Some(id.as_str()) {
                    let next = self.profiles.first().map(|p| p.id.clone());
                    self.select(next);
                    effects.push(Effect::PersistSelectedProfile);
                }
                effects.push(Effect::InstallOverrides);
                effects
            }

            Event::ProfileMoved { id, to } => {
                let len = self.profiles.len();
                if to >= len {
                    return Err(StoreError::InvalidMove { to, len });
                }
                let from = self
                    .profiles
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| StoreError::ProfileNotFound(id.clone()))?;
                let profile = self.profiles.remove(from);
                self.profiles.insert(to, profile);
                PROFILES_CHANGED.to_vec()
            }

            Event::ProfilesImported(imported) => {
                let mut taken = HashSet::new();
                for mut profile in imported {
                    self.ensure_unique_id(&mut profile, &mut taken);
                    self.profiles.push(profile);
                }
                PROFILES_CHANGED.to_vec()
            }

            Event::HeaderAdded { profile_id, header } => {
                self.profile_mut(&profile_id)?.headers.push(header);
                PROFILES_CHANGED.to_vec()
            }

            Event::HeaderUpdated {
                profile_id,
                index,
                header,
            } => {
                let profile = self.profile_mut(&profile_id)?;
                let slot = profile
                    .headers
                    .get_mut(index)
                    .ok_or(StoreError::HeaderNotFound {
                        profile: profile_id.clone(),
                        index,
                    })?;
                *slot = header;
                PROFILES_CHANGED.to_vec()
            }

            Event::HeaderRemoved { profile_id, index } => {
                let profile = self.profile_mut(&profile_id)?;
                if index >= profile.headers.len() {
                    return Err(StoreError::HeaderNotFound {
                        profile: profile_id,
                        index,
                    });
                }
                profile.headers.remove(index);
                PROFILES_CHANGED.to_vec()
            }

            Event::HeaderEnabledChanged {
                profile_id,
                index,
                enabled,
            } => {
                let profile = self.profile_mut(&profile_id)?;
                let header = profile
                    .headers
                    .get_mut(index)
                    .ok_or(StoreError::HeaderNotFound {
                        profile: profile_id.clone(),
                        index,
                    })?;
                header.enabled = enabled;
                PROFILES_CHANGED.to_vec()
            }

            Event::UrlFilterAdded { profile_id, filter } => {
                self.profile_mut(&profile_id)?.url_filters.push(filter);
                PROFILES_CHANGED.to_vec()
            }

            Event::UrlFilterRemoved { profile_id, index } => {
                let profile = self.profile_mut(&profile_id)?;
                if index >= profile.url_filters.len() {
                    return Err(StoreError::UrlFilterNotFound {
                        profile: profile_id,
                        index,
                    });
                }
                profile.url_filters.remove(index);
                PROFILES_CHANGED.to_vec()
            }

            Event::UrlFilterEnabledChanged {
                profile_id,
                index,
                enabled,
            } => {
                let profile = self.profile_mut(&profile_id)?;
                let filter =
                    profile
                        .url_filters
                        .get_mut(index)
                        .ok_or(StoreError::UrlFilterNotFound {
                            profile: profile_id.clone(),
                            index,
                        })?;
                filter.enabled = enabled;
                PROFILES_CHANGED.to_vec()
            }

            Event::SelectedRequestProfileIdChanged(id) => {
                self.select(Some(id));
                vec![Effect::PersistSelectedProfile]
            }

            Event::ActiveProfileActionsTabChanged(tab) => {
                self.active_profile_actions_tab = tab;
                Vec::new()
            }

            Event::ToggleIsPaused => {
                self.is_paused = self.is_paused.toggled();
                vec![Effect::SaveIsPaused(self.is_paused.is_paused())]
            }

            Event::ExportModalOpened => self.set_modal(|m| m.export_open = true),
            Event::ExportModalClosed => self.set_modal(|m| m.export_open = false),
            Event::ImportModalOpened => self.set_modal(|m| m.import_open = true),
            Event::ImportModalClosed => self.set_modal(|m| m.import_open = false),
            Event::ImportFromExtensionModalOpened => {
                self.set_modal(|m| m.import_from_extension_open = true)
            }
            Event::ImportFromExtensionModalClosed => {
                self.set_modal(|m| m.import_from_extension_open = false)
            }

            Event::NotificationAdded(info) => {
                self.notification = Some(info);
                Vec::new()
            }

            Event::NotificationCleared => {
                self.notification = None;
                Vec::new()
            }
        };

        Ok(effects)
    }

    fn set_modal<F: FnOnce(&mut ModalState)>(&mut self, update: F) -> Vec<Effect> {
        update(&mut self.modals);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeaderOverride, UrlFilter};
    use crate::notification::NotificationVariant;

    fn state_with(ids: &[&str]) -> AppState {
        let mut state = AppState::new();
        state.profiles = ids
            .iter()
            .map(|id| RequestProfile::with_id(*id, id.to_uppercase()))
            .collect();
        state
    }

    #[test]
    fn test_toggle_parity() {
        for toggles in 0..6 {
            let mut state = AppState::new();
            for _ in 0..toggles {
                state.reduce(Event::ToggleIsPaused).unwrap();
            }
            let expected = if toggles % 2 == 0 {
                PauseFlag::Active
            } else {
                PauseFlag::Paused
            };
            assert_eq!(state.is_paused, expected, "after {} toggles", toggles);
        }
    }

    #[test]
    fn test_toggle_requests_save() {
        let mut state = AppState::new();
        let effects = state.reduce(Event::ToggleIsPaused).unwrap();
        assert_eq!(effects, vec![Effect::SaveIsPaused(true)]);
        let effects = state.reduce(Event::ToggleIsPaused).unwrap();
        assert_eq!(effects, vec![Effect::SaveIsPaused(false)]);
    }

    #[test]
    fn test_selection_resets_tab() {
        let mut state = state_with(&["a", "b"]);
        state
            .reduce(Event::ActiveProfileActionsTabChanged(ProfileActionsTab::UrlFilters))
            .unwrap();

        state
            .reduce(Event::SelectedRequestProfileIdChanged("b".to_string()))
            .unwrap();
        assert_eq!(state.active_profile_actions_tab, ProfileActionsTab::Headers);
        assert_eq!(state.selected_profile().map(|p| p.id.as_str()), Some("b"));
    }

    #[test]
    fn test_selecting_unknown_id_dangles() {
        let mut state = state_with(&["a"]);
        state
            .reduce(Event::SelectedRequestProfileIdChanged("missing".to_string()))
            .unwrap();
        assert_eq!(state.selected_profile_id.as_deref(), Some("missing"));
        assert!(state.selected_profile().is_none());
    }

    #[test]
    fn test_profiles_name_follows_collection() {
        let mut state = state_with(&["a", "b"]);
        assert_eq!(state.profiles_name(), vec!["a", "b"]);

        state
            .reduce(Event::ProfileCreated(RequestProfile::with_id("c", "C")))
            .unwrap();
        assert_eq!(state.profiles_name(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_create_selects_and_reassigns_duplicate_id() {
        let mut state = state_with(&["a"]);
        let effects = state
            .reduce(Event::ProfileCreated(RequestProfile::with_id("a", "Copy")))
            .unwrap();

        assert_eq!(state.profiles.len(), 2);
        let new_id = state.profiles[1].id.clone();
        assert_ne!(new_id, "a");
        assert_eq!(state.selected_profile_id.as_deref(), Some(new_id.as_str()));
        assert!(effects.contains(&Effect::PersistSelectedProfile));
    }

    #[test]
    fn test_remove_selected_moves_selection() {
        let mut state = state_with(&["a", "b", "c"]);
        state.selected_profile_id = Some("b".to_string());

        let effects = state.reduce(Event::ProfileRemoved("b".to_string())).unwrap();
        assert_eq!(state.profiles_name(), vec!["a", "c"]);
        assert_eq!(state.selected_profile_id.as_deref(), Some("a"));
        assert_eq!(
            effects,
            vec![
                Effect::PersistProfiles,
                Effect::PersistSelectedProfile,
                Effect::InstallOverrides
            ]
        );
    }

    #[test]
    fn test_remove_last_clears_selection() {
        let mut state = state_with(&["a"]);
        state.selected_profile_id = Some("a".to_string());
        state.reduce(Event::ProfileRemoved("a".to_string())).unwrap();
        assert!(state.selected_profile_id.is_none());
    }

    #[test]
    fn test_remove_unknown_profile_fails_without_change() {
        let mut state = state_with(&["a"]);
        let err = state
            .reduce(Event::ProfileRemoved("zzz".to_string()))
            .unwrap_err();
        assert_eq!(err, StoreError::ProfileNotFound("zzz".to_string()));
        assert_eq!(state.profiles_name(), vec!["a"]);
    }

    #[test]
    fn test_move_profile() {
        let mut state = state_with(&["a", "b", "c"]);
        state
            .reduce(Event::ProfileMoved {
                id: "c".to_string(),
                to: 0,
            })
            .unwrap();
        assert_eq!(state.profiles_name(), vec!["c", "a", "b"]);

        let err = state
            .reduce(Event::ProfileMoved {
                id: "a".to_string(),
                to: 3,
            })
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidMove { to: 3, len: 3 });
    }

    #[test]
    fn test_header_edits() {
        let mut state = state_with(&["a"]);
        state
            .reduce(Event::HeaderAdded {
                profile_id: "a".to_string(),
                header: HeaderOverride::new("X-One", "1"),
            })
            .unwrap();
        state
            .reduce(Event::HeaderEnabledChanged {
                profile_id: "a".to_string(),
                index: 0,
                enabled: false,
            })
            .unwrap();
        assert!(!state.profiles[0].headers[0].enabled);

        let err = state
            .reduce(Event::HeaderRemoved {
                profile_id: "a".to_string(),
                index: 5,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::HeaderNotFound { index: 5, .. }));

        state
            .reduce(Event::HeaderRemoved {
                profile_id: "a".to_string(),
                index: 0,
            })
            .unwrap();
        assert!(state.profiles[0].headers.is_empty());
    }

    #[test]
    fn test_profile_and_header_updates_replace_in_place() {
        let mut state = state_with(&["a", "b"]);
        let mut updated = RequestProfile::with_id("b", "Renamed");
        updated.enabled = false;
        state.reduce(Event::ProfileUpdated(updated.clone())).unwrap();
        assert_eq!(state.profiles[1], updated);

        state.profiles[0].headers.push(HeaderOverride::new("X-Old", "1"));
        state
            .reduce(Event::HeaderUpdated {
                profile_id: "a".to_string(),
                index: 0,
                header: HeaderOverride::new("X-New", "2"),
            })
            .unwrap();
        assert_eq!(state.profiles[0].headers, vec![HeaderOverride::new("X-New", "2")]);

        let err = state
            .reduce(Event::ProfileUpdated(RequestProfile::with_id("zzz", "Ghost")))
            .unwrap_err();
        assert_eq!(err, StoreError::ProfileNotFound("zzz".to_string()));
    }

    #[test]
    fn test_url_filter_edits() {
        let mut state = state_with(&["a"]);
        state
            .reduce(Event::UrlFilterAdded {
                profile_id: "a".to_string(),
                filter: UrlFilter::new("||example.com"),
            })
            .unwrap();
        state
            .reduce(Event::UrlFilterEnabledChanged {
                profile_id: "a".to_string(),
                index: 0,
                enabled: false,
            })
            .unwrap();
        assert!(!state.profiles[0].url_filters[0].enabled);

        let err = state
            .reduce(Event::UrlFilterRemoved {
                profile_id: "a".to_string(),
                index: 1,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::UrlFilterNotFound { index: 1, .. }));

        state
            .reduce(Event::UrlFilterRemoved {
                profile_id: "a".to_string(),
                index: 0,
            })
            .unwrap();
        assert!(state.profiles[0].url_filters.is_empty());
    }

    #[test]
    fn test_rename_persists_and_installs() {
        let mut state = state_with(&["a"]);
        let effects = state
            .reduce(Event::ProfileRenamed {
                id: "a".to_string(),
                name: "Alpha".to_string(),
            })
            .unwrap();
        assert_eq!(effects, PROFILES_CHANGED.to_vec());
        assert_eq!(state.find_profile("alpha").map(|p| p.id.as_str()), Some("a"));
    }

    #[test]
    fn test_hydration_has_no_effects() {
        let mut state = AppState::new();
        let effects = state
            .reduce(Event::StateHydrated {
                profiles: vec![RequestProfile::with_id("a", "A")],
                selected_profile_id: Some("a".to_string()),
                is_paused: PauseFlag::Paused,
            })
            .unwrap();
        assert!(effects.is_empty());
        assert_eq!(state.is_paused, PauseFlag::Paused);
        assert_eq!(state.selected_profile().map(|p| p.name.as_str()), Some("A"));
    }

    #[test]
    fn test_modals_are_independent() {
        let mut state = AppState::new();
        state.reduce(Event::ExportModalOpened).unwrap();
        state.reduce(Event::ImportModalOpened).unwrap();
        assert!(state.modals.export_open);
        assert!(state.modals.import_open);
        assert!(!state.modals.import_from_extension_open);

        state.reduce(Event::ExportModalClosed).unwrap();
        assert!(!state.modals.export_open);
        assert!(state.modals.import_open);
    }

    #[test]
    fn test_notification_added_then_cleared() {
        let mut state = AppState::new();
        state
            .reduce(Event::NotificationAdded(NotificationInfo::new(
                "x",
                NotificationVariant::Default,
            )))
            .unwrap();
        assert_eq!(state.notification_message(), Some("x"));

        state.reduce(Event::NotificationCleared).unwrap();
        assert!(state.notification.is_none());
    }

    #[test]
    fn test_import_assigns_fresh_ids_on_collision() {
        let mut state = state_with(&["a"]);
        let imported = vec![
            RequestProfile::with_id("a", "Clash"),
            RequestProfile::with_id("", "NoId"),
            RequestProfile::with_id("z", "Fresh"),
            RequestProfile::with_id("z", "Twin"),
        ];
        state.reduce(Event::ProfilesImported(imported)).unwrap();

        let ids = state.profiles_name();
        assert_eq!(ids.len(), 5);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(ids[3], "z");
    }
}
