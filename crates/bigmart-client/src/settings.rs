//! # Location Settings
//!
//! Which store location the signed-in user is working at.
//!
//! ## Selection Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     select(location_id)                                 │
//! │                                                                         │
//! │  empty id ──────────────────────────────► Err(Required)                 │
//! │                                                                         │
//! │  selected = location_id (always)                                        │
//! │       │                                                                 │
//! │       ├── signed in ──► set user_locations/{uid} = {locationId}         │
//! │       │                        └──► SelectionOutcome::Saved             │
//! │       │                                                                 │
//! │       └── signed out ─────────────► SelectionOutcome::NotSignedIn       │
//! │                                     (nothing written)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The saved preference is a whole-node overwrite: one preference per
//! identity, last write wins.

use std::sync::Arc;

use bigmart_core::rows::Row;
use bigmart_core::{user_location_path, Entity, Location, UserLocationPreference};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::Identity;
use crate::error::{ClientResult, StoreResult};
use crate::live::LiveTable;
use crate::store::{RemoteStore, Subscription};

/// Result of a location selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Written to the identity's preference.
    Saved { identity: Identity },
    /// Kept locally only; no identity is signed in.
    NotSignedIn,
}

/// State behind the settings screen.
pub struct LocationSettings {
    store: Arc<dyn RemoteStore>,
    locations: LiveTable,
    identity: Option<Identity>,
    preference: Option<Subscription>,
    selected: Option<String>,
}

impl std::fmt::Debug for LocationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationSettings")
            .field("identity", &self.identity)
            .field("selected", &self.selected)
            .field("locations", &self.locations.rows().len())
            .finish()
    }
}

impl LocationSettings {
    /// Follows the locations collection and, when signed in, the identity's
    /// stored preference.
    pub async fn open(
        store: Arc<dyn RemoteStore>,
        identity: Option<Identity>,
    ) -> ClientResult<Self> {
        let subscription = store.subscribe(Location::COLLECTION.path()).await?;
        let mut settings = LocationSettings {
            store,
            locations: LiveTable::new(subscription, Location::table_spec()),
            identity: None,
            preference: None,
            selected: None,
        };
        settings.set_identity(identity).await?;
        Ok(settings)
    }

    /// Switches to another identity (or none) after sign-in or sign-out.
    ///
    /// The local selection is replaced by the new identity's stored
    /// preference, or cleared when there is none.
    pub async fn set_identity(&mut self, identity: Option<Identity>) -> ClientResult<()> {
        if let Some(old) = self.preference.take() {
            old.cancel();
        }
        self.selected = None;

        if let Some(ref id) = identity {
            let mut sub = self.store.subscribe(&user_location_path(&id.uid)).await?;
            self.selected = stored_location(sub.current());
            debug!(uid = %id.uid, selected = ?self.selected, "Loaded location preference");
            self.preference = Some(sub);
        }

        self.identity = identity;
        Ok(())
    }

    /// Selects a location. See the module docs for what gets written.
    ///
    /// ## Errors
    /// - `Required` for an empty id (nothing changes)
    /// - Store failures while saving; the local selection is kept
    pub async fn select(&mut self, location_id: &str) -> ClientResult<SelectionOutcome> {
        bigmart_core::validation::validate_required("locationId", location_id)?;
        self.selected = Some(location_id.to_string());

        let Some(identity) = self.identity.clone() else {
            info!(location_id, "Location selected while signed out; not saved");
            return Ok(SelectionOutcome::NotSignedIn);
        };

        let preference = UserLocationPreference {
            location_id: location_id.to_string(),
        };
        let path = user_location_path(&identity.uid);
        if let Err(e) = self.store.set(&path, serde_json::to_value(&preference)?).await {
            warn!(uid = %identity.uid, error = %e, "Failed to save location preference");
            return Err(e.into());
        }

        info!(uid = %identity.uid, location_id, "Location preference saved");
        Ok(SelectionOutcome::Saved { identity })
    }

    /// Applies pending location and preference changes without waiting.
    ///
    /// A stored preference replaces the local selection; a removed one does
    /// not clear it.
    pub fn refresh(&mut self) -> StoreResult<bool> {
        let mut changed = self.locations.refresh()?;

        if let Some(sub) = self.preference.as_mut() {
            if sub.has_changed()? {
                // A deleted preference leaves the local selection alone.
                if let Some(location_id) = stored_location(sub.current()) {
                    self.selected = Some(location_id);
                }
                changed = true;
            }
        }

        Ok(changed)
    }

    /// The selected location key, if any.
    pub fn current_selection(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected location's row, if it still exists.
    pub fn selected_location(&self) -> Option<&Row> {
        let selected = self.selected.as_deref()?;
        self.locations.rows().iter().find(|row| row.id == selected)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn locations(&self) -> &LiveTable {
        &self.locations
    }

    pub fn locations_mut(&mut self) -> &mut LiveTable {
        &mut self.locations
    }
}

fn stored_location(value: Option<Value>) -> Option<String> {
    let value = value?;
    match serde_json::from_value::<UserLocationPreference>(value) {
        Ok(pref) if !pref.location_id.is_empty() => Some(pref.location_id),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed location preference");
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
