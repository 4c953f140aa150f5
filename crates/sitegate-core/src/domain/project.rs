//! Project view as seen by the admission kernel: identity plus geofence.

use serde::{Deserialize, Serialize};

use super::geo::Geofence;
use super::ids::ProjectId;

/// Read-only projection of a project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,

    #[serde(default)]
    pub name: String,

    pub geofence: Geofence,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, geofence: Geofence) -> Self {
        Self {
            id,
            name: name.into(),
            geofence,
        }
    }
}
