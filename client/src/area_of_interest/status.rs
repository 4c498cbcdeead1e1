use std::fmt;

/// Progress of converging one desired channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaOfInterestStatus {
    NotAsked,
    Loading,
    Loaded,
    LoadFailed,
    Updating,
    Updated,
    UpdateFailed,
    Unloading,
    Unloaded,
}

impl AreaOfInterestStatus {
    /// Whether the channel is subscribed with its current filter
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            AreaOfInterestStatus::Loaded | AreaOfInterestStatus::Updated
        )
    }

    /// Whether a request for the channel is in flight
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            AreaOfInterestStatus::Loading
                | AreaOfInterestStatus::Updating
                | AreaOfInterestStatus::Unloading
        )
    }

    pub fn is_valid_transition(&self, to: AreaOfInterestStatus) -> bool {
        use AreaOfInterestStatus::*;

        matches!(
            (*self, to),
            (NotAsked, Loading)
                | (Loading, Loaded)
                | (Loading, LoadFailed)
                | (Loaded, Updating)
                | (Updating, Updated)
                | (Updating, UpdateFailed)
                | (Updated, Updating)
                | (Loaded, Unloading)
                | (Updated, Unloading)
                | (Unloading, Unloaded)
                // retries
                | (LoadFailed, Loading)
                | (Unloaded, Loading)
                | (UpdateFailed, Unloading)
                | (Unloading, Loaded)
                // subscription lost underneath a settled area
                | (Loaded, NotAsked)
                | (Updated, NotAsked)
                | (UpdateFailed, NotAsked)
        )
    }
}

impl fmt::Display for AreaOfInterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AreaOfInterestStatus::NotAsked => "NOT_ASKED",
            AreaOfInterestStatus::Loading => "LOADING",
            AreaOfInterestStatus::Loaded => "LOADED",
            AreaOfInterestStatus::LoadFailed => "LOAD_FAILED",
            AreaOfInterestStatus::Updating => "UPDATING",
            AreaOfInterestStatus::Updated => "UPDATED",
            AreaOfInterestStatus::UpdateFailed => "UPDATE_FAILED",
            AreaOfInterestStatus::Unloading => "UNLOADING",
            AreaOfInterestStatus::Unloaded => "UNLOADED",
        };
        f.write_str(name)
    }
}
