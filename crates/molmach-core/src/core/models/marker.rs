//! Markers: named points fixed in an entity's local frame.
//!
//! Binding sites and sensors are markers with extra state. A marker's local placement is not
//! stored here; it is read from the owning entity's structure, because it moves with the
//! current conformation.

use super::error::ModelError;
use super::ids::EntityId;
use crate::core::cone::Cone;
use crate::core::loc_rot::Placement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerKind {
    Plain,
    BindingSite,
    /// A cone-shaped proximity probe. `aperture` is the full opening angle in radians.
    Sensor { range: f64, aperture: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerClass {
    id: String,
    kind: MarkerKind,
}

impl MarkerClass {
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MarkerKind::Plain,
        }
    }

    pub fn binding_site(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MarkerKind::BindingSite,
        }
    }

    pub fn sensor(id: impl Into<String>, range: f64, aperture: f64) -> Result<Self, ModelError> {
        let id = id.into();
        if !(range > 0.0) {
            return Err(ModelError::InvalidMarker {
                marker: id,
                reason: format!("sensor range must be positive, got {}", range),
            });
        }
        if !(aperture > 0.0) {
            return Err(ModelError::InvalidMarker {
                marker: id,
                reason: format!("sensor aperture must be positive, got {}", aperture),
            });
        }
        Ok(Self {
            id,
            kind: MarkerKind::Sensor { range, aperture },
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }
}

/// A marker instance on an entity. `index` addresses the marker in the class layout and in the
/// structure's marker placements.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: String,
    index: usize,
}

impl Marker {
    pub fn new(id: impl Into<String>, index: usize) -> Self {
        Self {
            id: id.into(),
            index,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingState {
    Free,
    /// Reserved for a peer that is not yet coincident.
    Binding,
    Bound,
}

/// Handle to a binding site: the owning entity and the site's position in its binding-site list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteRef {
    pub entity: EntityId,
    pub site: usize,
}

impl SiteRef {
    pub fn new(entity: EntityId, site: usize) -> Self {
        Self { entity, site }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingSite {
    marker: Marker,
    pub(crate) state: BindingState,
    pub(crate) other: Option<SiteRef>,
    pub(crate) is_initiator: bool,
}

impl BindingSite {
    pub fn new(marker: Marker) -> Self {
        Self {
            marker,
            state: BindingState::Free,
            other: None,
            is_initiator: false,
        }
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    pub fn id(&self) -> &str {
        self.marker.id()
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn other_site(&self) -> Option<SiteRef> {
        self.other
    }

    pub fn is_initiator(&self) -> bool {
        self.is_initiator
    }

    pub fn is_free(&self) -> bool {
        self.state == BindingState::Free
    }

    pub fn is_binding(&self) -> bool {
        self.state == BindingState::Binding
    }

    pub fn is_bound(&self) -> bool {
        self.state == BindingState::Bound
    }

    /// The peer site, but only while the bond is established.
    pub fn bound_site(&self) -> Option<SiteRef> {
        if self.is_bound() { self.other } else { None }
    }

    pub(crate) fn attach(&mut self, state: BindingState, other: SiteRef, is_initiator: bool) {
        self.state = state;
        self.other = Some(other);
        self.is_initiator = is_initiator;
    }

    pub(crate) fn set_released(&mut self) {
        self.state = BindingState::Free;
        self.other = None;
        self.is_initiator = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    marker: Marker,
    range: f64,
    aperture: f64,
}

impl Sensor {
    pub fn new(marker: Marker, range: f64, aperture: f64) -> Self {
        Self {
            marker,
            range,
            aperture,
        }
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    pub fn id(&self) -> &str {
        self.marker.id()
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn aperture(&self) -> f64 {
        self.aperture
    }

    /// The sensing cone for the sensor at the given absolute placement.
    pub fn cone(&self, placement: &impl Placement) -> Cone {
        Cone::from_placement(placement, self.range, self.aperture)
    }
}
