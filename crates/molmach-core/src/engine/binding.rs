//! The binding protocol.
//!
//! A binding site is `Free`, `Binding` (a reservation of a peer that has not been reached
//! yet), or `Bound`. Every transition is applied to both sides of the pair: the initiating
//! call records `is_initiator = true` on its own site and repeats the operation on the peer
//! with `is_initiator = false`. Only an initiating instant bind merges compounds, and only
//! releasing a `Bound` pair splits one.

use super::environment::Environment;
use super::error::EngineError;
use super::trajectory::Trajectory;
use crate::core::models::ids::EntityId;
use crate::core::models::marker::{BindingSite, BindingState, SiteRef};
use tracing::debug;

impl Environment {
    pub fn site(&self, site: SiteRef) -> Result<&BindingSite, EngineError> {
        let entity = self.require_entity(site.entity)?;
        entity
            .binding_site(site.site)
            .ok_or_else(|| EngineError::BindingSiteNotFound {
                entity: entity.diagnostic_id(),
                site: format!("#{}", site.site),
            })
    }

    fn site_mut(&mut self, site: SiteRef) -> Result<&mut BindingSite, EngineError> {
        let entity = self.require_entity_mut(site.entity)?;
        if site.site >= entity.binding_sites.len() {
            return Err(EngineError::BindingSiteNotFound {
                entity: entity.diagnostic_id(),
                site: format!("#{}", site.site),
            });
        }
        Ok(&mut entity.binding_sites[site.site])
    }

    pub fn binding_state(&self, site: SiteRef) -> Result<BindingState, EngineError> {
        Ok(self.site(site)?.state())
    }

    /// The reserved or bound peer of a site.
    pub fn other_site(&self, site: SiteRef) -> Result<Option<SiteRef>, EngineError> {
        Ok(self.site(site)?.other_site())
    }

    /// The entity on the other side of an established bond.
    pub fn bound_entity(&self, site: SiteRef) -> Result<Option<EntityId>, EngineError> {
        Ok(self.site(site)?.bound_site().map(|other| other.entity))
    }

    /// Reserves `other` for `this` on both sides. Whatever either site was attached to before
    /// is released first.
    pub fn initiate_binding(&mut self, this: SiteRef, other: SiteRef) -> Result<(), EngineError> {
        self.attach_pair(this, other, BindingState::Binding, true)
    }

    /// Binds `this` and `other` immediately on both sides and merges the compound of `other`
    /// into the compound of `this`.
    pub fn instant_bind(&mut self, this: SiteRef, other: SiteRef) -> Result<(), EngineError> {
        self.attach_pair(this, other, BindingState::Bound, true)
    }

    /// Releases the site, ejecting disconnected entities as floating compounds.
    pub fn release_bond(&mut self, this: SiteRef) -> Result<(), EngineError> {
        self.release_bond_with(this, &Trajectory::float())
    }

    /// Releases the site. If the pair was `Bound`, the owning compound is split and every
    /// component that lost its connection to the root is put on `eject`.
    ///
    /// Releasing a `Free` site does nothing.
    pub fn release_bond_with(&mut self, this: SiteRef, eject: &Trajectory) -> Result<(), EngineError> {
        match self.site(this)?.state() {
            BindingState::Free => Ok(()),
            BindingState::Binding => self.release_pair(this).map(|_| ()),
            BindingState::Bound => {
                self.release_pair(this)?;
                let compound = self.compound_of(this.entity).ok_or_else(|| {
                    EngineError::InvariantViolation(format!(
                        "bound entity {} has no compound",
                        self.entity(this.entity).map(|e| e.diagnostic_id()).unwrap_or_default()
                    ))
                })?;
                self.split_compound(compound, eject).map(|_| ())
            }
        }
    }

    fn release_pair(&mut self, this: SiteRef) -> Result<SiteRef, EngineError> {
        let other = self.site(this)?.other_site().ok_or_else(|| {
            EngineError::InvariantViolation(format!("site {:?} is attached without a peer", this))
        })?;
        if self.site(other)?.other_site() != Some(this) {
            return Err(EngineError::InvariantViolation(format!(
                "bond {:?} -> {:?} is not symmetric",
                this, other
            )));
        }

        self.site_mut(this)?.set_released();
        self.site_mut(other)?.set_released();
        debug!(site = ?this, peer = ?other, "Released bond");
        Ok(other)
    }

    fn attach_pair(
        &mut self,
        this: SiteRef,
        other: SiteRef,
        state: BindingState,
        is_initiator: bool,
    ) -> Result<(), EngineError> {
        if this == other {
            return Err(EngineError::InvariantViolation(format!(
                "site {:?} cannot bind to itself",
                this
            )));
        }
        self.site(other)?;

        let current = self.site(this)?;
        if current.state() == state && current.other_site() == Some(other) {
            return Ok(());
        }
        let keeps_reservation = current.is_binding() && current.other_site() == Some(other);
        if !current.is_free() && !keeps_reservation {
            self.release_bond(this)?;
        }

        self.site_mut(this)?.attach(state, other, is_initiator);
        if !is_initiator {
            return Ok(());
        }

        self.attach_pair(other, this, state, false)?;
        debug!(site = ?this, peer = ?other, state = ?state, "Attached binding sites");

        if state == BindingState::Bound {
            match (self.compound_of(this.entity), self.compound_of(other.entity)) {
                (Some(own), Some(peer)) => self.merge_compounds(own, peer)?,
                _ => {
                    return Err(EngineError::InvariantViolation(format!(
                        "bound entities {:?} and {:?} must both belong to a compound",
                        this.entity, other.entity
                    )));
                }
            }
        }
        Ok(())
    }
}
