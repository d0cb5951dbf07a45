//! Signal-level connectivity.

use tracing::trace;

use super::entity::{EntityId, SignalData};
use super::{Design, MetadataError};

impl Design {
    pub(crate) fn signal(&self, id: EntityId) -> Result<&SignalData, MetadataError> {
        let entity = self.entity(id)?;
        entity
            .data()
            .as_signal()
            .ok_or_else(|| MetadataError::type_mismatch("signal", entity.type_name()))
    }

    /// True when the signal belongs to a core flagged as a monitor.
    fn is_monitored(&self, signal: EntityId) -> bool {
        self.owning_block(signal)
            .and_then(|b| self.get(b))
            .and_then(|b| b.data().as_core())
            .is_some_and(|core| core.monitor)
    }

    /// Connect two signals in both directions.
    ///
    /// Inside the design exactly one side must drive; across the design
    /// boundary (either side external) both sides must agree. Monitor cores
    /// are exempt. Connecting an already connected pair is a no-op.
    pub fn connect(&mut self, a: EntityId, b: EntityId) -> Result<(), MetadataError> {
        let (sa, sb) = (self.signal(a)?, self.signal(b)?);
        if a == b {
            return Err(MetadataError::unsupported(format!(
                "cannot connect {} to itself",
                self.reference(a)?
            )));
        }
        if sa.is_linked_to(b) && sb.is_linked_to(a) {
            return Ok(());
        }

        let boundary = sa.external || sb.external;
        let opposed = sa.driver != sb.driver;
        if boundary == opposed && !self.is_monitored(a) && !self.is_monitored(b) {
            return Err(MetadataError::WrongPolarity {
                from: self.reference(a)?.to_string(),
                to: self.reference(b)?.to_string(),
            });
        }

        let (ref_a, ref_b) = (
            self.reference(a)?.to_string(),
            self.reference(b)?.to_string(),
        );
        trace!(from = %ref_a, to = %ref_b, "connect");
        if let Some(signal) = self.entity_mut(a)?.data_mut().as_signal_mut() {
            signal.connections.insert(ref_b, Some(b));
        }
        if let Some(signal) = self.entity_mut(b)?.data_mut().as_signal_mut() {
            signal.connections.insert(ref_a, Some(a));
        }
        self.touch(a);
        self.touch(b);
        Ok(())
    }

    /// Remove the connection between two signals in both directions.
    pub fn disconnect(
        &mut self,
        a: EntityId,
        b: EntityId,
        refresh: bool,
    ) -> Result<(), MetadataError> {
        let (sa, sb) = (self.signal(a)?, self.signal(b)?);
        if !sa.is_linked_to(b) && !sb.is_linked_to(a) {
            return Err(MetadataError::not_found(
                "connection",
                format!("{} -> {}", self.reference(a)?, self.reference(b)?),
            ));
        }
        for (holder, peer) in [(a, b), (b, a)] {
            if let Some(signal) = self.entity_mut(holder)?.data_mut().as_signal_mut() {
                signal.connections.retain(|_, link| *link != Some(peer));
            }
            self.touch(holder);
        }
        if refresh {
            self.refresh()?;
        }
        Ok(())
    }

    /// Live handles of the signals connected to `signal`.
    pub fn connections(&self, signal: EntityId) -> Result<Vec<EntityId>, MetadataError> {
        Ok(self
            .signal(signal)?
            .connections
            .values()
            .flatten()
            .copied()
            .collect())
    }

    /// Reference strings of the signals connected to `signal`.
    pub fn con_refs(&self, signal: EntityId) -> Result<Vec<String>, MetadataError> {
        Ok(self
            .signal(signal)?
            .connections
            .iter()
            .map(|(reference, link)| {
                link.and_then(|id| self.get(id))
                    .map_or_else(|| reference.clone(), |e| e.reference().to_string())
            })
            .collect())
    }
}
