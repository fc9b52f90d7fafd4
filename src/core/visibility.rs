use indexmap::IndexMap;

use crate::error::{PostMortemError, PostMortemResult};

use super::{Layer, LayerId, LayerList, Panel, Visibility};

/// Visibility state of every layer, keyed by `LayerId`.
///
/// Entries are kept in layer creation order, so `positional()` is the
/// index-aligned vector the chart surface applies verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityVector {
    states: IndexMap<LayerId, Visibility>,
}

impl VisibilityVector {
    /// Vector holding every layer's default visibility.
    #[must_use]
    pub fn from_defaults(layers: &LayerList) -> Self {
        Self {
            states: layers
                .iter()
                .map(|layer| (layer.id, layer.default_visibility))
                .collect(),
        }
    }

    /// Rebuilds a vector from its positional projection.
    pub fn from_positional(layers: &LayerList, states: &[Visibility]) -> PostMortemResult<Self> {
        if states.len() != layers.len() {
            return Err(PostMortemError::VisibilityMismatch {
                expected: layers.len(),
                actual: states.len(),
            });
        }
        Ok(Self {
            states: layers
                .iter()
                .zip(states.iter().copied())
                .map(|(layer, state)| (layer.id, state))
                .collect(),
        })
    }

    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<Visibility> {
        self.states.get(&id).copied()
    }

    pub(crate) fn set(&mut self, id: LayerId, visibility: Visibility) {
        if let Some(state) = self.states.get_mut(&id) {
            *state = visibility;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerId, Visibility)> + '_ {
        self.states.iter().map(|(id, state)| (*id, *state))
    }

    #[must_use]
    pub fn positional(&self) -> Vec<Visibility> {
        self.states.values().copied().collect()
    }

    /// Ids of drawn layers on `panel`, in creation order.
    #[must_use]
    pub fn drawn_in(&self, layers: &LayerList, panel: Panel) -> Vec<LayerId> {
        layers
            .in_panel(panel)
            .filter(|layer| self.get(layer.id).is_some_and(Visibility::is_drawn))
            .map(|layer| layer.id)
            .collect()
    }

    #[must_use]
    pub fn is_drawn(&self, layer: &Layer) -> bool {
        self.get(layer.id).is_some_and(Visibility::is_drawn)
    }

    /// Checks the vector was built for exactly this layer list.
    pub fn ensure_matches(&self, layers: &LayerList) -> PostMortemResult<()> {
        let aligned = self.states.len() == layers.len()
            && self
                .states
                .keys()
                .zip(layers.iter())
                .all(|(id, layer)| *id == layer.id);
        if aligned {
            Ok(())
        } else {
            Err(PostMortemError::VisibilityMismatch {
                expected: layers.len(),
                actual: self.states.len(),
            })
        }
    }
}
