//! Build state of every registered plot.

use std::collections::BTreeMap;

use plot_defence_core::{PlotBuildState, PlotId};

/// Registry that stores the build state of each plot.
#[derive(Debug, Default)]
pub(crate) struct PlotRegistry {
    states: BTreeMap<PlotId, PlotBuildState>,
}

impl PlotRegistry {
    /// Registers an empty plot. Returns `false` when the plot already existed.
    pub(crate) fn add(&mut self, plot: PlotId) -> bool {
        if self.states.contains_key(&plot) {
            return false;
        }
        let _ = self.states.insert(plot, PlotBuildState::Empty);
        true
    }

    pub(crate) fn state(&self, plot: PlotId) -> Option<PlotBuildState> {
        self.states.get(&plot).copied()
    }

    pub(crate) fn set_level(&mut self, plot: PlotId, level: u32) {
        if let Some(state) = self.states.get_mut(&plot) {
            *state = PlotBuildState::Built { level };
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (PlotId, PlotBuildState)> + '_ {
        self.states.iter().map(|(plot, state)| (*plot, *state))
    }

    /// True when at least one plot exists and every plot carries `level` or
    /// higher.
    pub(crate) fn all_at_least(&self, level: u32) -> bool {
        !self.states.is_empty()
            && self.states.values().all(|state| match state {
                PlotBuildState::Empty => false,
                PlotBuildState::Built { level: built } => *built >= level,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_is_never_maxed() {
        let registry = PlotRegistry::default();
        assert!(!registry.all_at_least(0));
    }

    #[test]
    fn maxed_requires_every_plot() {
        let mut registry = PlotRegistry::default();
        assert!(registry.add(PlotId::new(1)));
        assert!(registry.add(PlotId::new(2)));
        assert!(!registry.add(PlotId::new(2)));

        registry.set_level(PlotId::new(1), 2);
        assert!(!registry.all_at_least(2));

        registry.set_level(PlotId::new(2), 2);
        assert!(registry.all_at_least(2));
    }
}
