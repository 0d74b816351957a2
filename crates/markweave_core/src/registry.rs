//! Plugin registry and configure-order resolution.

use std::any::{Any, type_name};
use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::BuildError;
use crate::plugin::{Builders, CapabilityId, Plugin};

struct Entry {
    id: CapabilityId,
    priority: i32,
    dependencies: Vec<CapabilityId>,
    /// `None` while the plugin runs its own setup hook.
    plugin: Option<Box<dyn Plugin>>,
}

/// Holds the plugins of one pipeline build.
///
/// Priority and dependencies are read once, when a plugin is registered.
#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<Entry>,
    index: HashMap<CapabilityId, usize>,
    sealed: bool,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin under its capability id.
    pub fn register<P: Plugin>(&mut self, plugin: P) -> Result<(), BuildError> {
        self.register_boxed(Box::new(plugin))
    }

    pub fn register_boxed(&mut self, plugin: Box<dyn Plugin>) -> Result<(), BuildError> {
        let id = plugin.id();
        if self.sealed {
            return Err(BuildError::setup(format!(
                "Cannot register '{id}' after plugin order was resolved"
            )));
        }
        if self.index.contains_key(id) {
            return Err(BuildError::DuplicateCapability(id.to_string()));
        }

        self.index.insert(id, self.entries.len());
        self.entries.push(Entry {
            id,
            priority: plugin.priority(),
            dependencies: plugin.dependencies(),
            plugin: Some(plugin),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn attached(&self, id: &str) -> Option<&dyn Plugin> {
        let index = *self.index.get(id)?;
        self.entries[index].plugin.as_deref()
    }

    /// Returns the plugin registered under `id` if it is a `P`.
    pub fn get<P: Plugin>(&self, id: &str) -> Option<&P> {
        let plugin: &dyn Any = self.attached(id)?;
        plugin.downcast_ref::<P>()
    }

    pub fn get_mut<P: Plugin>(&mut self, id: &str) -> Option<&mut P> {
        let index = *self.index.get(id)?;
        let plugin: &mut dyn Any = self.entries[index].plugin.as_deref_mut()?;
        plugin.downcast_mut::<P>()
    }

    /// Returns the plugin registered under `id`.
    ///
    /// Fails with [`BuildError::NotRegistered`] when nothing is registered
    /// under `id` (or the plugin is the one currently being set up), and
    /// with [`BuildError::CapabilityMismatch`] when it is not a `P`.
    pub fn require<P: Plugin>(&self, id: &str) -> Result<&P, BuildError> {
        let plugin: &dyn Any = self
            .attached(id)
            .ok_or_else(|| BuildError::NotRegistered(id.to_string()))?;
        plugin
            .downcast_ref::<P>()
            .ok_or_else(|| BuildError::CapabilityMismatch {
                id: id.to_string(),
                expected: type_name::<P>(),
            })
    }

    /// Mutable variant of [`PluginRegistry::require`].
    pub fn require_mut<P: Plugin>(&mut self, id: &str) -> Result<&mut P, BuildError> {
        let index = *self
            .index
            .get(id)
            .ok_or_else(|| BuildError::NotRegistered(id.to_string()))?;
        let plugin: &mut dyn Any = self.entries[index]
            .plugin
            .as_deref_mut()
            .ok_or_else(|| BuildError::NotRegistered(id.to_string()))?;
        plugin
            .downcast_mut::<P>()
            .ok_or_else(|| BuildError::CapabilityMismatch {
                id: id.to_string(),
                expected: type_name::<P>(),
            })
    }

    /// Returns the plugins in configure order.
    ///
    /// Every plugin comes after all of its dependencies. Among plugins that
    /// are ready at the same time, lower priority goes first, then earlier
    /// registration.
    pub fn resolve(&self) -> Result<Vec<&dyn Plugin>, BuildError> {
        let order = self.resolve_order()?;
        Ok(order
            .into_iter()
            .filter_map(|index| self.entries[index].plugin.as_deref())
            .collect())
    }

    /// Kahn's algorithm over registration indices.
    pub(crate) fn resolve_order(&self) -> Result<Vec<usize>, BuildError> {
        let count = self.entries.len();
        let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(count);
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut in_degree = vec![0usize; count];

        for (index, entry) in self.entries.iter().enumerate() {
            let mut resolved = Vec::with_capacity(entry.dependencies.len());
            for dependency in &entry.dependencies {
                let Some(&target) = self.index.get(dependency) else {
                    return Err(BuildError::MissingDependency {
                        plugin: entry.id.to_string(),
                        dependency: dependency.to_string(),
                    });
                };
                if resolved.contains(&target) {
                    continue;
                }
                resolved.push(target);
                dependents[target].push(index);
                in_degree[index] += 1;
            }
            dependencies.push(resolved);
        }

        let mut ready: BTreeSet<(i32, usize)> = (0..count)
            .filter(|&index| in_degree[index] == 0)
            .map(|index| (self.entries[index].priority, index))
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some((_, index)) = ready.pop_first() {
            order.push(index);
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert((self.entries[dependent].priority, dependent));
                }
            }
        }

        if order.len() < count {
            let mut placed = vec![false; count];
            for &index in &order {
                placed[index] = true;
            }
            return Err(BuildError::CyclicDependency {
                cycle: self.find_cycle(&dependencies, &placed),
            });
        }

        debug!(
            order = ?order.iter().map(|&i| self.entries[i].id).collect::<Vec<_>>(),
            "Resolved plugin order"
        );
        Ok(order)
    }

    /// Follows unplaced dependencies until one repeats.
    ///
    /// Every unplaced plugin has at least one unplaced dependency, so the
    /// walk always closes a cycle.
    fn find_cycle(&self, dependencies: &[Vec<usize>], placed: &[bool]) -> Vec<String> {
        let mut path: Vec<usize> = Vec::new();
        let mut position: HashMap<usize, usize> = HashMap::new();
        let mut current = placed.iter().position(|&p| !p);

        while let Some(index) = current {
            if let Some(&start) = position.get(&index) {
                path.drain(..start);
                path.push(index);
                break;
            }
            position.insert(index, path.len());
            path.push(index);
            current = dependencies[index]
                .iter()
                .copied()
                .find(|&dependency| !placed[dependency]);
        }

        path.into_iter()
            .map(|index| self.entries[index].id.to_string())
            .collect()
    }

    /// Prevents further registration; the order is fixed from now on.
    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    /// Runs the setup hook of the plugin at `index` with the plugin detached.
    pub(crate) fn setup_at(&mut self, index: usize) -> Result<(), BuildError> {
        let Some(mut plugin) = self.entries[index].plugin.take() else {
            return Ok(());
        };
        let result = plugin.setup(self);
        self.entries[index].plugin = Some(plugin);
        result
    }

    pub(crate) fn configure_at(&self, index: usize, builders: &mut Builders) {
        if let Some(plugin) = self.entries[index].plugin.as_deref() {
            plugin.configure(builders);
        }
    }

    pub(crate) fn id_at(&self, index: usize) -> CapabilityId {
        self.entries[index].id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::CorePlugin;
    use pretty_assertions::assert_eq;

    struct TestPlugin {
        id: CapabilityId,
        priority: i32,
        dependencies: Vec<CapabilityId>,
    }

    impl TestPlugin {
        fn new(id: CapabilityId, priority: i32, dependencies: &[CapabilityId]) -> Self {
            Self {
                id,
                priority,
                dependencies: dependencies.to_vec(),
            }
        }
    }

    impl Plugin for TestPlugin {
        fn id(&self) -> CapabilityId {
            self.id
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn dependencies(&self) -> Vec<CapabilityId> {
            self.dependencies.clone()
        }

        fn configure(&self, _builders: &mut Builders) {}
    }

    fn ids(registry: &PluginRegistry) -> Vec<CapabilityId> {
        registry
            .resolve()
            .unwrap()
            .into_iter()
            .map(|plugin| plugin.id())
            .collect()
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("a", 0, &[])).unwrap();

        let err = registry.register(TestPlugin::new("a", 1, &[])).unwrap_err();
        assert_eq!(err, BuildError::DuplicateCapability("a".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unrelated_plugins_by_priority_then_registration() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("late", 10, &[])).unwrap();
        registry.register(TestPlugin::new("first", -5, &[])).unwrap();
        registry.register(TestPlugin::new("tie-1", 0, &[])).unwrap();
        registry.register(TestPlugin::new("tie-2", 0, &[])).unwrap();

        assert_eq!(ids(&registry), vec!["first", "tie-1", "tie-2", "late"]);
    }

    #[test]
    fn test_dependencies_win_over_priority() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("a", -100, &["b"])).unwrap();
        registry.register(TestPlugin::new("b", 100, &[])).unwrap();
        registry.register(TestPlugin::new("c", 0, &[])).unwrap();

        assert_eq!(ids(&registry), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_every_edge_is_satisfied() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("d", 0, &["b", "c"])).unwrap();
        registry.register(TestPlugin::new("c", 0, &["a"])).unwrap();
        registry.register(TestPlugin::new("b", 0, &["a"])).unwrap();
        registry.register(TestPlugin::new("a", 0, &[])).unwrap();

        let order = ids(&registry);
        let pos = |id: &str| order.iter().position(|o| *o == id).unwrap();
        for plugin in registry.resolve().unwrap() {
            for dependency in plugin.dependencies() {
                assert!(pos(dependency) < pos(plugin.id()));
            }
        }
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_missing_dependency() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("a", 0, &["ghost"])).unwrap();

        assert_eq!(
            registry.resolve().err().unwrap(),
            BuildError::MissingDependency {
                plugin: "a".into(),
                dependency: "ghost".into(),
            }
        );
    }

    #[test]
    fn test_cycle_reports_path() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("root", 0, &[])).unwrap();
        registry.register(TestPlugin::new("a", 0, &["root", "b"])).unwrap();
        registry.register(TestPlugin::new("b", 0, &["c"])).unwrap();
        registry.register(TestPlugin::new("c", 0, &["a"])).unwrap();

        assert_eq!(
            registry.resolve().err().unwrap(),
            BuildError::CyclicDependency {
                cycle: vec!["a".into(), "b".into(), "c".into(), "a".into()],
            }
        );
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("a", 0, &["a"])).unwrap();

        assert_eq!(
            registry.resolve().err().unwrap(),
            BuildError::CyclicDependency {
                cycle: vec!["a".into(), "a".into()],
            }
        );
    }

    #[test]
    fn test_require_returns_resolved_instance() {
        let mut registry = PluginRegistry::new();
        registry.register(CorePlugin::new()).unwrap();
        registry.register(TestPlugin::new("t", 0, &[])).unwrap();

        let required = registry.require::<TestPlugin>("t").unwrap();
        let resolved = registry
            .resolve()
            .unwrap()
            .into_iter()
            .find(|plugin| plugin.id() == "t")
            .unwrap();

        assert!(std::ptr::addr_eq(required as *const TestPlugin, resolved as *const dyn Plugin));
    }

    #[test]
    fn test_require_errors() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("t", 0, &[])).unwrap();

        assert_eq!(
            registry.require::<TestPlugin>("nope").err().unwrap(),
            BuildError::NotRegistered("nope".into())
        );
        assert!(matches!(
            registry.require::<CorePlugin>("t").err().unwrap(),
            BuildError::CapabilityMismatch { ref id, .. } if id == "t"
        ));
        assert!(registry.get::<CorePlugin>("t").is_none());
        assert!(registry.get::<TestPlugin>("t").is_some());
    }

    #[test]
    fn test_require_mut_changes_registered_plugin() {
        let mut registry = PluginRegistry::new();
        registry.register(TestPlugin::new("t", 0, &[])).unwrap();

        registry.require_mut::<TestPlugin>("t").unwrap().priority = 7;
        assert_eq!(registry.get::<TestPlugin>("t").unwrap().priority, 7);
    }

    struct SelfRequiring {
        seen: Option<BuildError>,
    }

    impl Plugin for SelfRequiring {
        fn id(&self) -> CapabilityId {
            "self-requiring"
        }

        fn dependencies(&self) -> Vec<CapabilityId> {
            Vec::new()
        }

        fn setup(&mut self, registry: &mut PluginRegistry) -> Result<(), BuildError> {
            self.seen = registry.require::<SelfRequiring>("self-requiring").err();
            Ok(())
        }

        fn configure(&self, _builders: &mut Builders) {}
    }

    #[test]
    fn test_plugin_is_detached_during_setup() {
        let mut registry = PluginRegistry::new();
        registry.register(SelfRequiring { seen: None }).unwrap();

        registry.setup_at(0).unwrap();

        let plugin = registry.get::<SelfRequiring>("self-requiring").unwrap();
        assert_eq!(
            plugin.seen,
            Some(BuildError::NotRegistered("self-requiring".into()))
        );
    }

    #[test]
    fn test_sealed_registry_rejects_registration() {
        let mut registry = PluginRegistry::new();
        registry.seal();

        assert!(matches!(
            registry.register(TestPlugin::new("t", 0, &[])),
            Err(BuildError::Setup(_))
        ));
    }
}
