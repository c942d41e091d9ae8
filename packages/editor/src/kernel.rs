//! # Plugin Kernel
//!
//! Composition root of an editing session.
//!
//! ## Build order
//!
//! 1. Validate the configuration
//! 2. Order plugins by dependency (registration order among independents)
//! 3. Aggregate every plugin's contributions into one immutable [`Resources`]
//! 4. Create the tree and the editable root, load the initial content
//! 5. Run each plugin's `setup` with its resolved [`Dependencies`]
//! 6. Run the normalize handlers once and start history from that state
//!
//! Configuration problems (unknown dependency, a used method the
//! dependency does not share, cycle, duplicate id, a contribution of the
//! wrong shape) fail in [`EditorBuilder::build`], never later inside an
//! edit.

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::plugins;
use crate::plugins::base_container::BaseContainerFactory;
use crate::resources::{Contribution, Entry, ResourceArgs, ResourceBuilder, ResourceKey};
use scribe_dom::{parse_into, Dom, NodeId};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// A named unit of editor behaviour
///
/// Plugins declare what they need (`dependencies`) and what they offer
/// (`shared`); the kernel only wires and orders them.
pub trait Plugin {
    fn id(&self) -> &'static str;

    /// Ids of the plugins whose shared methods this plugin uses
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Names of the methods this plugin exposes to its dependents
    fn shared(&self) -> &'static [&'static str] {
        &[]
    }

    /// Shared methods this plugin calls, per dependency. Checked at build
    /// against the dependency's `shared` list.
    fn uses(&self) -> &'static [(&'static str, &'static [&'static str])] {
        &[]
    }

    fn resources(&self, _resources: &mut ResourceBuilder) {}

    fn setup(&mut self, _context: &mut PluginContext<'_>) -> EditorResult<()> {
        Ok(())
    }

    fn destroy(&mut self) {}
}

/// Shared methods of the declared dependencies, and nothing else
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    shared: HashMap<&'static str, &'static [&'static str]>,
}

impl Dependencies {
    pub fn shared(&self, plugin: &str) -> Option<&'static [&'static str]> {
        self.shared.get(plugin).copied()
    }

    pub fn provides(&self, plugin: &str, method: &str) -> bool {
        self.shared(plugin)
            .is_some_and(|methods| methods.contains(&method))
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_empty()
    }
}

/// Named service handles handed to every plugin
#[derive(Clone, Default)]
pub struct Services {
    handles: HashMap<String, Rc<dyn Any>>,
}

impl Services {
    pub fn insert<T: 'static>(&mut self, name: impl Into<String>, service: T) {
        self.handles.insert(name.into(), Rc::new(service));
    }

    pub fn get<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        Rc::clone(self.handles.get(name)?).downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handles.keys()).finish()
    }
}

pub type Cleanup = Box<dyn FnOnce()>;

/// Everything injected into a plugin at setup
pub struct PluginContext<'a> {
    dom: &'a mut Dom,
    editable: NodeId,
    dependencies: Dependencies,
    config: &'a EditorConfig,
    services: &'a Services,
    cleanups: Vec<Cleanup>,
}

impl PluginContext<'_> {
    pub fn dom(&self) -> &Dom {
        self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        self.dom
    }

    pub fn editable(&self) -> NodeId {
        self.editable
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub fn config(&self) -> &EditorConfig {
        self.config
    }

    pub fn services(&self) -> &Services {
        self.services
    }

    /// Register a callback run once when the editor is destroyed
    pub fn on_destroy(&mut self, cleanup: impl FnOnce() + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }
}

pub(crate) struct LoadedPlugin {
    plugin: Box<dyn Plugin>,
    cleanups: Vec<Cleanup>,
    destroyed: bool,
}

impl LoadedPlugin {
    pub(crate) fn id(&self) -> &'static str {
        self.plugin.id()
    }

    pub(crate) fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for cleanup in self.cleanups.drain(..) {
            cleanup();
        }
        self.plugin.destroy();
        self.destroyed = true;
    }
}

/// Builder for an [`Editor`] session
pub struct EditorBuilder {
    config: EditorConfig,
    plugins: Vec<Box<dyn Plugin>>,
    services: Services,
    content: Option<String>,
}

impl Default for EditorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorBuilder {
    /// Builder preloaded with the core plugins
    pub fn new() -> Self {
        let mut builder = Self::bare();
        builder.plugins = plugins::core_plugins();
        builder
    }

    /// Builder without any plugin
    pub fn bare() -> Self {
        Self {
            config: EditorConfig::default(),
            plugins: Vec::new(),
            services: Services::default(),
            content: None,
        }
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn service<T: 'static>(mut self, name: impl Into<String>, service: T) -> Self {
        self.services.insert(name, service);
        self
    }

    /// Initial content, in fixture markup (selection markers allowed)
    pub fn content(mut self, markup: impl Into<String>) -> Self {
        self.content = Some(markup.into());
        self
    }

    pub fn build(self) -> EditorResult<Editor> {
        self.config.validate()?;
        let base_container = BaseContainerFactory::from_config(&self.config)?;
        let ordered = order_plugins(self.plugins)?;
        check_capabilities(&ordered)?;

        let mut builder = ResourceBuilder::default();
        for plugin in &ordered {
            builder.for_plugin(plugin.id());
            plugin.resources(&mut builder);
        }
        let resources = Rc::new(builder.build()?);

        let shared: HashMap<&'static str, &'static [&'static str]> =
            ordered.iter().map(|p| (p.id(), p.shared())).collect();

        let mut dom = Dom::new();
        let editable = dom.create_element("div");
        let selection = match &self.content {
            Some(markup) => parse_into(&mut dom, editable, markup)?,
            None => None,
        };

        let mut loaded = Vec::with_capacity(ordered.len());
        for mut plugin in ordered {
            let dependencies = Dependencies {
                shared: plugin
                    .dependencies()
                    .iter()
                    .filter_map(|&id| shared.get(id).map(|methods| (id, *methods)))
                    .collect(),
            };
            let mut context = PluginContext {
                dom: &mut dom,
                editable,
                dependencies,
                config: &self.config,
                services: &self.services,
                cleanups: Vec::new(),
            };
            plugin.setup(&mut context)?;
            let cleanups = context.cleanups;
            debug!(plugin = plugin.id(), cleanups = cleanups.len(), "plugin ready");
            loaded.push(LoadedPlugin {
                plugin,
                cleanups,
                destroyed: false,
            });
        }

        info!(plugins = loaded.len(), "editor built");
        let mut editor = Editor::new(
            dom,
            editable,
            self.config,
            resources,
            self.services,
            loaded,
            base_container,
        );
        editor.set_selection_raw(selection);
        editor.normalize(editable)?;
        editor.reset_history();
        Ok(editor)
    }
}

/// Stable topological sort: a plugin is placed as soon as everything it
/// depends on is placed, scanning in registration order.
fn order_plugins(plugins: Vec<Box<dyn Plugin>>) -> EditorResult<Vec<Box<dyn Plugin>>> {
    let mut ids = HashSet::new();
    for plugin in &plugins {
        if !ids.insert(plugin.id()) {
            return Err(EditorError::DuplicatePlugin(plugin.id().to_string()));
        }
    }
    for plugin in &plugins {
        if let Some(missing) = plugin.dependencies().iter().find(|dep| !ids.contains(*dep)) {
            return Err(EditorError::UnresolvedDependency {
                plugin: plugin.id().to_string(),
                dependency: missing.to_string(),
            });
        }
    }

    let mut pending: Vec<Option<Box<dyn Plugin>>> = plugins.into_iter().map(Some).collect();
    let mut placed: HashSet<&'static str> = HashSet::new();
    let mut ordered = Vec::with_capacity(pending.len());
    while ordered.len() < pending.len() {
        let ready = pending.iter().position(|slot| {
            slot.as_ref().is_some_and(|plugin| {
                plugin.dependencies().iter().all(|dep| placed.contains(dep))
            })
        });
        let Some(index) = ready else {
            let cycle: Vec<String> = pending
                .iter()
                .flatten()
                .map(|plugin| plugin.id().to_string())
                .collect();
            return Err(EditorError::DependencyCycle(cycle));
        };
        if let Some(plugin) = pending[index].take() {
            placed.insert(plugin.id());
            ordered.push(plugin);
        }
    }
    Ok(ordered)
}

/// Every method listed in `uses` must be shared by a declared dependency
fn check_capabilities(plugins: &[Box<dyn Plugin>]) -> EditorResult<()> {
    let shared: HashMap<&'static str, &'static [&'static str]> =
        plugins.iter().map(|p| (p.id(), p.shared())).collect();
    for plugin in plugins {
        for &(dependency, methods) in plugin.uses() {
            let unresolved = |name: String| EditorError::UnresolvedDependency {
                plugin: plugin.id().to_string(),
                dependency: name,
            };
            if !plugin.dependencies().contains(&dependency) {
                return Err(unresolved(dependency.to_string()));
            }
            let offered = shared.get(dependency).copied().unwrap_or_default();
            if let Some(missing) = methods.iter().find(|&&method| !offered.contains(&method)) {
                return Err(unresolved(format!("{dependency}.{missing}")));
            }
        }
    }
    Ok(())
}

impl Editor {
    /// Ordered entries of a resource; empty when nobody contributed
    pub fn get_resource(&self, key: ResourceKey) -> &[Entry] {
        self.resources.get(key)
    }

    /// Run every handler of `key` in order
    pub fn dispatch_to(&mut self, key: ResourceKey, args: ResourceArgs<'_>) -> EditorResult<()> {
        let resources = Rc::clone(&self.resources);
        for contribution in resources.contributions(key) {
            contribution.invoke(self, args)?;
        }
        Ok(())
    }

    /// Run handlers of `key` in order until one answers `true`
    pub fn delegate_to(&mut self, key: ResourceKey, args: ResourceArgs<'_>) -> EditorResult<bool> {
        let resources = Rc::clone(&self.resources);
        for entry in resources.get(key) {
            if entry.contribution.invoke(self, args)? {
                debug!(resource = %key, plugin = entry.plugin, "handled by override");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// OR-fold of the predicates contributed to `key`
    pub fn any_predicate(&self, key: ResourceKey, node: NodeId) -> bool {
        self.resources.contributions(key).any(|contribution| match contribution {
            Contribution::Predicate(predicate) => predicate(self, node),
            _ => false,
        })
    }

    /// Ids of the loaded plugins, in setup order
    pub fn plugin_ids(&self) -> Vec<&'static str> {
        self.plugins.iter().map(LoadedPlugin::id).collect()
    }

    /// Tear the session down. Cleanups run once, in reverse setup order;
    /// later calls do nothing.
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            warn!("editor already destroyed");
            return;
        }
        for plugin in self.plugins.iter_mut().rev() {
            plugin.destroy();
        }
        self.mark_destroyed();
        info!("editor destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static [&'static str]);

    impl Plugin for Named {
        fn id(&self) -> &'static str {
            self.0
        }

        fn dependencies(&self) -> &'static [&'static str] {
            self.1
        }
    }

    fn ids(plugins: &[Box<dyn Plugin>]) -> Vec<&'static str> {
        plugins.iter().map(|p| p.id()).collect()
    }

    #[test]
    fn test_order_is_stable_among_independents() {
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(Named("c", &["a"])),
            Box::new(Named("b", &[])),
            Box::new(Named("a", &[])),
        ];
        let ordered = order_plugins(plugins).unwrap();
        assert_eq!(ids(&ordered), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_cycle_names_remaining_plugins() {
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(Named("free", &[])),
            Box::new(Named("x", &["y"])),
            Box::new(Named("y", &["x"])),
        ];
        match order_plugins(plugins) {
            Err(EditorError::DependencyCycle(cycle)) => assert_eq!(cycle, vec!["x", "y"]),
            _ => panic!("expected a cycle"),
        }
    }

    struct Caller(&'static [(&'static str, &'static [&'static str])]);

    impl Plugin for Caller {
        fn id(&self) -> &'static str {
            "caller"
        }

        fn dependencies(&self) -> &'static [&'static str] {
            &["callee"]
        }

        fn uses(&self) -> &'static [(&'static str, &'static [&'static str])] {
            self.0
        }
    }

    struct Callee;

    impl Plugin for Callee {
        fn id(&self) -> &'static str {
            "callee"
        }

        fn shared(&self) -> &'static [&'static str] {
            &["ring"]
        }
    }

    fn unresolved(uses: &'static [(&'static str, &'static [&'static str])]) -> Option<String> {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Callee), Box::new(Caller(uses))];
        match check_capabilities(&plugins) {
            Err(EditorError::UnresolvedDependency { dependency, .. }) => Some(dependency),
            _ => None,
        }
    }

    #[test]
    fn test_used_methods_must_be_shared() {
        assert_eq!(unresolved(&[("callee", &["ring"])]), None);
        assert_eq!(
            unresolved(&[("callee", &["ring", "knock"])]),
            Some("callee.knock".to_string())
        );
        assert_eq!(unresolved(&[("other", &["ring"])]), Some("other".to_string()));
    }

    #[test]
    fn test_services_downcast() {
        let mut services = Services::default();
        services.insert("answer", 42_u32);
        assert_eq!(services.get::<u32>("answer").as_deref(), Some(&42));
        assert!(services.get::<String>("answer").is_none());
        assert!(services.get::<u32>("missing").is_none());
    }
}
