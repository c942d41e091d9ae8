//! Core plugins. Each module holds the plugin declaration (id,
//! dependencies, contributions) and the `impl Editor` block with the
//! operations it shares.

pub mod base_container;
pub mod delete;
pub mod dom;
pub mod history;
pub mod line_break;
pub mod selection;
pub mod split;

use crate::kernel::Plugin;

/// The plugins every editor loads, in registration order
pub fn core_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(selection::SelectionPlugin),
        Box::new(history::HistoryPlugin),
        Box::new(base_container::BaseContainerPlugin),
        Box::new(delete::DeletePlugin),
        Box::new(line_break::LineBreakPlugin),
        Box::new(split::SplitPlugin),
        Box::new(dom::DomPlugin),
    ]
}
