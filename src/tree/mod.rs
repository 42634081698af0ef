//! Note trees: building a forest from flat rows and editing it copy-on-write.

mod builder;
mod forest;
mod mutator;

pub(crate) use builder::{build_forest, first_line};
pub(crate) use forest::Forest;
pub(crate) use mutator::{find, modify, remove, subtree_ids_post_order};
