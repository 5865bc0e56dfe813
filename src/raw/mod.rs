mod arena;
mod handle;
mod node;
mod raw_veb_tree;

pub(crate) use raw_veb_tree::RawVebTree;
