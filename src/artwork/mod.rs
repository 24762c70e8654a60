pub(crate) mod cache;
pub(crate) mod catalog;
pub(crate) mod fetch;
pub(crate) mod normalize;
pub(crate) mod resolver;
