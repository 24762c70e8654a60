pub(crate) mod color;
pub(crate) mod kmeans;
pub(crate) mod palette;
