pub(crate) mod compositor;
pub(crate) mod fit;
pub(crate) mod pipeline;
pub(crate) mod raster;
pub(crate) mod sprite;
pub(crate) mod subtitle;
