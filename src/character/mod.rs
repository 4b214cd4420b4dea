pub(crate) mod asset;
pub(crate) mod voice;
