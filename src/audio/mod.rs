pub(crate) mod clips;
pub(crate) mod mix;
pub(crate) mod schedule;
