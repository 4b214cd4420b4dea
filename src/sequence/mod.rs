pub(crate) mod library;
pub(crate) mod posable;
pub(crate) mod pose;
pub(crate) mod track;
