pub(crate) mod document;
pub(crate) mod item;
pub(crate) mod step;
