pub(crate) mod highlight;
pub(crate) mod render;
