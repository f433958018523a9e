pub(crate) mod closest;
pub(crate) mod guide;
pub(crate) mod segment;
