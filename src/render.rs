pub(crate) mod context;
pub(crate) mod resample;
pub(crate) mod sample;
