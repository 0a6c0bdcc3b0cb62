pub(crate) mod shutdown;
pub mod trigger;
