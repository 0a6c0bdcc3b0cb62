pub(crate) mod cluster;
pub(crate) mod cronjob;
pub(crate) mod job;

pub(crate) const FIELD_MANAGER: &str = "cronjob-trigger";
