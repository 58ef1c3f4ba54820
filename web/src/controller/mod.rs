pub(crate) mod events_controller;
pub(crate) mod health_check_controller;
