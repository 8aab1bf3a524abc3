pub mod event_window;
pub mod meter_selection;
pub mod models;
pub mod render;
