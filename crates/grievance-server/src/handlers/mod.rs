pub mod activity;
pub mod analytics;
pub mod grievances;
pub mod health;
pub mod reference;
