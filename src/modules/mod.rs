pub mod assignments;
pub mod auth;
pub mod brigades;
pub mod guards;
pub mod health;
pub mod incidents;
pub mod messages;
pub mod parks;
pub mod requests;
pub mod requirements;
pub mod shift_changes;
pub mod users;
pub mod vehicles;
