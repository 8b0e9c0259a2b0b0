pub mod analyses;
pub mod health;
pub mod moods;
pub mod uploads;
pub mod ws;
