pub mod a2a;
pub mod agent;
pub mod analysis;
pub mod health;
