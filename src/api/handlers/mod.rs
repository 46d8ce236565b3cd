pub mod goals;
pub mod health;
pub mod surfaces;
