pub mod controller;
pub mod hotspots;
pub mod models;
pub mod session;
pub mod timer;
pub mod validator;
pub mod wizard;
