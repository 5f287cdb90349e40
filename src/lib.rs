pub mod app;
pub mod date;
pub mod forecast;
pub mod geocode;
pub mod store;

pub use app::*;
pub use date::*;
pub use forecast::*;
pub use geocode::*;
pub use store::*;

pub const APP_NAME: &'static str = env!("CARGO_PKG_NAME");
