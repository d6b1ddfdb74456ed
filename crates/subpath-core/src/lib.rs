pub mod config;
pub mod context;
pub mod error;
pub mod intercept;
pub mod logging;
pub mod prefix;
pub mod route;
pub mod transport;
pub mod url_model;
pub mod worker;

pub use context::SiteContext;
