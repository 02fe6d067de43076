//! External API integrations

pub mod route_optimizer;

pub use route_optimizer::RouteOptimizerClient;
