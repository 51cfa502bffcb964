pub mod config;
pub mod driver;
pub mod resolution;
pub mod target;
pub mod wait;

pub use driver::{Action, Driver, DriverError, ElementState};
pub use resolution::{
    Actuation, ActuationError, Arrival, Handle, NavigationError, Readiness, ResolutionError,
    Resolver, ResolverSettings,
};
pub use target::{Strategy, Target, TargetError};
