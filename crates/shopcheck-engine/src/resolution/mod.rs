pub mod actuation;
pub mod engine;
pub mod navigation;
pub mod result;

pub use engine::{Resolver, ResolverSettings};
pub use result::{
    Actuation, ActuationError, Arrival, Handle, NavigationError, Readiness, ResolutionError,
};
