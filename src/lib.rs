pub mod agent;
pub mod error;
pub mod network;
pub mod strategies;
pub mod schedule;
pub mod metrics;
pub mod render;
pub mod simulation;

pub use agent::{Agent, PolicyParams};
pub use error::NetformError;
pub use network::{Network, Uid};
pub use strategies::Strategy;
pub use simulation::{RunState, SimConfig, StopReason, World};
pub use metrics::MetricsCollector;

pub mod prelude {
    pub use crate::agent::{ActionContext, Agent, PolicyParams};
    pub use crate::error::NetformError;
    pub use crate::network::{Network, Uid};
    pub use crate::schedule::SchedulePolicy;
    pub use crate::strategies::{LinkAction, Move, Strategy, StrategyRegistry};
    pub use crate::simulation::{RunState, SimConfig, StopReason, World};
    pub use crate::metrics::{MetricsSnapshot, Reporter};
}
