//! ECS Components стрекозы
//!
//! Организация по доменам:
//! - config: параметры полёта (FlightConfig)
//! - steering: внешний tether steering (TetherSteering, SteeringArrived)
//! - model: связь агент → модель (ModelLink, DragonflyModel)
//!
//! Сам FSM компонент (Dragonfly) живёт в модуле flight.

pub mod config;
pub mod model;
pub mod steering;

// Re-exports для удобного импорта
pub use config::*;
pub use model::*;
pub use steering::*;
