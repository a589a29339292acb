//! Flight FSM состояния и таблица переходов

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Состояния полёта стрекозы
///
/// Entering → Wandering | Landing → Landed ⇄ Scared → ... → Leaving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum FlightState {
    /// Влёт к точке спуска (начальное состояние)
    #[default]
    Entering,
    /// Свободное блуждание вокруг текущей цели
    Wandering,
    /// Поиск поверхности и подлёт к ней
    Landing,
    /// Сидит на поверхности (chill period)
    Landed,
    /// Испугалась: отлёт + пауза, потом возврат
    Scared,
    /// Улёт к точке выхода
    Leaving,
}

impl FlightState {
    /// Допустимые рёбра FSM (self-transition разрешён всегда)
    pub fn can_transition_to(self, next: FlightState) -> bool {
        use FlightState::*;

        if self == next {
            return true;
        }

        matches!(
            (self, next),
            (Entering, Wandering)
                | (Entering, Landing)
                | (Entering, Scared)
                | (Entering, Leaving)
                | (Wandering, Landing)
                | (Wandering, Leaving)
                | (Landing, Landed)
                | (Landing, Leaving)
                | (Landed, Leaving)
                | (Landed, Scared)
                | (Scared, Entering)
                | (Scared, Leaving)
                | (Scared, Landing)
                | (Leaving, Scared)
        )
    }

    /// Состояния, в которых disturbance вызывает бегство
    pub fn reacts_to_disturbance(self) -> bool {
        matches!(self, FlightState::Entering | FlightState::Leaving)
    }
}

/// Сценарий после влёта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum FlightScenario {
    #[default]
    Wander,
    Land,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [FlightState; 6] = [
        FlightState::Entering,
        FlightState::Wandering,
        FlightState::Landing,
        FlightState::Landed,
        FlightState::Scared,
        FlightState::Leaving,
    ];

    #[test]
    fn test_flight_state_default() {
        assert_eq!(FlightState::default(), FlightState::Entering);
        assert_eq!(FlightScenario::default(), FlightScenario::Wander);
    }

    #[test]
    fn test_edge_count() {
        let edges = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from != to && from.can_transition_to(*to))
            .count();
        assert_eq!(edges, 14);
    }

    #[test]
    fn test_forbidden_edges() {
        assert!(!FlightState::Wandering.can_transition_to(FlightState::Scared));
        assert!(!FlightState::Landing.can_transition_to(FlightState::Scared));
        assert!(!FlightState::Leaving.can_transition_to(FlightState::Entering));
        assert!(!FlightState::Scared.can_transition_to(FlightState::Landed));
        assert!(!FlightState::Scared.can_transition_to(FlightState::Wandering));
    }

    #[test]
    fn test_landing_can_be_abandoned() {
        assert!(FlightState::Landing.can_transition_to(FlightState::Leaving));
        assert!(!FlightState::Landing.can_transition_to(FlightState::Wandering));
    }

    #[test]
    fn test_disturbance_states() {
        let reacting: Vec<_> = ALL.iter().filter(|s| s.reacts_to_disturbance()).collect();
        assert_eq!(reacting, vec![&FlightState::Entering, &FlightState::Leaving]);
    }
}
