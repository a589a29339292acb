//! Model link: видимая модель, следующая за невидимым агентом

use bevy::prelude::*;

/// Ссылка агента на entity модели.
///
/// Агент (логический Transform) двигается FSM'ом, модель получает копию
/// позиции и стабилизированный поворот (без pitch/roll, кроме посадки).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct ModelLink {
    pub model: Entity,
}

/// Маркер entity модели (обратная ссылка на агента)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct DragonflyModel {
    pub agent: Entity,
}
