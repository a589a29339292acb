//! Cooperative routines: отложенные шаги FSM (паузы, ретраи, подлёт)
//!
//! Каждая routine ждёт N тиков или T секунд, потом возвращается в FSM.
//! Отмена явная: routine, привязанная к поколению, умирает при смене
//! поколения (каждый переход FSM делает `invalidate`).

use crate::flight::FlightState;

/// Что делать при пробуждении
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoutineKind {
    /// Пауза между смещениями wander цели
    WanderPause,
    /// Повтор поиска land target после 3 тиков
    LandSearch { attempt: u32 },
    /// Следующий шаг подлёта к land target
    LandApproach,
    /// Конец chill period на поверхности
    Chill,
    /// Конец бегства: вернуться к `resume`
    FlyAway { resume: FlightState },
    /// Отдых после steering arrival → новый waypoint
    SteeringRest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wake {
    Ticks(u32),
    Seconds(f32),
}

/// Токен отмены: поколение, в котором routine запланирована
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelToken {
    Generation(u64),
    /// Не привязана к состоянию FSM (steering rest)
    Detached,
}

#[derive(Debug, Clone, PartialEq)]
struct Scheduled {
    kind: RoutineKind,
    wake: Wake,
    token: CancelToken,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routines {
    generation: u64,
    pending: Vec<Scheduled>,
}

impl Routines {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Routine текущего поколения (отменится при следующем переходе)
    pub fn schedule(&mut self, kind: RoutineKind, wake: Wake) -> CancelToken {
        let token = CancelToken::Generation(self.generation);
        self.pending.push(Scheduled { kind, wake, token });
        token
    }

    pub fn schedule_detached(&mut self, kind: RoutineKind, wake: Wake) {
        self.pending.push(Scheduled {
            kind,
            wake,
            token: CancelToken::Detached,
        });
    }

    /// Новое поколение: все привязанные routines отменены
    pub fn invalidate(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.pending.retain(|routine| match routine.token {
            CancelToken::Detached => true,
            CancelToken::Generation(g) => g == generation,
        });
    }

    /// Отменить всё, включая detached (терминальное состояние)
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        self.pending.clear();
    }

    pub fn is_live(&self, token: CancelToken) -> bool {
        match token {
            CancelToken::Detached => true,
            CancelToken::Generation(g) => g == self.generation,
        }
    }

    /// Продвигает таймеры на один тик, возвращает проснувшиеся routines
    /// в порядке планирования вместе с их токенами.
    pub fn advance(&mut self, delta: f32) -> Vec<(RoutineKind, CancelToken)> {
        let mut due = Vec::new();

        self.pending.retain_mut(|routine| {
            let ready = match &mut routine.wake {
                Wake::Ticks(ticks) => {
                    *ticks = ticks.saturating_sub(1);
                    *ticks == 0
                }
                Wake::Seconds(seconds) => {
                    *seconds -= delta;
                    *seconds <= 0.0
                }
            };
            if ready {
                due.push((routine.kind, routine.token));
            }
            !ready
        });

        due
    }

    pub fn is_pending(&self, kind: RoutineKind) -> bool {
        self.pending.iter().any(|routine| routine.kind == kind)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
