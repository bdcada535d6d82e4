//! Условия уничтожения снаряда
//!
//! Предикат над наблюдаемым состоянием снаряда. Проверяется после движения
//! и модулей; жёсткий потолок life_time применяется снаружи независимо.

/// Наблюдаемое состояние снаряда для предиката
#[derive(Debug, Clone, Copy)]
pub struct DestructionView {
    pub life_time: f32,
    /// Сколько целей уже получили урон
    pub hit_count: u32,
    /// Сколько статичных препятствий снаряд прошёл насквозь
    pub obstacles_passed: u32,
    /// Кнопка скилла отпущена
    pub released: bool,
    pub distance_from_origin: f32,
}

/// Условие уничтожения
///
/// HitTargetCount считает поражённые цели; ObstaclePenetration — пробитые
/// стены (раздельные счётчики, см. DESIGN.md).
#[derive(Debug, Clone)]
pub enum DestructionCondition {
    /// life_time ≥ duration
    Time { duration: f32 },
    /// Поражено ≥ count целей
    HitTargetCount { count: u32 },
    /// Пробито больше max_passes препятствий
    ObstaclePenetration { max_passes: u32 },
    /// Кнопка отпущена
    ButtonRelease,
    /// Улетел дальше max_distance от точки выстрела
    Range { max_distance: f32 },
    /// Любое из вложенных условий
    AnyOf(Vec<DestructionCondition>),
    /// Непрозрачный предикат
    Custom(fn(&DestructionView) -> bool),
}

impl DestructionCondition {
    pub fn should_destroy(&self, view: &DestructionView) -> bool {
        match self {
            Self::Time { duration } => view.life_time >= *duration,
            Self::HitTargetCount { count } => view.hit_count >= *count,
            Self::ObstaclePenetration { max_passes } => view.obstacles_passed > *max_passes,
            Self::ButtonRelease => view.released,
            Self::Range { max_distance } => view.distance_from_origin >= *max_distance,
            Self::AnyOf(conditions) => conditions.iter().any(|c| c.should_destroy(view)),
            Self::Custom(predicate) => predicate(view),
        }
    }
}
