//! Формы области поиска и containment-тесты
//!
//! Все тесты идут против bounding box цели (центр + half-extents), не против
//! точки: крупная цель ловится кругом, чей центр вне её бокса, но радиус
//! достаёт. Границы закрытые. Углы в градусах, против часовой от +X.

use bevy::prelude::*;

/// Форма области, заякоренная в точке запроса
#[derive(Debug, Clone, Reflect, serde::Serialize, serde::Deserialize)]
pub enum SearchArea {
    Circle {
        radius: f32,
    },
    Rectangle {
        width: f32,
        height: f32,
        /// Поворот прямоугольника (градусы)
        angle: f32,
    },
    Sector {
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
    /// Линия = тонкий прямоугольник длиной length вдоль angle
    Line {
        length: f32,
        width: f32,
        angle: f32,
    },
}

/// Нормализация угла в [0, 360)
fn normalize_deg(angle: f32) -> f32 {
    let a = angle % 360.0;
    if a < 0.0 {
        a + 360.0
    } else {
        a
    }
}

impl SearchArea {
    /// Попадает ли бокс (center, half) в форму, заякоренную в origin
    pub fn contains(&self, origin: Vec2, center: Vec2, half: Vec2) -> bool {
        match *self {
            SearchArea::Circle { radius } => circle_hits_aabb(origin, radius, center, half),
            SearchArea::Rectangle {
                width,
                height,
                angle,
            } => rect_hits_aabb(origin, width, height, angle, center, half),
            SearchArea::Sector {
                radius,
                start_angle,
                end_angle,
            } => sector_hits_point(origin, radius, start_angle, end_angle, center),
            SearchArea::Line {
                length,
                width,
                angle,
            } => {
                // Прямоугольник, вытянутый от origin вдоль angle
                let dir = Vec2::from_angle(angle.to_radians());
                let rect_center = origin + dir * (length * 0.5);
                rect_hits_aabb_at(rect_center, length, width, angle, center, half)
            }
        }
    }
}

/// Circle vs AABB: ближайшая точка бокса к центру круга не дальше радиуса
fn circle_hits_aabb(circle_center: Vec2, radius: f32, box_center: Vec2, half: Vec2) -> bool {
    let min = box_center - half;
    let max = box_center + half;
    let closest = Vec2::new(
        circle_center.x.clamp(min.x, max.x),
        circle_center.y.clamp(min.y, max.y),
    );
    circle_center.distance_squared(closest) <= radius * radius
}

fn rect_hits_aabb(
    origin: Vec2,
    width: f32,
    height: f32,
    angle: f32,
    box_center: Vec2,
    half: Vec2,
) -> bool {
    rect_hits_aabb_at(origin, width, height, angle, box_center, half)
}

/// Rectangle (возможно повёрнутый) vs AABB
///
/// angle == 0 — обычный AABB overlap. Иначе центр цели переводится в
/// локальный кадр прямоугольника (обратный поворот) и сравнивается с суммой
/// half-extents — специализированный SAT для пары "повёрнутый rect + AABB".
fn rect_hits_aabb_at(
    rect_center: Vec2,
    width: f32,
    height: f32,
    angle: f32,
    box_center: Vec2,
    half: Vec2,
) -> bool {
    let rect_half = Vec2::new(width * 0.5, height * 0.5);
    let norm = normalize_deg(angle);

    if norm == 0.0 {
        let d = box_center - rect_center;
        return d.x.abs() <= rect_half.x + half.x && d.y.abs() <= rect_half.y + half.y;
    }

    // Обратный поворот: цель в локальных осях прямоугольника
    let inv = Vec2::from_angle(-norm.to_radians());
    let local = inv.rotate(box_center - rect_center);
    local.x.abs() <= rect_half.x + half.x && local.y.abs() <= rect_half.y + half.y
}

/// Sector: полярный тест по центру цели
///
/// start == end — сектор нулевой ширины: проходит только цель ровно на этом
/// угле (документированное решение, НЕ полный круг).
/// start > end — дуга через 0°: angle ≥ start ИЛИ angle ≤ end.
fn sector_hits_point(
    origin: Vec2,
    radius: f32,
    start_angle: f32,
    end_angle: f32,
    point: Vec2,
) -> bool {
    let offset = point - origin;
    if offset.length_squared() > radius * radius {
        return false;
    }

    // Цель ровно в origin — угол не определён, считаем попаданием
    if offset.length_squared() < 1e-12 {
        return true;
    }

    let angle = normalize_deg(offset.to_angle().to_degrees());
    let start = normalize_deg(start_angle);
    let end = normalize_deg(end_angle);

    if (start - end).abs() < 1e-6 {
        return (angle - start).abs() < 1e-3;
    }

    // Допуск на float-шум atan2/to_degrees: границы закрытые
    const ANGLE_EPS: f32 = 1e-3;
    if start <= end {
        angle >= start - ANGLE_EPS && angle <= end + ANGLE_EPS
    } else {
        angle >= start - ANGLE_EPS || angle <= end + ANGLE_EPS
    }
}
