//! Пространственный поиск целей (targeting engine)
//!
//! Контракт: query(origin + shape, filter, selector) → упорядоченный список
//! entity. Конвейер:
//! 1. candidates — все зарегистрированные комбатанты (snapshot, порядок
//!    регистрации);
//! 2. геометрия — containment test формы против bounding box цели
//!    (закрытые границы: ровно на границе = попал);
//! 3. фильтры — фиксированный порядок предикатов, short-circuit;
//! 4. selector — стабильная сортировка + limit / random subset.
//!
//! Движок никогда не лезет в сырые коллизии рендера: снаряды и скиллы
//! переспрашивают его со своей формой и фильтром.

pub mod filter;
pub mod query;
pub mod selector;
pub mod shapes;

pub use filter::{SearchFilter, TargetCandidate, TeamConstraint};
pub use query::{search, TargetQuery};
pub use selector::{ResultSelector, SortMethod};
pub use shapes::SearchArea;
