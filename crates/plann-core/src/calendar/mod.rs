//! Calendar object model, relation graph and the collaborator interface.

mod edit;
mod memory;
mod object;
mod relation;
mod select;
mod store;

pub use edit::{TaskCommand, TaskEdit};
pub use memory::InMemoryCalendar;
pub use object::{
    CalendarEvent, CalendarObject, CalendarTask, EventStatus, Relation, RelationClass,
    RelationType, TaskStatus,
};
pub use relation::RelationGraph;
pub use select::{agenda, due_before, total_duration, Agenda};
pub use store::{CalendarStore, DependencyCheck, ObjectKinds, SearchQuery};
