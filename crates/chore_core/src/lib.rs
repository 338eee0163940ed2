pub mod clock;
pub mod due;
pub mod error;
pub mod grouping;
pub mod recurrence;
pub mod service;
pub mod task;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::due::{describe_due_date, DueDescription, Tone};
pub use crate::error::TaskError;
pub use crate::grouping::{compare, group, GroupingMode, TaskGroup};
pub use crate::recurrence::{describe_recurrence, ordinal_suffix, strip_leading_emoji, Recurrence};
pub use crate::service::{BoardSnapshot, ChoreBoard, ChoreBoardBuilder, TaskView};
pub use crate::task::{parse_task, parse_tasks, DueDate, Label, Priority, RecordId, Task};
