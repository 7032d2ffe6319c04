//! Reading tasks and writing exported records.

mod task;

pub use task::{
    from_task_slice, from_task_str, read_task, to_records_string, Task, TaskAnnotation,
};
