use chrono::{DateTime, TimeZone};
use crate::models::Task;

/// The list a task is displayed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Today,
    Upcoming,
    Overdue,
    Completed,
}

/// Tasks partitioned by due status. Every task lands in exactly one list,
/// and each list keeps the order of the input collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub today: Vec<Task>,
    pub upcoming: Vec<Task>,
    pub overdue: Vec<Task>,
    pub completed: Vec<Task>,
}

impl Buckets {
    pub fn len(&self) -> usize {
        self.today.len() + self.upcoming.len() + self.overdue.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, bucket: Bucket) -> &[Task] {
        match bucket {
            Bucket::Today => &self.today,
            Bucket::Upcoming => &self.upcoming,
            Bucket::Overdue => &self.overdue,
            Bucket::Completed => &self.completed,
        }
    }
}

/// Classifies a single task relative to `now`.
///
/// - **Completed**: the `completed` flag is set, regardless of due date.
/// - **Today**: due on the same calendar day as `now`, in `now`'s time zone.
/// - **Upcoming**: no due date, or due strictly after `now` on a later day.
/// - **Overdue**: due strictly before `now` on an earlier day.
pub fn bucket_of<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Bucket {
    if task.completed {
        return Bucket::Completed;
    }
    let Some(due) = task.due_date else {
        return Bucket::Upcoming;
    };
    let due_local = due.with_timezone(&now.timezone());
    if due_local.date_naive() == now.date_naive() {
        Bucket::Today
    } else if due_local > *now {
        Bucket::Upcoming
    } else {
        Bucket::Overdue
    }
}

/// Partitions `tasks` into buckets. Recomputed on every call.
pub fn classify<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Buckets {
    let mut buckets = Buckets::default();
    for task in tasks {
        let list = match bucket_of(task, now) {
            Bucket::Today => &mut buckets.today,
            Bucket::Upcoming => &mut buckets.upcoming,
            Bucket::Overdue => &mut buckets.overdue,
            Bucket::Completed => &mut buckets.completed,
        };
        list.push(task.clone());
    }
    buckets
}
