use chrono::{Local, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::classify::{classify, Bucket, Buckets};
use crate::error::{PlannerError, Result};
use crate::models::{NewTask, Priority, Task, TaskId};
use crate::schedule::{suggest_schedule, ScheduleBoard, ScheduleOutcome, SchedulingEngine};
use crate::store::{toggle_completed, TaskStore};

/// Prints `err` on stderr unless `silent`, then hands the result back.
fn report<T>(result: Result<T>, silent: bool) -> Result<T> {
    if let Err(e) = &result {
        if !silent {
            eprintln!("Error: {}", e);
        }
    }
    result
}

/// Resolves a full id or a unique id prefix against `tasks`.
pub fn resolve_id(tasks: &[Task], input: &str) -> Result<TaskId> {
    let input = input.trim();
    if let Some(t) = tasks.iter().find(|t| t.id.as_str() == input) {
        return Ok(t.id.clone());
    }
    let mut matches = tasks.iter().filter(|t| !input.is_empty() && t.id.as_str().starts_with(input));
    match (matches.next(), matches.next()) {
        (Some(t), None) => Ok(t.id.clone()),
        (Some(_), Some(_)) => Err(PlannerError::AmbiguousId(input.to_owned())),
        _ => Err(PlannerError::NotFound(TaskId::from(input))),
    }
}

async fn add_task(
    store: &dyn TaskStore,
    name: &str,
    description: &str,
    due: Option<&str>,
    priority: &str,
    hours: &str,
) -> Result<Vec<Task>> {
    let draft = NewTask::parse(name, description, due, priority, hours)?;
    store.create(draft).await
}

async fn toggle_task(store: &dyn TaskStore, input: &str) -> Result<(TaskId, Vec<Task>)> {
    let id = resolve_id(&store.list().await?, input)?;
    let tasks = toggle_completed(store, &id).await?;
    Ok((id, tasks))
}

async fn remove_task(store: &dyn TaskStore, input: &str) -> Result<(TaskId, Vec<Task>)> {
    let id = resolve_id(&store.list().await?, input)?;
    let tasks = store.delete(&id).await?;
    Ok((id, tasks))
}

/// Validates the draft and adds it to the store.
///
/// Validation failures are reported without touching the store.
pub async fn cmd_add(
    store: &dyn TaskStore,
    name: String,
    description: String,
    due: Option<String>,
    priority: String,
    hours: String,
    silent: bool,
) -> Result<Vec<Task>> {
    let result = add_task(store, &name, &description, due.as_deref(), &priority, &hours).await;
    let tasks = report(result, silent)?;
    if !silent {
        println!("Task \"{}\" added.", name.trim());
    }
    Ok(tasks)
}

/// Flips a task between open and completed.
pub async fn cmd_toggle(store: &dyn TaskStore, id: String, silent: bool) -> Result<Vec<Task>> {
    let result = toggle_task(store, &id).await;
    let (id, tasks) = report(result, silent)?;
    if !silent {
        let state = tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| if t.completed { "completed" } else { "reopened" })
            .unwrap_or("updated");
        println!("Task {} {}.", short_id(&id), state);
    }
    Ok(tasks)
}

/// Removes a task from the store.
pub async fn cmd_remove(store: &dyn TaskStore, id: String, silent: bool) -> Result<Vec<Task>> {
    let result = remove_task(store, &id).await;
    let (id, tasks) = report(result, silent)?;
    if !silent {
        println!("Task {} deleted.", short_id(&id));
    }
    Ok(tasks)
}

/// The sections `cmd_list` prints, in order.
///
/// Overdue only shows up when it has tasks; completed shows unless
/// `hide_completed`.
pub fn visible_buckets(buckets: &Buckets, hide_completed: bool) -> Vec<Bucket> {
    let mut shown = vec![Bucket::Today, Bucket::Upcoming];
    if !buckets.overdue.is_empty() {
        shown.push(Bucket::Overdue);
    }
    if !hide_completed {
        shown.push(Bucket::Completed);
    }
    shown
}

/// Lists tasks grouped into today / upcoming / overdue / completed.
pub async fn cmd_list(store: &dyn TaskStore, hide_completed: bool, silent: bool) -> Result<Buckets> {
    let tasks = report(store.list().await, silent)?;
    let buckets = classify(&tasks, &Local::now());
    if silent {
        return Ok(buckets);
    }

    for bucket in visible_buckets(&buckets, hide_completed) {
        let (title, empty) = match bucket {
            Bucket::Today => ("Today's Tasks", "No tasks due today. Great job or add some!"),
            Bucket::Upcoming => ("Upcoming Tasks", "No upcoming tasks. Plan ahead!"),
            Bucket::Overdue => ("Overdue Tasks", ""),
            Bucket::Completed => ("Completed Tasks", "No tasks completed yet. Get to it!"),
        };
        print_bucket(title, buckets.get(bucket), empty);
    }
    Ok(buckets)
}

/// Asks the engine for a schedule of all open tasks and prints it.
pub async fn cmd_schedule(
    store: &dyn TaskStore,
    engine: &dyn SchedulingEngine,
    silent: bool,
) -> Result<ScheduleBoard> {
    let tasks = report(store.list().await, silent)?;
    let outcome = suggest_schedule(engine, &tasks).await;

    let mut board = ScheduleBoard::new();
    board.apply(&outcome);

    match outcome {
        Err(e) => report(Err(e.into()), silent),
        Ok(ScheduleOutcome::NothingToSchedule) => {
            if !silent {
                println!("No active tasks. Add some tasks or reopen existing ones to generate a schedule.");
            }
            Ok(board)
        }
        Ok(ScheduleOutcome::Suggested(_)) => {
            if !silent {
                print_schedule(&board);
            }
            Ok(board)
        }
    }
}

fn short_id(id: &TaskId) -> &str {
    let s = id.as_str();
    s.get(..8).unwrap_or(s)
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn print_bucket(title: &str, tasks: &[Task], empty_message: &str) {
    println!("{}", title);
    if tasks.is_empty() {
        println!("  {}\n", empty_message);
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Est").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let now = Utc::now();
    for t in tasks {
        let due = t
            .due_date
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        let due_color = match t.due_date {
            Some(d) if d < now && !t.completed => Color::Red,
            _ => Color::Reset,
        };
        let status = if t.completed { "Done" } else { "Pending" };
        let status_color = if t.completed { Color::Green } else { Color::Yellow };

        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.name),
            Cell::new(&t.description),
            Cell::new(due).fg(due_color),
            Cell::new(t.priority.label()).fg(priority_color(t.priority)),
            Cell::new(format!("{}h", t.estimated_hours)),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}\n");
}

fn print_schedule(board: &ScheduleBoard) {
    if board.is_empty() {
        println!("The engine returned an empty schedule.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Task").add_attribute(Attribute::Bold),
            Cell::new("Start").add_attribute(Attribute::Bold),
            Cell::new("End").add_attribute(Attribute::Bold),
            Cell::new("Reasoning").add_attribute(Attribute::Bold),
        ]);

    let fmt_time = |raw: &str, parsed: Option<chrono::DateTime<chrono::FixedOffset>>| {
        parsed
            .map(|t| t.with_timezone(&Local).format("%a %H:%M").to_string())
            .unwrap_or_else(|| raw.to_owned())
    };

    for item in board.items() {
        table.add_row(vec![
            Cell::new(&item.task_name),
            Cell::new(fmt_time(&item.start_time, item.start())),
            Cell::new(fmt_time(&item.end_time, item.end())),
            Cell::new(&item.reasoning),
        ]);
    }

    println!("{table}");
}
