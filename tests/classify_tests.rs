use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use daywise::classify::{bucket_of, classify, Bucket};
use daywise::models::{EstimatedHours, Priority, Task, TaskId};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

fn task(id: &str, due: Option<DateTime<Utc>>, completed: bool) -> Task {
    Task {
        id: TaskId::from(id),
        name: format!("Task {}", id),
        description: "Test".into(),
        due_date: due,
        priority: Priority::Medium,
        estimated_hours: EstimatedHours::new(1.0).unwrap(),
        completed,
        created_at: None,
    }
}

#[test]
fn test_completed_tasks_only_in_completed() {
    let now = now();
    let tasks = vec![
        task("a", None, true),
        task("b", Some(now), true),
        task("c", Some(now + Duration::days(3)), true),
        task("d", Some(now - Duration::days(3)), true),
    ];
    let buckets = classify(&tasks, &now);
    assert_eq!(buckets.completed.len(), 4);
    assert!(buckets.today.is_empty());
    assert!(buckets.upcoming.is_empty());
    assert!(buckets.overdue.is_empty());
}

#[test]
fn test_no_due_date_is_upcoming_never_today() {
    let now = now();
    assert_eq!(bucket_of(&task("a", None, false), &now), Bucket::Upcoming);
}

#[test]
fn test_due_today_is_today() {
    let now = now();
    let morning = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
    let evening = Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 0).unwrap();
    let buckets = classify(&[task("a", Some(morning), false), task("b", Some(evening), false)], &now);
    assert_eq!(buckets.today.len(), 2);
    // Later today is not also upcoming.
    assert!(buckets.upcoming.is_empty());
}

#[test]
fn test_future_day_is_upcoming() {
    let now = now();
    let tomorrow = now + Duration::days(1);
    assert_eq!(bucket_of(&task("a", Some(tomorrow), false), &now), Bucket::Upcoming);
}

#[test]
fn test_past_day_is_overdue_not_dropped() {
    let now = now();
    let yesterday = now - Duration::days(1);
    let buckets = classify(&[task("a", Some(yesterday), false)], &now);
    assert_eq!(buckets.overdue.len(), 1);
    assert_eq!(buckets.len(), 1);
}

#[test]
fn test_every_task_lands_in_exactly_one_bucket() {
    let now = now();
    let tasks: Vec<Task> = (-3..=3)
        .flat_map(|d| {
            let due = now + Duration::hours(d * 10);
            vec![
                task(&format!("open{}", d), Some(due), false),
                task(&format!("done{}", d), Some(due), true),
            ]
        })
        .chain(std::iter::once(task("nodue", None, false)))
        .collect();
    let buckets = classify(&tasks, &now);
    assert_eq!(buckets.len(), tasks.len());
    for t in &tasks {
        let hits = [Bucket::Today, Bucket::Upcoming, Bucket::Overdue, Bucket::Completed]
            .iter()
            .filter(|b| buckets.get(**b).iter().any(|x| x.id == t.id))
            .count();
        assert_eq!(hits, 1, "task {} in {} buckets", t.id, hits);
    }
}

#[test]
fn test_calendar_day_follows_now_timezone() {
    // 23:30 UTC on the 9th is already the 10th in UTC+2.
    let due = Utc.with_ymd_and_hms(2025, 3, 9, 23, 30, 0).unwrap();
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let now_local = plus_two.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    assert_eq!(bucket_of(&task("a", Some(due), false), &now_local), Bucket::Today);
    assert_eq!(bucket_of(&task("a", Some(due), false), &now()), Bucket::Overdue);
}

#[test]
fn test_toggle_twice_restores_bucket() {
    let now = now();
    let mut t = task("a", Some(now + Duration::days(2)), false);
    let before = bucket_of(&t, &now);
    t.completed = !t.completed;
    assert_eq!(bucket_of(&t, &now), Bucket::Completed);
    t.completed = !t.completed;
    assert_eq!(bucket_of(&t, &now), before);
}

#[test]
fn test_bucket_order_follows_collection() {
    let now = now();
    let tasks = vec![task("z", None, false), task("a", None, false), task("m", None, false)];
    let buckets = classify(&tasks, &now);
    let ids: Vec<&str> = buckets.upcoming.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["z", "a", "m"]);
}
