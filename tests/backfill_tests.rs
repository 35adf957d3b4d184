use rattendance::core::aggregate::day_status;
use rattendance::core::backfill::detect_and_synthesize;
use rattendance::models::AttendanceStatus::{CheckIn, CheckOut};
use rattendance::models::{BackfillKind, EventFilter, EventOrigin, EventSource};

mod common;
use common::{
    FakeGateway, api_over, day, kst, new_event, remote_event, sid, store_with, student, ts,
};

#[test]
fn test_policy_times() {
    let events = vec![
        // ongoing
        remote_event("a", "10101", "Kim", CheckIn, ts("2026-10-19", "07:00")),
        // missing: check-out only
        remote_event("b", "10102", "Lee", CheckOut, ts("2026-10-19", "07:45")),
        // completed
        remote_event("c", "10103", "Park", CheckIn, ts("2026-10-19", "07:01")),
        remote_event("c", "10103", "Park", CheckOut, ts("2026-10-19", "07:42")),
    ];

    let records = detect_and_synthesize(day("2026-10-19"), &day_status(&events), &kst());
    assert_eq!(records.len(), 2);

    let kim = records.iter().find(|r| r.student_id == sid("10101")).unwrap();
    assert_eq!(kim.kind, BackfillKind::MissingCheckOut);
    assert_eq!(kim.status, CheckOut);
    assert_eq!(kim.timestamp, ts("2026-10-19", "07:47"));

    let lee = records.iter().find(|r| r.student_id == sid("10102")).unwrap();
    assert_eq!(lee.kind, BackfillKind::MissingCheckIn);
    assert_eq!(lee.status, CheckIn);
    assert_eq!(lee.timestamp, ts("2026-10-19", "07:10"));
}

#[test]
fn test_completed_day_needs_nothing() {
    let events = vec![
        remote_event("c", "10103", "Park", CheckIn, ts("2026-10-19", "07:00")),
        remote_event("c", "10103", "Park", CheckOut, ts("2026-10-19", "07:40")),
    ];
    assert!(detect_and_synthesize(day("2026-10-19"), &day_status(&events), &kst()).is_empty());
}

#[tokio::test]
async fn test_process_then_commit_walks_the_state_machine() {
    let store = store_with(vec![new_event(
        "10101",
        "Kim",
        CheckIn,
        ts("2026-10-19", "07:00"),
    )]);
    let (mut api, _fake) = api_over(
        store,
        FakeGateway::online().with_students(vec![student("10101", "Kim"), student("10102", "Lee")]),
    );
    let date = day("2026-10-19");

    let plan = api.process_missing(date).await.unwrap();
    assert!(plan.roster_applied);
    assert!(!plan.provenance.is_fallback());
    assert_eq!(plan.records.len(), 2);

    // Nothing stored until commit.
    assert_eq!(api.store().count().unwrap(), 1);

    let committed = api.commit_backfill(&plan.records).unwrap();
    assert_eq!(committed.len(), 2);
    assert!(committed.iter().all(|e| e.origin == EventOrigin::Policy));
    assert!(committed.iter().all(|e| e.source == EventSource::Offline));

    // Committing the same plan again stores nothing.
    assert!(api.commit_backfill(&plan.records).unwrap().is_empty());
    assert_eq!(api.store().count().unwrap(), 3);

    // Lee now has a synthetic check-in; the next pass closes the day.
    let second = api.process_missing(date).await.unwrap();
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].student_id, sid("10102"));
    assert_eq!(second.records[0].kind, BackfillKind::MissingCheckOut);
    api.commit_backfill(&second.records).unwrap();

    let third = api.process_missing(date).await.unwrap();
    assert!(third.records.is_empty());

    let lee = api
        .store()
        .query(&EventFilter::for_student(sid("10102")))
        .unwrap();
    assert_eq!(lee.len(), 2);
    assert!(lee.iter().all(|e| e.is_policy_generated()));
}

#[tokio::test]
async fn test_process_without_roster_only_sees_students_with_events() {
    let store = store_with(vec![new_event(
        "10101",
        "Kim",
        CheckIn,
        ts("2026-10-19", "07:00"),
    )]);
    let (api, _fake) = api_over(store, FakeGateway::offline());

    let plan = api.process_missing(day("2026-10-19")).await.unwrap();
    assert!(!plan.roster_applied);
    assert!(plan.provenance.is_fallback());
    assert_eq!(plan.records.len(), 1);
    assert_eq!(plan.records[0].timestamp, ts("2026-10-19", "07:47"));
}
