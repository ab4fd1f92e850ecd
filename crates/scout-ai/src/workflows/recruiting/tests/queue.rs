use std::collections::HashSet;
use std::sync::Arc;

use super::common::*;
use crate::workflows::recruiting::domain::{CandidateId, ReviewStatus};
use crate::workflows::recruiting::queue::{QueueError, SourcingStatus};

#[test]
fn append_assigns_sequential_ids_as_pending() {
    let queue = queue_with(&["Ada Park", "Ben Ortiz", "Cleo Wu"]);

    let pending = queue.list_by_status(ReviewStatus::Pending);
    let ids: Vec<&str> = pending.iter().map(|view| view.candidate.id.0.as_str()).collect();
    assert_eq!(ids, vec!["cand-0001", "cand-0002", "cand-0003"]);
    assert!(pending
        .iter()
        .all(|view| view.candidate.job_id == *queue.job_id()));

    let stats = queue.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 3);
}

#[test]
fn append_drops_duplicates_and_malformed_entries() {
    let queue = queue_with(&["Ada Park"]);

    let mut anonymous = sourced("", 70);
    anonymous.profile.email = None;
    let report = queue.append(vec![
        sourced("Ada Park", 88),
        sourced("Dina Cole", 101),
        anonymous,
        sourced("Eli Stone", 64),
        sourced("Eli Stone", 64),
    ]);

    assert_eq!(report.appended, vec![CandidateId("cand-0002".to_string())]);
    assert_eq!(report.duplicates, 2);
    assert_eq!(report.invalid, 2);
    assert_eq!(queue.len(), 2);
}

#[test]
fn next_pending_is_fifo_and_marks_viewed() {
    let queue = queue_with(&["Ada Park", "Ben Ortiz"]);

    let first = queue.next_pending().expect("first candidate");
    assert_eq!(first.candidate.profile.name, "Ada Park");
    assert_eq!(first.status, ReviewStatus::Viewed);

    let second = queue.next_pending().expect("second candidate");
    assert_eq!(second.candidate.profile.name, "Ben Ortiz");
    assert!(queue.next_pending().is_none());

    queue.append(vec![sourced("Cleo Wu", 50)]);
    let third = queue.next_pending().expect("appended candidate");
    assert_eq!(third.candidate.profile.name, "Cleo Wu");
}

#[test]
fn concurrent_advances_hand_out_each_candidate_once() {
    let names: Vec<String> = (0..60).map(|n| format!("Person {n}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let queue = queue_with(&refs);

    let handed_out: Vec<CandidateId> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                scope.spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(view) = queue.next_pending() {
                        taken.push(view.candidate.id);
                    }
                    taken
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().expect("worker finished"))
            .collect()
    });

    let unique: HashSet<&CandidateId> = handed_out.iter().collect();
    assert_eq!(handed_out.len(), 60);
    assert_eq!(unique.len(), 60);
    let stats = queue.stats();
    assert_eq!(stats.viewed, 60);
    assert_eq!(stats.pending, 0);
}

#[test]
fn invalid_transitions_leave_state_untouched() {
    let queue = queue_with(&["Ada Park", "Ben Ortiz"]);
    let id = CandidateId("cand-0001".to_string());

    let err = queue
        .transition(&id, &[ReviewStatus::Viewed], ReviewStatus::Accepted)
        .expect_err("pending cannot be accepted");
    assert_eq!(
        err,
        QueueError::InvalidTransition {
            candidate_id: id.clone(),
            from: ReviewStatus::Pending,
            to: ReviewStatus::Accepted,
        }
    );

    queue.next_pending().expect("viewed");
    queue
        .transition(&id, &[ReviewStatus::Viewed], ReviewStatus::Rejected)
        .expect("viewed can be rejected");
    assert!(queue
        .transition(&id, &[ReviewStatus::Viewed], ReviewStatus::Accepted)
        .is_err());
    assert_eq!(
        queue.entry(&id).expect("present").status,
        ReviewStatus::Rejected
    );

    assert_eq!(
        queue.transition(
            &CandidateId("cand-9999".to_string()),
            &[ReviewStatus::Viewed],
            ReviewStatus::Rejected
        ),
        Err(QueueError::CandidateNotFound(CandidateId(
            "cand-9999".to_string()
        )))
    );
    assert!(queue.stats().is_balanced());
}

#[test]
fn reservation_blocks_other_decisions_until_released() {
    let queue = queue_with(&["Ada Park"]);
    let id = queue.next_pending().expect("viewed").candidate.id;

    let reservation = queue
        .reserve(&id, &[ReviewStatus::Viewed], ReviewStatus::Accepted)
        .expect("reserved");
    assert_eq!(reservation.view().status, ReviewStatus::Viewed);
    assert_eq!(
        queue.transition(&id, &[ReviewStatus::Viewed], ReviewStatus::Rejected),
        Err(QueueError::DecisionInFlight(id.clone()))
    );
    assert!(queue
        .reserve(&id, &[ReviewStatus::Viewed], ReviewStatus::Accepted)
        .is_err());

    drop(reservation);
    assert_eq!(queue.entry(&id).expect("present").status, ReviewStatus::Viewed);

    let reservation = queue
        .reserve(&id, &[ReviewStatus::Viewed], ReviewStatus::Accepted)
        .expect("reserved again");
    let committed = reservation.commit().expect("committed");
    assert_eq!(committed.status, ReviewStatus::Accepted);
    assert_eq!(queue.stats().accepted, 1);
}

#[test]
fn stats_match_a_full_recount_after_mixed_operations() {
    let queue = queue_with(&["Ada Park", "Ben Ortiz", "Cleo Wu", "Dina Cole"]);
    let first = queue.next_pending().expect("first").candidate.id;
    let second = queue.next_pending().expect("second").candidate.id;
    queue
        .transition(&first, &[ReviewStatus::Viewed], ReviewStatus::Rejected)
        .expect("reject");
    queue
        .transition(&second, &[ReviewStatus::Viewed], ReviewStatus::Accepted)
        .expect("accept");
    queue
        .transition(&second, &[ReviewStatus::Accepted], ReviewStatus::Contacted)
        .expect("contact");

    let stats = queue.stats();
    assert_eq!(stats, queue.recount());
    assert!(stats.is_balanced());
    assert_eq!(
        (stats.pending, stats.rejected, stats.contacted),
        (2, 1, 1)
    );
}

#[test]
fn sourcing_flag_allows_one_run_at_a_time() {
    let queue = queue_with(&[]);
    assert_eq!(queue.sourcing_status().status, SourcingStatus::Idle);

    queue.begin_sourcing(2).expect("first run");
    assert_eq!(
        queue.begin_sourcing(2),
        Err(QueueError::AlreadyInProgress(queue.job_id().clone()))
    );
    let status = queue.sourcing_status();
    assert_eq!(status.status, SourcingStatus::InProgress);
    assert!(status.started_at.is_some());

    let report = queue.complete_sourcing(vec![sourced("Ada Park", 80), sourced("Ben Ortiz", 70)]);
    assert_eq!(report.appended.len(), 2);
    let status = queue.sourcing_status();
    assert_eq!(status.status, SourcingStatus::Completed);
    assert_eq!(status.last_run.expect("summary").appended, 2);

    queue.begin_sourcing(2).expect("flag cleared");
    queue.fail_sourcing("provider down".to_string());
    let status = queue.sourcing_status();
    assert_eq!(status.status, SourcingStatus::Failed);
    assert_eq!(
        status.last_run.and_then(|run| run.error).as_deref(),
        Some("provider down")
    );
    assert_eq!(queue.len(), 2);
}
