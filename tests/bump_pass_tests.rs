//! Tests for the bump passes
//!
//! These tests drive full member and cycle passes against mock chain
//! collaborators and assert on the due-sets, the submitted transactions,
//! and the failure signals.

use std::sync::Arc;

use fellowship_bumper::chain::mock::{MockChainReader, RecordingSubmitter};
use fellowship_bumper::chain::SubmitError;
use fellowship_bumper::{
    AccountId, BumpCall, BumpError, Bumper, BumperConfig, FellowshipBumper, MemberRecord, Pass,
    Sender, TransactionRequest,
};

fn setup() -> (Arc<MockChainReader>, Arc<RecordingSubmitter>, FellowshipBumper) {
    setup_with_config(BumperConfig::default())
}

fn setup_with_config(
    config: BumperConfig,
) -> (Arc<MockChainReader>, Arc<RecordingSubmitter>, FellowshipBumper) {
    let reader = Arc::new(MockChainReader::new());
    let submitter = Arc::new(RecordingSubmitter::new());
    let bumper = FellowshipBumper::new(reader.clone(), submitter.clone(), config);
    (reader, submitter, bumper)
}

fn sender() -> Sender {
    Sender::new("bump-bot")
}

#[tokio::test]
async fn stale_member_past_its_period_is_bumped() {
    // Scenario: rank 3, demotionPeriod[2] = 100, proof at block 50,
    // current block 151 (gap 101 > 100).
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(151);
    reader.set_period_table(vec![10, 50, 100]);
    reader.add_member(MemberRecord::new("X", false, 50));
    reader.set_rank("X", 3);

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(due, vec![AccountId::from("X")]);
    assert_eq!(
        submitter.requests(),
        vec![TransactionRequest::Single(BumpCall::Member(
            AccountId::from("X")
        ))]
    );
}

#[tokio::test]
async fn member_exactly_at_its_period_is_not_bumped() {
    // Same as above with current block 150: gap 100 == 100, not due.
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(150);
    reader.set_period_table(vec![10, 50, 100]);
    reader.add_member(MemberRecord::new("X", false, 50));
    reader.set_rank("X", 3);

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert!(due.is_empty());
    assert_eq!(submitter.request_count(), 0);
}

#[tokio::test]
async fn active_member_is_never_bumped() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1_000_000);
    reader.set_period_table(vec![10]);
    reader.add_member(MemberRecord::new("X", true, 0));
    reader.set_rank("X", 1);

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert!(due.is_empty());
    assert_eq!(submitter.request_count(), 0);
}

#[tokio::test]
async fn member_without_rank_record_is_never_bumped() {
    // Absent from the rank collection means rank 0: no demotion period.
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1_000_000);
    reader.set_period_table(vec![10]);
    reader.add_member(MemberRecord::new("X", false, 0));

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert!(due.is_empty());
    assert_eq!(submitter.request_count(), 0);
}

#[tokio::test]
async fn member_with_rank_beyond_the_table_is_never_bumped() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1_000_000);
    reader.set_period_table(vec![10, 50]);
    reader.add_member(MemberRecord::new("X", false, 0));
    reader.set_rank("X", 9);

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert!(due.is_empty());
    assert_eq!(submitter.request_count(), 0);
}

#[tokio::test]
async fn several_due_members_are_bumped_in_one_atomic_batch() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1000);
    reader.set_period_table(vec![100]);
    for name in ["A", "B", "C"] {
        reader.add_member(MemberRecord::new(name, false, 0));
        reader.set_rank(name, 1);
    }

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(
        due,
        vec![
            AccountId::from("A"),
            AccountId::from("B"),
            AccountId::from("C")
        ]
    );
    // Exactly one request: an atomic batch of 3 in discovery order.
    assert_eq!(
        submitter.requests(),
        vec![TransactionRequest::BatchAll(vec![
            BumpCall::Member(AccountId::from("A")),
            BumpCall::Member(AccountId::from("B")),
            BumpCall::Member(AccountId::from("C")),
        ])]
    );
}

#[tokio::test]
async fn mixed_membership_only_bumps_the_stale_inactive_ones() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(500);
    reader.set_period_table(vec![100, 200]);
    // Stale and inactive: due.
    reader.add_member(MemberRecord::new("stale", false, 100));
    reader.set_rank("stale", 1);
    // Stale but active: not due.
    reader.add_member(MemberRecord::new("active", true, 100));
    reader.set_rank("active", 1);
    // Inactive but recent: not due.
    reader.add_member(MemberRecord::new("recent", false, 450));
    reader.set_rank("recent", 1);

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(due, vec![AccountId::from("stale")]);
    assert_eq!(submitter.request_count(), 1);
}

#[tokio::test]
async fn member_pass_is_idempotent_for_identical_chain_state() {
    let (reader, _submitter, bumper) = setup();
    reader.set_current_block(1000);
    reader.set_period_table(vec![100]);
    reader.add_member(MemberRecord::new("A", false, 0));
    reader.set_rank("A", 1);
    reader.add_member(MemberRecord::new("B", false, 900));
    reader.set_rank("B", 1);

    let first = bumper.run_member_pass(&sender()).await.unwrap();
    let second = bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn malformed_member_entry_is_skipped_not_fatal() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1000);
    reader.set_period_table(vec![100]);
    reader.add_member(MemberRecord::new("A", false, 0));
    reader.set_rank("A", 1);
    reader.add_malformed_member("member B: missing field `lastProof`");
    reader.add_member(MemberRecord::new("C", false, 0));
    reader.set_rank("C", 1);

    let due = bumper.run_member_pass(&sender()).await.unwrap();

    // The pass still evaluates the rest of the membership.
    assert_eq!(due, vec![AccountId::from("A"), AccountId::from("C")]);
    assert_eq!(submitter.request_count(), 1);
}

#[tokio::test]
async fn unavailable_block_height_aborts_the_member_pass() {
    let (reader, submitter, bumper) = setup();
    reader.fail_current_block("rpc timeout");

    let err = bumper.run_member_pass(&sender()).await.unwrap_err();

    assert_eq!(err.pass(), Pass::Member);
    assert!(matches!(err, BumpError::DataUnavailable { .. }));
    assert_eq!(submitter.request_count(), 0);
}

#[tokio::test]
async fn submission_failure_surfaces_as_a_member_pass_failure() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1000);
    reader.set_period_table(vec![100]);
    reader.add_member(MemberRecord::new("A", false, 0));
    reader.set_rank("A", 1);
    submitter.fail_with(SubmitError::Rejected("bad nonce".to_string()));

    let err = bumper.run_member_pass(&sender()).await.unwrap_err();

    assert_eq!(err.pass(), Pass::Member);
    assert!(matches!(err, BumpError::Submission { .. }));
}

#[tokio::test]
async fn period_table_is_fetched_once_across_passes_by_default() {
    let (reader, _submitter, bumper) = setup();
    reader.set_current_block(1000);
    reader.set_period_table(vec![100]);
    reader.add_member(MemberRecord::new("A", false, 500));
    reader.set_rank("A", 1);

    bumper.run_member_pass(&sender()).await.unwrap();
    bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(reader.period_table_reads(), 1);
}

#[tokio::test]
async fn period_table_is_refetched_each_pass_when_configured() {
    let (reader, _submitter, bumper) = setup_with_config(BumperConfig {
        reload_periods_each_pass: true,
    });
    reader.set_current_block(1000);
    reader.set_period_table(vec![100]);
    reader.add_member(MemberRecord::new("A", false, 500));
    reader.set_rank("A", 1);

    bumper.run_member_pass(&sender()).await.unwrap();
    bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(reader.period_table_reads(), 2);
}

#[tokio::test]
async fn rank_zero_membership_never_loads_the_period_table() {
    let (reader, _submitter, bumper) = setup();
    reader.set_current_block(1000);
    reader.add_member(MemberRecord::new("A", false, 0));

    bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(reader.period_table_reads(), 0);
}

#[tokio::test]
async fn cycle_past_both_periods_is_bumped() {
    // Scenario: cycleStart 1000, registration 50, payout 50, block 1101.
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1101);
    reader.set_cycle_status(7, 1000);
    reader.set_cycle_periods(50, 50);

    let bumped = bumper.run_cycle_pass(&sender()).await.unwrap();

    assert_eq!(bumped, Some(7));
    assert_eq!(
        submitter.requests(),
        vec![TransactionRequest::Single(BumpCall::SalaryCycle)]
    );
}

#[tokio::test]
async fn cycle_exactly_at_the_boundary_is_not_bumped() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1100);
    reader.set_cycle_status(7, 1000);
    reader.set_cycle_periods(50, 50);

    let bumped = bumper.run_cycle_pass(&sender()).await.unwrap();

    assert_eq!(bumped, None);
    assert_eq!(submitter.request_count(), 0);
}

#[tokio::test]
async fn malformed_cycle_status_aborts_the_cycle_pass() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1101);
    reader.fail_cycle_status_malformed("cycle status: invalid type");
    reader.set_cycle_periods(50, 50);

    let err = bumper.run_cycle_pass(&sender()).await.unwrap_err();

    assert_eq!(err.pass(), Pass::Cycle);
    assert!(matches!(err, BumpError::MalformedRecord { .. }));
    assert_eq!(submitter.request_count(), 0);
}

#[tokio::test]
async fn cycle_submission_failure_surfaces_as_a_cycle_pass_failure() {
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1101);
    reader.set_cycle_status(7, 1000);
    reader.set_cycle_periods(50, 50);
    submitter.fail_with(SubmitError::Transport("connection reset".to_string()));

    let err = bumper.run_cycle_pass(&sender()).await.unwrap_err();

    assert_eq!(err.pass(), Pass::Cycle);
    assert!(matches!(err, BumpError::Submission { .. }));
}

#[tokio::test]
async fn bumper_trait_drives_both_passes() {
    // Callers compose against the capability interface, not the concrete
    // fellowship type.
    let (reader, submitter, bumper) = setup();
    let bumper: Arc<dyn Bumper> = Arc::new(bumper);
    reader.set_current_block(1101);
    reader.set_period_table(vec![100]);
    reader.add_member(MemberRecord::new("A", false, 0));
    reader.set_rank("A", 1);
    reader.set_cycle_status(2, 1000);
    reader.set_cycle_periods(50, 50);

    let due = bumper.bump_members(&sender()).await.unwrap();
    bumper.bump_salary_cycle(&sender()).await.unwrap();

    assert_eq!(due, vec![AccountId::from("A")]);
    assert_eq!(
        submitter.requests(),
        vec![
            TransactionRequest::Single(BumpCall::Member(AccountId::from("A"))),
            TransactionRequest::Single(BumpCall::SalaryCycle),
        ]
    );
}

#[tokio::test]
async fn passes_fail_independently() {
    // Cycle state is broken; the member pass still runs to completion.
    let (reader, submitter, bumper) = setup();
    reader.set_current_block(1000);
    reader.set_period_table(vec![100]);
    reader.add_member(MemberRecord::new("A", false, 0));
    reader.set_rank("A", 1);
    reader.fail_cycle_status_malformed("cycle status: invalid type");

    assert!(bumper.run_cycle_pass(&sender()).await.is_err());
    let due = bumper.run_member_pass(&sender()).await.unwrap();

    assert_eq!(due, vec![AccountId::from("A")]);
    assert_eq!(submitter.request_count(), 1);
}
