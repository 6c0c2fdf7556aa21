//! Integration tests for the course purchase flow.
//!
//! These tests exercise the full path across module boundaries: account
//! activation, funding, slot allocation, and settlement, including the
//! concurrent race for a course's last slot.

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use campus_commerce::{CommerceError, CommerceHub, CourseId, NullNotifier, RecordingNotifier};
use campus_ledger::config::PENDING_THRESHOLD;
use campus_ledger::identity::{Role, UserId};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Helper: registers and activates a user with the given roles.
fn activated<N: campus_commerce::Notifier>(hub: &CommerceHub<N>, roles: Vec<Role>) -> UserId {
    let (user, token) = hub.register_user(roles);
    hub.redeem(&token).unwrap();
    user
}

/// Helper: deposits funds and confirms the transaction if it lands in
/// PENDING.
fn fund<N: campus_commerce::Notifier>(hub: &CommerceHub<N>, user: UserId, amount: u64) {
    let txn = hub.deposit(user, amount).unwrap();
    if txn.is_pending() {
        let token = hub.token_for_transaction(user, txn.id).unwrap();
        hub.redeem(&token.token).unwrap();
    }
}

/// Helper: a teacher with a priced course and an initialized inventory.
fn course<N: campus_commerce::Notifier>(
    hub: &CommerceHub<N>,
    price: u64,
    slots: u32,
) -> (UserId, CourseId) {
    let teacher = activated(hub, vec![Role::Teacher]);
    let record = hub.create_course(teacher, price).unwrap();
    hub.initialize_inventory(teacher, record.id, slots).unwrap();
    (teacher, record.id)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_purchase_lifecycle() -> Result<()> {
    init_tracing();
    let hub = CommerceHub::new(RecordingNotifier::new());
    let (teacher, course_id) = course(&hub, 800, 5);
    let student = activated(&hub, vec![Role::Student]);

    // 1. Fund through a high-value deposit, confirmed by token.
    let deposit = hub.deposit(student, PENDING_THRESHOLD + 1_000)?;
    assert!(deposit.is_pending());
    let token = hub.token_for_transaction(student, deposit.id)?;
    hub.redeem(&token.token)?;
    assert_eq!(
        hub.balance_of(student, student)?,
        PENDING_THRESHOLD + 1_000
    );

    // 2. Purchase: slot minted, creator paid.
    let purchase = hub.purchase_course(student, course_id)?;
    assert!(!purchase.is_pending());
    assert_eq!(hub.balance_of(teacher, teacher)?, 800);
    assert_eq!(
        hub.balance_of(student, student)?,
        PENDING_THRESHOLD + 200
    );

    let slots = hub.slots_for_user(student, student, None)?;
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].drop_number, 1);
    assert!(!slots[0].completed);

    // 3. Finish the course.
    hub.complete_course(student, course_id)?;
    let finished = hub.slots_for_course(teacher, course_id, Some(true))?;
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].owner, Some(student));
    Ok(())
}

#[test]
fn drop_numbers_are_sequential_across_buyers() {
    let hub = CommerceHub::default();
    let (_teacher, course_id) = course(&hub, 100, 4);

    let mut drops = Vec::new();
    for _ in 0..4 {
        let buyer = activated(&hub, vec![Role::Student]);
        fund(&hub, buyer, 200);
        hub.purchase_course(buyer, course_id).unwrap();
        let slot = hub.slots_for_user(buyer, buyer, None).unwrap().remove(0);
        drops.push(slot.drop_number);
    }
    assert_eq!(drops, vec![1, 2, 3, 4]);
}

#[test]
fn minted_slots_never_exceed_inventory() {
    let hub = CommerceHub::default();
    let (teacher, course_id) = course(&hub, 50, 3);

    let mut successes = 0;
    for _ in 0..6 {
        let buyer = activated(&hub, vec![Role::Student]);
        fund(&hub, buyer, 100);
        match hub.purchase_course(buyer, course_id) {
            Ok(_) => successes += 1,
            Err(CommerceError::ImpossibleOperation(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 3);
    assert_eq!(
        hub.slots_for_course(teacher, course_id, None).unwrap().len(),
        3
    );
}

#[test]
fn leaving_frees_the_slot_for_the_next_buyer() {
    let hub = CommerceHub::default();
    let (_teacher, course_id) = course(&hub, 100, 1);

    let first = activated(&hub, vec![Role::Student]);
    fund(&hub, first, 200);
    hub.purchase_course(first, course_id).unwrap();

    // Inventory exhausted for the second buyer.
    let second = activated(&hub, vec![Role::Student]);
    fund(&hub, second, 200);
    assert!(hub.purchase_course(second, course_id).is_err());

    // The first buyer leaves; the recycled drop goes to the second.
    hub.leave_course(first, course_id).unwrap();
    hub.purchase_course(second, course_id).unwrap();
    let slot = hub.slots_for_user(second, second, None).unwrap().remove(0);
    assert_eq!(slot.drop_number, 1);
    assert!(!slot.completed);
}

// ---------------------------------------------------------------------------
// Money conservation
// ---------------------------------------------------------------------------

#[test]
fn transfers_and_purchases_conserve_total_balance() {
    let hub = CommerceHub::default();
    let (teacher, course_id) = course(&hub, 300, 2);
    let alice = activated(&hub, vec![Role::Student]);
    let bob = activated(&hub, vec![Role::Student]);
    fund(&hub, alice, 1_000);
    fund(&hub, bob, 500);

    let total_before = hub.balance_of(teacher, teacher).unwrap()
        + hub.balance_of(alice, alice).unwrap()
        + hub.balance_of(bob, bob).unwrap();

    hub.transfer(alice, bob, 250).unwrap();
    hub.purchase_course(alice, course_id).unwrap();
    hub.purchase_course(bob, course_id).unwrap();

    let total_after = hub.balance_of(teacher, teacher).unwrap()
        + hub.balance_of(alice, alice).unwrap()
        + hub.balance_of(bob, bob).unwrap();
    assert_eq!(total_before, total_after);
}

#[test]
fn failed_operations_leave_balances_untouched() {
    let hub = CommerceHub::default();
    let (teacher, course_id) = course(&hub, 500, 1);
    let buyer = activated(&hub, vec![Role::Student]);
    fund(&hub, buyer, 400);

    assert!(matches!(
        hub.purchase_course(buyer, course_id),
        Err(CommerceError::InsufficientFunds { .. })
    ));
    assert_eq!(hub.balance_of(buyer, buyer).unwrap(), 400);
    assert_eq!(hub.balance_of(teacher, teacher).unwrap(), 0);
    assert!(hub
        .slots_for_course(teacher, course_id, None)
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_purchases_of_the_last_slot() {
    init_tracing();
    let hub = Arc::new(CommerceHub::new(NullNotifier));
    let (teacher, course_id) = course(hub.as_ref(), 100, 1);

    let alice = activated(hub.as_ref(), vec![Role::Student]);
    let bob = activated(hub.as_ref(), vec![Role::Student]);
    fund(hub.as_ref(), alice, 500);
    fund(hub.as_ref(), bob, 500);

    let handles: Vec<_> = [alice, bob]
        .into_iter()
        .map(|buyer| {
            let hub = Arc::clone(&hub);
            thread::spawn(move || hub.purchase_course(buyer, course_id).is_ok())
        })
        .collect();
    let outcomes: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Exactly one buyer won the slot; the other was charged nothing.
    assert_eq!(outcomes.iter().filter(|&&won| won).count(), 1);
    assert_eq!(
        hub.slots_for_course(teacher, course_id, None).unwrap().len(),
        1
    );
    assert_eq!(hub.balance_of(teacher, teacher).unwrap(), 100);
    let combined =
        hub.balance_of(alice, alice).unwrap() + hub.balance_of(bob, bob).unwrap();
    assert_eq!(combined, 900);
}
