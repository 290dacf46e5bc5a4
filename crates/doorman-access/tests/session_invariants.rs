//! Model-based checks for the session store.
//!
//! Random operation sequences run against a paused clock and are compared
//! to a plain map of door to deadline. Operations land on whole seconds and
//! windows are 2.5s long, so no deadline ever coincides with an operation.

use doorman_access::{OnExpire, PendingSession, SessionStore, Take};
use doorman_core::{CardCode, DeviceId, DoorId, GrantId};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DOORS: usize = 3;
const WINDOW: Duration = Duration::from_millis(2500);
const STEP: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
enum Op {
    Put(usize),
    Take(usize),
    TakeRestore(usize),
    Clear(usize),
    Advance(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..DOORS).prop_map(Op::Put),
        2 => (0..DOORS).prop_map(Op::Take),
        2 => (0..DOORS).prop_map(Op::TakeRestore),
        1 => (0..DOORS).prop_map(Op::Clear),
        3 => (1u32..4).prop_map(Op::Advance),
    ]
}

fn door(i: usize) -> DoorId {
    DoorId::new(format!("door-{i}")).unwrap()
}

fn session(i: usize, expires_at: Instant) -> PendingSession {
    PendingSession {
        door_id: door(i),
        reader_device_id: DeviceId::new(format!("reader-{i}")).unwrap(),
        keypad_device_id: DeviceId::new(format!("keypad-{i}")).unwrap(),
        card_code: CardCode::new("E3:89:6E:AF").unwrap(),
        grant_id: GrantId::new(format!("grant-{i}")).unwrap(),
        password_hash: "$argon2id$unused".to_string(),
        expires_at,
    }
}

type Fired = Arc<Mutex<HashMap<DoorId, usize>>>;

fn counting_hook(fired: &Fired) -> OnExpire {
    let fired = Arc::clone(fired);
    Arc::new(move |session: PendingSession| {
        let fired = Arc::clone(&fired);
        Box::pin(async move {
            *fired.lock().entry(session.door_id).or_default() += 1;
        })
    })
}

async fn run(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let store = SessionStore::with_shards(2);
    let fired: Fired = Arc::default();

    let mut model: HashMap<usize, Instant> = HashMap::new();
    let mut expected_fires = [0usize; DOORS];

    for op in ops {
        let now = Instant::now();
        match op {
            Op::Put(i) => {
                let replaced = store.put(session(i, now + WINDOW), WINDOW, counting_hook(&fired));
                prop_assert_eq!(replaced.is_some(), model.contains_key(&i));
                model.insert(i, now + WINDOW);
            }
            Op::Take(i) => match store.take_if_valid(&door(i), now) {
                Take::Valid(checkout) => {
                    prop_assert!(model.remove(&i).is_some());
                    drop(checkout);
                }
                Take::Absent => prop_assert!(!model.contains_key(&i)),
                Take::Expired(_) => prop_assert!(false, "expired session left in store"),
            },
            Op::TakeRestore(i) => match store.take_if_valid(&door(i), now) {
                Take::Valid(checkout) => {
                    let attempts = checkout.failed_attempts();
                    prop_assert!(store.restore(checkout));
                    match store.take_if_valid(&door(i), now) {
                        Take::Valid(again) => {
                            prop_assert_eq!(again.failed_attempts(), attempts + 1);
                            prop_assert_eq!(Some(&again.session().expires_at), model.get(&i));
                            prop_assert!(store.restore(again));
                        }
                        other => prop_assert!(false, "restored session missing: {:?}", other),
                    }
                }
                Take::Absent => prop_assert!(!model.contains_key(&i)),
                Take::Expired(_) => prop_assert!(false, "expired session left in store"),
            },
            Op::Clear(i) => {
                prop_assert_eq!(store.clear(&door(i)), model.remove(&i).is_some());
            }
            Op::Advance(steps) => {
                tokio::time::sleep(STEP * steps).await;
                let now = Instant::now();
                model.retain(|i, deadline| {
                    if *deadline <= now {
                        expected_fires[*i] += 1;
                        false
                    } else {
                        true
                    }
                });
            }
        }

        prop_assert_eq!(store.len(), model.len());
        for i in 0..DOORS {
            let pending = store.get(&door(i)).map(|s| s.expires_at);
            prop_assert_eq!(pending, model.get(&i).copied());

            let fired = fired.lock().get(&door(i)).copied().unwrap_or(0);
            prop_assert_eq!(fired, expected_fires[i]);
        }
    }

    // Everything still pending times out exactly once
    tokio::time::sleep(WINDOW + STEP).await;
    for i in model.keys() {
        expected_fires[*i] += 1;
    }
    prop_assert!(store.is_empty());
    for i in 0..DOORS {
        let fired = fired.lock().get(&door(i)).copied().unwrap_or(0);
        prop_assert_eq!(fired, expected_fires[i]);
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_store_matches_model(ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        runtime.block_on(run(ops))?;
    }
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_silences_every_timer() {
    let store = SessionStore::new();
    let fired: Fired = Arc::default();
    let now = Instant::now();

    for i in 0..DOORS {
        store.put(session(i, now + WINDOW), WINDOW, counting_hook(&fired));
    }
    assert_eq!(store.clear_all(), DOORS);
    assert!(store.is_empty());

    tokio::time::sleep(WINDOW * 2).await;
    assert!(fired.lock().is_empty());
}
