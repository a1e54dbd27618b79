use film_battle::engine::{EngineError, EngineState, Step};
use film_battle::models::Item;
use speculate2::speculate;

fn items(titles: &[&str]) -> Vec<Item> {
    titles.iter().map(|t| Item::new(*t, *t)).collect()
}

fn titles(state: &EngineState) -> Vec<String> {
    state.ranked_order().iter().map(|i| i.title.clone()).collect()
}

/// Strength of an item when the true order is given by `order` (index 0 best).
fn strength(order: &[String], item: &Item) -> usize {
    order
        .iter()
        .position(|t| *t == item.title)
        .expect("item missing from true order")
}

/// Drive a session to completion with a consistent judge. Returns the pivots
/// compared against, in order, and the comparison count of each placement.
fn run_with_judge(state: &mut EngineState, order: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut pivots = Vec::new();
    let mut per_placement = Vec::new();
    let mut since_last = 0;

    while let Some(cmp) = state.current_comparison() {
        pivots.push(cmp.pivot.title.clone());
        let challenger_won = strength(order, cmp.challenger) < strength(order, cmp.pivot);
        since_last += 1;
        if let Step::Placed { .. } = state.resolve(challenger_won) {
            per_placement.push(since_last);
            since_last = 0;
        }
    }

    (pivots, per_placement)
}

fn ceil_log2(k: usize) -> usize {
    (usize::BITS - (k - 1).leading_zeros()) as usize
}

/// Every permutation of `values`, via Heap's algorithm.
fn permutations(values: Vec<String>) -> Vec<Vec<String>> {
    fn heap(k: usize, values: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        if k <= 1 {
            out.push(values.clone());
            return;
        }
        heap(k - 1, values, out);
        for i in 0..k - 1 {
            if k % 2 == 0 {
                values.swap(i, k - 1);
            } else {
                values.swap(0, k - 1);
            }
            heap(k - 1, values, out);
        }
    }

    let mut values = values;
    let mut out = Vec::new();
    let n = values.len();
    heap(n, &mut values, &mut out);
    out
}

speculate! {
    describe "start" {
        it "rejects an empty item list" {
            assert_eq!(EngineState::start(Vec::new()), Err(EngineError::InsufficientItems));
        }

        it "finishes a single item session immediately" {
            let state = EngineState::start(items(&["X"])).unwrap();

            assert!(state.is_done());
            assert!(state.is_trivial());
            assert!(state.current_comparison().is_none());
            assert_eq!(titles(&state), vec!["X"]);
            assert_eq!(state.comparisons(), 0);
        }

        it "seeds the ranking with the first item and queues the rest" {
            let state = EngineState::start(items(&["A", "B", "C"])).unwrap();

            assert_eq!(titles(&state), vec!["A"]);
            let pending: Vec<_> = state.pending().map(|i| i.title.as_str()).collect();
            assert_eq!(pending, vec!["C"]);
            assert_eq!(state.remaining(), 2);
            assert!(!state.is_done());
            assert!(!state.is_trivial());
        }

        it "reproduces the same initial state on restart" {
            let list = items(&["A", "B", "C", "D"]);
            let mut first = EngineState::start(list.clone()).unwrap();
            let fresh = first.clone();
            first.resolve(true);
            first.resolve(false);

            let again = EngineState::start(list).unwrap();
            assert_eq!(again, fresh);
            assert_ne!(again, first);
        }
    }

    describe "two item session" {
        before {
            let mut state = EngineState::start(items(&["A", "B"])).unwrap();
        }

        it "asks challenger B against pivot A" {
            let cmp = state.current_comparison().unwrap();
            assert_eq!(cmp.challenger.title, "B");
            assert_eq!(cmp.pivot.title, "A");
            assert_eq!(cmp.pivot_index, 0);
        }

        it "puts the challenger first when it wins" {
            assert_eq!(state.resolve(true), Step::Placed { index: 0 });
            assert!(state.is_done());
            assert_eq!(titles(&state), vec!["B", "A"]);
        }

        it "puts the challenger last when it loses" {
            assert_eq!(state.resolve(false), Step::Placed { index: 1 });
            assert!(state.is_done());
            assert_eq!(titles(&state), vec!["A", "B"]);
        }
    }

    describe "four item monotonic insertion" {
        it "follows the floor midpoint and ranks A B C D" {
            let order: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
            let mut state = EngineState::start(items(&["A", "B", "C", "D"])).unwrap();

            let (pivots, per_placement) = run_with_judge(&mut state, &order);

            assert!(state.is_done());
            assert_eq!(titles(&state), vec!["A", "B", "C", "D"]);
            // B vs A; C vs A then B; D vs B then C
            assert_eq!(pivots, vec!["A", "A", "B", "B", "C"]);
            assert_eq!(per_placement, vec![1, 2, 2]);
            assert!(state.comparisons() <= 6);
        }

        it "compares C against A first when inserting into [A, B]" {
            let mut state = EngineState::start(items(&["A", "B", "C"])).unwrap();
            state.resolve(false);

            let cmp = state.current_comparison().unwrap();
            assert_eq!(cmp.challenger.title, "C");
            assert_eq!(cmp.pivot.title, "A");
        }
    }

    describe "consistent judges" {
        it "produce the true order for every arrival order of six items" {
            let truth: Vec<String> = ["A", "B", "C", "D", "E", "F"].iter().map(|s| s.to_string()).collect();

            for arrival in permutations(truth.clone()) {
                let list: Vec<Item> = arrival.iter().map(|t| Item::new(t.clone(), t.clone())).collect();
                let mut state = EngineState::start(list).unwrap();

                let (_, per_placement) = run_with_judge(&mut state, &truth);

                assert!(state.is_done());
                assert_eq!(titles(&state), truth, "arrival order {:?}", arrival);
                for (i, count) in per_placement.iter().enumerate() {
                    let k = i + 2;
                    assert!(*count <= ceil_log2(k), "item {} took {} comparisons", k, count);
                }
            }
        }

        it "keep load order when the challenger never wins" {
            let mut state = EngineState::start(items(&["A", "B", "C", "D", "E"])).unwrap();
            while state.current_comparison().is_some() {
                state.resolve(false);
            }
            assert_eq!(titles(&state), vec!["A", "B", "C", "D", "E"]);
        }

        it "reverse load order when the challenger always wins" {
            let mut state = EngineState::start(items(&["A", "B", "C", "D", "E"])).unwrap();
            while state.current_comparison().is_some() {
                state.resolve(true);
            }
            assert_eq!(titles(&state), vec!["E", "D", "C", "B", "A"]);
        }
    }

    describe "resuming" {
        it "continues a serialized state mid-search" {
            let truth: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
            let arrival = items(&["C", "E", "A", "D", "B"]);

            let mut uninterrupted = EngineState::start(arrival.clone()).unwrap();
            run_with_judge(&mut uninterrupted, &truth);

            let mut state = EngineState::start(arrival).unwrap();
            for _ in 0..3 {
                let cmp = state.current_comparison().unwrap();
                let won = strength(&truth, cmp.challenger) < strength(&truth, cmp.pivot);
                state.resolve(won);
            }
            let json = serde_json::to_string(&state).unwrap();

            let mut resumed: EngineState = serde_json::from_str(&json).unwrap();
            assert_eq!(resumed.tick(), None);
            assert_eq!(resumed, state);
            run_with_judge(&mut resumed, &truth);

            assert_eq!(titles(&resumed), titles(&uninterrupted));
            assert_eq!(resumed.comparisons(), uninterrupted.comparisons());
        }

        it "ignores outcomes once done" {
            let mut state = EngineState::start(items(&["A"])).unwrap();
            assert_eq!(state.resolve(true), Step::Idle);
            assert_eq!(state.comparisons(), 0);
        }
    }
}
