//! Runs under `wasm-pack test --node core`.
#![cfg(target_arch = "wasm32")]

use grid_waldo_core::*;
use rand::{SeedableRng, rngs::SmallRng};
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn highlight_reaches_every_target() {
    let mut rng = SmallRng::seed_from_u64(7);
    for target in CellIndex::all() {
        let sequence = generate_highlight(&mut rng, target);
        assert_eq!(sequence.target(), Some(target));
    }
}

#[wasm_bindgen_test]
fn score_uses_remaining_time_and_chances() {
    assert_eq!(score_for(30, 2), 2300);
}
