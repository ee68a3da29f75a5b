//! Integration test: concurrent edge callbacks.
//!
//! Edges are delivered on the injecting thread, so several threads injecting
//! at once reproduce the driver's concurrent interrupt threads.

use std::sync::Barrier;
use std::thread;

use vss_common::io::Channel;
use vss_controller::SafetyState;

use super::*;

const TRIP_BLOCK: [(Channel, bool); 3] = [(GAUGE, false), (TURBO, false), (LED, true)];
const ARM_BLOCK: [(Channel, bool); 3] = [(GAUGE, true), (TURBO, true), (LED, false)];

/// Both relays shut down, neither warns.
fn two_shutdown_relays() -> String {
    rig_toml(false)
        .replace(
            "name = \"A\"\nwarning = true\nshutdown = true",
            "name = \"A\"\nwarning = false\nshutdown = true",
        )
        .replace(
            "name = \"Load lock\"\nwarning = true\nshutdown = false",
            "name = \"Load lock\"\nwarning = false\nshutdown = true",
        )
}

fn assert_whole_blocks(writes: &[(Channel, bool)]) {
    assert_eq!(writes.len() % 3, 0, "{writes:?}");
    for block in writes.chunks(3) {
        assert!(
            block == TRIP_BLOCK || block == ARM_BLOCK,
            "interleaved writes: {writes:?}"
        );
    }
}

#[test]
fn simultaneous_trips_each_actuate_once() {
    let rig = Rig::start_with(&two_shutdown_relays(), RecordingNotifier::default());
    rig.press_reset();
    assert_eq!(rig.controller.state(), SafetyState::Armed);
    rig.sim.clear_writes();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [RELAY_A, RELAY_B]
        .into_iter()
        .map(|ch| {
            let sim = Arc::clone(&rig.sim);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                assert!(sim.set_input(ch, false));
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let writes = rig.sim.writes();
    assert_eq!(writes, [TRIP_BLOCK, TRIP_BLOCK].concat());
    assert_eq!(rig.controller.state(), SafetyState::Tripped);
}

#[test]
fn trips_and_confirms_serialize() {
    let rig = Rig::start_with(&two_shutdown_relays(), RecordingNotifier::default());
    rig.sim.clear_writes();

    let threads = 8;
    let rounds = 50;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let controller = Arc::clone(&rig.controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..rounds {
                    if i % 2 == 0 {
                        controller.on_trip(RELAY_A).unwrap();
                    } else {
                        controller.on_confirm().unwrap();
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let writes = rig.sim.writes();
    assert_whole_blocks(&writes);
    let trips = writes.chunks(3).filter(|b| *b == TRIP_BLOCK).count();
    assert_eq!(trips, (threads / 2) * rounds);

    // Final outputs agree with the final state.
    let armed = rig.controller.state() == SafetyState::Armed;
    assert_eq!(rig.switches(), (Some(armed), Some(armed)));
    assert_eq!(rig.led(), Some(!armed));
}
