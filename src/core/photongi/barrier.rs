use log::*;
use std::sync::{Condvar, Mutex};

#[derive(Debug)]
struct PhaseState {
    participants: Vec<bool>,
    active: usize,
    arrived: usize,
    phase: u64,
    rebuilding: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseRole {
    /// Completed the quorum and ran the phase action.
    Leader,
    /// Waited for the leader to finish the phase.
    Follower,
    /// Had already withdrawn; did not take part.
    Withdrawn,
}

/// Reusable barrier whose membership shrinks as participants withdraw.
///
/// The participant that completes the quorum of active members runs the
/// phase action while the others block, then everybody is released
/// together. A withdrawal may itself complete the quorum.
#[derive(Debug)]
pub struct PhaseBarrier {
    state: Mutex<PhaseState>,
    cond: Condvar,
}

struct PhaseGuard<'a> {
    barrier: &'a PhaseBarrier,
}

impl Drop for PhaseGuard<'_> {
    // Runs even if the phase action panics, so followers are never stranded.
    fn drop(&mut self) {
        let mut state = self.barrier.state.lock().unwrap_or_else(|e| e.into_inner());
        state.phase += 1;
        state.arrived = 0;
        state.rebuilding = false;
        self.barrier.cond.notify_all();
    }
}

impl PhaseBarrier {
    pub fn new(participant_count: usize) -> Self {
        PhaseBarrier {
            state: Mutex::new(PhaseState {
                participants: vec![true; participant_count],
                active: participant_count,
                arrived: 0,
                phase: 0,
                rebuilding: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Starts over with a fresh set of participants.
    pub fn reset(&self, participant_count: usize) {
        let mut state = self.state.lock().unwrap();
        state.participants = vec![true; participant_count];
        state.active = participant_count;
        state.arrived = 0;
        state.rebuilding = false;
        state.phase += 1;
        self.cond.notify_all();
    }

    pub fn get_active_count(&self) -> usize {
        return self.state.lock().unwrap().active;
    }

    pub fn get_phase(&self) -> u64 {
        return self.state.lock().unwrap().phase;
    }

    pub fn is_participant(&self, index: usize) -> bool {
        let state = self.state.lock().unwrap();
        return state.participants.get(index).copied().unwrap_or(false);
    }

    pub fn arrive_and_wait<F: FnOnce()>(&self, index: usize, action: F) -> PhaseRole {
        let mut state = self.state.lock().unwrap();
        if !state.participants.get(index).copied().unwrap_or(false) {
            return PhaseRole::Withdrawn;
        }
        let phase = state.phase;
        state.arrived += 1;
        debug!(
            "Thread {} arrived at phase {} ({}/{})",
            index, phase, state.arrived, state.active
        );
        loop {
            if state.phase != phase {
                return PhaseRole::Follower;
            }
            if state.arrived >= state.active && !state.rebuilding {
                state.rebuilding = true;
                drop(state);
                let guard = PhaseGuard { barrier: self };
                debug!("Thread {} leads phase {}", index, phase);
                action();
                drop(guard);
                return PhaseRole::Leader;
            }
            state = self.cond.wait(state).unwrap();
        }
    }

    /// Removes a participant. Idempotent. Returns true the first time.
    pub fn withdraw(&self, index: usize) -> bool {
        let mut state = self.state.lock().unwrap();
        match state.participants.get(index) {
            Some(true) => {}
            _ => return false,
        }
        state.participants[index] = false;
        state.active -= 1;
        debug!("Thread {} withdrew, {} participants left", index, state.active);
        if state.arrived > 0 && state.arrived >= state.active && !state.rebuilding {
            self.cond.notify_all();
        }
        return true;
    }
}
