//! A finite state machine over face classes that only admits canonical move
//! sequences: no face is turned twice in a row, and of two commuting faces
//! only one order is allowed (`U D` but never `D U`). Derived from the
//! canonical FSM in Lucas Garron's twsearch.

use std::sync::LazyLock;

use fxhash::FxHashMap;

use crate::{
    cube::CubieCube,
    moves::{Face, Move},
};

const FACE_COUNT: usize = Face::ALL.len();

// Bit N is set when face N is in the mask.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
struct FaceMask(u8);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanonicalFSMState(usize);

#[derive(Debug)]
pub struct CanonicalFSM {
    next_state_lookup: Vec<[CanonicalFSMState; FACE_COUNT]>,
}

const ILLEGAL: CanonicalFSMState = CanonicalFSMState(usize::MAX);

pub static CANONICAL_FSM: LazyLock<CanonicalFSM> = LazyLock::new(CanonicalFSM::new);

impl CanonicalFSM {
    fn new() -> Self {
        let quarter_turns = Face::ALL.map(|face| CubieCube::SOLVED.apply(Move::new(face, 1)));

        let mut commutes = [FaceMask((1 << FACE_COUNT) - 1); FACE_COUNT];
        for i in 0..FACE_COUNT {
            for j in 0..FACE_COUNT {
                let a = &quarter_turns[i];
                let b = &quarter_turns[j];
                if a.multiply(b) != b.multiply(a) {
                    commutes[i].0 &= !(1 << j);
                    commutes[j].0 &= !(1 << i);
                }
            }
        }

        let mut next_state_lookup = vec![];

        let mut mask_to_state = FxHashMap::default();
        mask_to_state.insert(FaceMask(0), CanonicalFSMState(0));
        // The faces turned so far that no later, non-commuting turn has
        // "closed off", indexed by state
        let mut state_to_mask = vec![FaceMask(0)];

        let mut queue_index = 0;
        while queue_index < state_to_mask.len() {
            let mut next_state = [ILLEGAL; FACE_COUNT];
            let mask = state_to_mask[queue_index];
            queue_index += 1;

            for face in 0..FACE_COUNT {
                // A commuting face later in the order is still open, so this
                // face must have come first
                let out_of_order = (mask.0 & commutes[face].0) >> (face + 1) != 0;
                let repeated = (mask.0 >> face) & 1 != 0;
                if out_of_order || repeated {
                    continue;
                }

                let mut next_bits = (mask.0 & commutes[face].0) | (1 << face);

                // Faces with identical commutation sets are interchangeable;
                // keep only the highest
                for i in 0..FACE_COUNT {
                    if (next_bits >> i) & 1 != 0 {
                        for j in (i + 1)..FACE_COUNT {
                            if (next_bits >> j) & 1 != 0 && commutes[i] == commutes[j] {
                                next_bits &= !(1 << i);
                            }
                        }
                    }
                }

                let next_mask = FaceMask(next_bits);
                next_state[face] = *mask_to_state.entry(next_mask).or_insert_with(|| {
                    state_to_mask.push(next_mask);
                    CanonicalFSMState(state_to_mask.len() - 1)
                });
            }
            next_state_lookup.push(next_state);
        }

        Self { next_state_lookup }
    }

    /// The state after turning `face`, or `None` if that would make the
    /// sequence non-canonical.
    pub fn next_state(&self, current: CanonicalFSMState, face: Face) -> Option<CanonicalFSMState> {
        match self.next_state_lookup[current.0][face as usize] {
            ILLEGAL => None,
            state => Some(state),
        }
    }

    /// Run a whole sequence through the machine from the start state.
    #[cfg(test)]
    pub(crate) fn walk(&self, moves: &[Move]) -> Option<CanonicalFSMState> {
        moves.iter().try_fold(CanonicalFSMState::default(), |state, move_| {
            self.next_state(state, move_.face())
        })
    }
}
