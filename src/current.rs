//! The single-slot save area used when temporarily making a context
//! current.
//!
//! `enter()` captures whatever native state is current on the calling
//! thread into the slot, `exit()` takes it back out and restores it. This
//! is deliberately not a stack: a second save before a matching restore
//! overwrites the slot, so a context must not be re-entered without an
//! intervening exit.

/// Holds at most one previously-current native state.
#[derive(Debug)]
pub struct SaveSlot<T: Copy> {
    saved: Option<T>,
}

impl<T: Copy> SaveSlot<T> {
    pub fn new() -> Self {
        SaveSlot { saved: None }
    }
    /// Records `state`, overwriting any previously saved one.
    pub fn save(&mut self, state: T) {
        if self.saved.is_some() {
            trace!("Save slot overwritten before a matching restore");
        }
        self.saved = Some(state);
    }
    /// Takes the saved state out of the slot, leaving it empty.
    pub fn take(&mut self) -> Option<T> {
        self.saved.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_yields_nothing() {
        let mut slot: SaveSlot<u32> = SaveSlot::new();
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn save_then_take_round_trips_once() {
        let mut slot = SaveSlot::new();
        slot.save(42u32);
        assert_eq!(slot.take(), Some(42));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn second_save_overwrites_the_first() {
        let mut slot = SaveSlot::new();
        slot.save(1u32);
        slot.save(2);
        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
    }
}
