use super::{storage, Error, Result};

/// A single completion event slot. A slot that is not [AioEvent::in_use] carries no meaningful
/// data, the remaining fields are only valid between a claim and the matching reap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AioEvent {
    in_use: bool,
    completed: bool,
    user_data: u64,
    result: [i64; 2],
}

impl AioEvent {
    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Whether a result has been recorded and is waiting to be reaped.
    pub fn is_completed(&self) -> bool {
        self.in_use && self.completed
    }

    /// The opaque value the submitter attached to the request.
    pub fn user_data(&self) -> u64 {
        self.user_data
    }

    pub fn result(&self) -> [i64; 2] {
        self.result
    }
}

/// A reaped completion, handed back to the process that owns the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedEvent {
    pub user_data: u64,
    pub res: i64,
    pub res2: i64,
}

/// The fixed capacity completion event storage embedded in every [super::AioContext]. The number
/// of slots is decided at creation and never changes afterwards.
///
/// All of the mutating calls here are expected to run under the owning context's lock, which is
/// enforced by only handing out `&mut EventSlots` through [super::ContextState].
#[derive(Debug)]
pub struct EventSlots {
    slots: Box<[AioEvent]>,
    in_use: u32,
}

impl EventSlots {
    pub(crate) fn new(capacity: u32) -> Result<EventSlots> {
        let mut slots = Vec::new();
        storage::try_grow(&mut slots, capacity as usize)?;

        Ok(EventSlots {
            slots: slots.into_boxed_slice(),
            in_use: 0,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Number of claimed slots, pending and completed.
    pub fn in_use(&self) -> u32 {
        self.in_use
    }

    pub fn is_full(&self) -> bool {
        self.in_use == self.capacity()
    }

    pub fn get(&self, slot: usize) -> Option<&AioEvent> {
        self.slots.get(slot)
    }

    /// Claim the first free slot for a new submission.
    pub fn claim(&mut self, user_data: u64) -> Result<usize> {
        let capacity = self.capacity();
        let (index, event) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, event)| !event.in_use)
            .ok_or(Error::EventsExhausted { capacity })?;

        *event = AioEvent {
            in_use: true,
            completed: false,
            user_data,
            result: [0, 0],
        };
        self.in_use += 1;
        Ok(index)
    }

    /// Record the result of a claimed slot. Returns false if the slot was not pending.
    pub fn complete(&mut self, slot: usize, result: [i64; 2]) -> bool {
        match self.slots.get_mut(slot) {
            Some(event) if event.in_use && !event.completed => {
                event.completed = true;
                event.result = result;
                true
            }
            _ => false,
        }
    }

    /// Release a claimed slot without delivering anything. Returns false if the slot was free.
    pub fn cancel(&mut self, slot: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(event) if event.in_use => {
                *event = AioEvent::default();
                self.in_use -= 1;
                true
            }
            _ => false,
        }
    }

    /// Reap up to `max` completed events in slot order, freeing their slots.
    pub fn reap(&mut self, max: usize) -> Vec<CompletedEvent> {
        let mut reaped = Vec::new();
        for event in self.slots.iter_mut() {
            if reaped.len() >= max {
                break;
            }
            if !(event.in_use && event.completed) {
                continue;
            }

            reaped.push(CompletedEvent {
                user_data: event.user_data,
                res: event.result[0],
                res2: event.result[1],
            });
            *event = AioEvent::default();
        }
        self.in_use -= reaped.len() as u32;
        reaped
    }

    /// Throw away every completed but unreaped event, used once nobody is left to reap them.
    pub(crate) fn discard_completed(&mut self) -> usize {
        let mut discarded = 0;
        for event in self.slots.iter_mut().filter(|e| e.in_use && e.completed) {
            *event = AioEvent::default();
            discarded += 1;
        }
        self.in_use -= discarded as u32;
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slots_are_unused() {
        let slots = EventSlots::new(4).unwrap();
        assert_eq!(slots.capacity(), 4);
        assert_eq!(slots.in_use(), 0);
        assert!((0..4).all(|i| !slots.get(i).unwrap().in_use()));
        assert!(slots.get(4).is_none());
    }

    #[test]
    fn test_zero_capacity_is_always_full() {
        let mut slots = EventSlots::new(0).unwrap();
        assert!(slots.is_full());
        assert_eq!(
            slots.claim(1),
            Err(Error::EventsExhausted { capacity: 0 })
        );
    }

    #[test]
    fn test_claim_until_exhausted() {
        let mut slots = EventSlots::new(2).unwrap();
        assert_eq!(slots.claim(0xdead).unwrap(), 0);
        assert_eq!(slots.claim(0xbeef).unwrap(), 1);
        assert!(slots.is_full());
        assert_eq!(
            slots.claim(0xcafe),
            Err(Error::EventsExhausted { capacity: 2 })
        );

        assert!(slots.cancel(0));
        assert_eq!(slots.claim(0xcafe).unwrap(), 0);
        assert_eq!(slots.get(0).unwrap().user_data(), 0xcafe);
    }

    #[test]
    fn test_reap_only_returns_completed() {
        let mut slots = EventSlots::new(3).unwrap();
        let a = slots.claim(10).unwrap();
        let b = slots.claim(20).unwrap();
        let c = slots.claim(30).unwrap();

        assert!(slots.complete(c, [3, 0]));
        assert!(slots.complete(a, [1, -1]));
        assert!(!slots.complete(a, [9, 9]));

        let reaped = slots.reap(8);
        assert_eq!(
            reaped,
            vec![
                CompletedEvent {
                    user_data: 10,
                    res: 1,
                    res2: -1
                },
                CompletedEvent {
                    user_data: 30,
                    res: 3,
                    res2: 0
                },
            ]
        );
        assert_eq!(slots.in_use(), 1);
        assert!(slots.get(b).unwrap().in_use());
        assert!(!slots.get(b).unwrap().is_completed());
        assert!(slots.reap(8).is_empty());
    }

    #[test]
    fn test_reap_respects_max() {
        let mut slots = EventSlots::new(4).unwrap();
        for user_data in 0..4 {
            let slot = slots.claim(user_data).unwrap();
            slots.complete(slot, [user_data as i64, 0]);
        }

        assert_eq!(slots.reap(3).len(), 3);
        assert_eq!(slots.in_use(), 1);
        assert_eq!(slots.reap(0).len(), 0);
        assert_eq!(slots.reap(3)[0].user_data, 3);
        assert_eq!(slots.in_use(), 0);
    }

    #[test]
    fn test_complete_and_cancel_on_free_slot() {
        let mut slots = EventSlots::new(1).unwrap();
        assert!(!slots.complete(0, [1, 1]));
        assert!(!slots.cancel(0));
        assert!(!slots.cancel(5));
        assert_eq!(slots.in_use(), 0);
    }

    #[test]
    fn test_discard_completed_keeps_pending() {
        let mut slots = EventSlots::new(2).unwrap();
        let done = slots.claim(1).unwrap();
        let pending = slots.claim(2).unwrap();
        slots.complete(done, [0, 0]);

        assert_eq!(slots.discard_completed(), 1);
        assert!(!slots.get(done).unwrap().in_use());
        assert!(slots.get(pending).unwrap().in_use());
        assert_eq!(slots.in_use(), 1);
    }

    #[test]
    fn test_overflowing_capacity() {
        assert!(matches!(
            EventSlots::new(u32::MAX),
            Err(Error::ResourceExhausted(..))
        ));
    }
}
