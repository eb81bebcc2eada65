//! Fixed-capacity slot pools.
//!
//! Every slot is allocated up front. Spawning claims the first inactive slot
//! by linear scan; despawning only clears the slot's active flag. Scans stop
//! at the high-water mark, the highest slot ever claimed since the last clear.

pub trait Pooled: Default {
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<T>,
    high_water: usize,
    dropped: u64,
}

impl<T: Pooled> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| T::default()).collect(),
            high_water: 0,
            dropped: 0,
        }
    }

    /// Place `item` in the first free slot and mark it active. Returns the slot
    /// index, or `None` (counted as a drop) when every slot is taken.
    pub fn spawn(&mut self, mut item: T) -> Option<usize> {
        let Some(index) = self.slots.iter().position(|slot| !slot.is_active()) else {
            self.dropped += 1;
            return None;
        };
        item.set_active(true);
        self.slots[index] = item;
        self.high_water = self.high_water.max(index + 1);
        Some(index)
    }

    /// Deactivate every slot.
    pub fn clear(&mut self) {
        for slot in &mut self.slots[..self.high_water] {
            slot.set_active(false);
        }
        self.high_water = 0;
    }

    /// Clear, then spawn each item in order. Returns how many did not fit.
    pub fn reset_from(&mut self, items: impl IntoIterator<Item = T>) -> usize {
        self.clear();
        let before = self.dropped;
        for item in items {
            self.spawn(item);
        }
        (self.dropped - before) as usize
    }

    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).filter(|slot| slot.is_active())
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &T> {
        self.slots[..self.high_water]
            .iter()
            .filter(|slot| slot.is_active())
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots[..self.high_water]
            .iter_mut()
            .filter(|slot| slot.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    /// Spawns refused because the pool was full, over the pool's lifetime.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[cfg(test)]
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Token {
        id: u32,
        active: bool,
    }

    impl Pooled for Token {
        fn is_active(&self) -> bool {
            self.active
        }

        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    fn token(id: u32) -> Token {
        Token { id, active: false }
    }

    #[test]
    fn spawn_claims_first_free_slot() {
        let mut pool = Pool::with_capacity(4);
        assert_eq!(pool.spawn(token(1)), Some(0));
        assert_eq!(pool.spawn(token(2)), Some(1));
        assert_eq!(pool.spawn(token(3)), Some(2));

        for slot in pool.iter_active_mut() {
            if slot.id == 2 {
                slot.set_active(false);
            }
        }
        assert_eq!(pool.spawn(token(4)), Some(1), "freed slot is reused first");
        let ids: Vec<u32> = pool.iter_active().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 4, 3]);
    }

    #[test]
    fn full_pool_drops_silently_and_counts() {
        let mut pool = Pool::with_capacity(2);
        pool.spawn(token(1));
        pool.spawn(token(2));
        assert_eq!(pool.spawn(token(3)), None);
        assert_eq!(pool.spawn(token(4)), None);
        assert_eq!(pool.dropped(), 2);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn reset_from_replaces_contents_and_reports_overflow() {
        let mut pool = Pool::with_capacity(3);
        pool.spawn(token(9));
        let overflow = pool.reset_from((1..=5).map(token));
        assert_eq!(overflow, 2);
        let ids: Vec<u32> = pool.iter_active().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(pool.high_water(), 3);
    }

    #[test]
    fn clear_deactivates_everything() {
        let mut pool = Pool::with_capacity(3);
        pool.spawn(token(1));
        pool.spawn(token(2));
        pool.clear();
        assert_eq!(pool.active_count(), 0);
        assert!(pool.get(0).is_none());
        assert_eq!(pool.spawn(token(5)), Some(0));
    }
}
