//! Arrays shared between sampler threads without locks.
//!
//! The Gibbs samplers read and write assignments and weights from many threads at once. Writes to
//! a variable's own slots never collide (each variable belongs to exactly one shard), but reads
//! of neighboring variables and updates of shared weights do race with other threads. That is
//! intended: the Markov chain tolerates stale reads and lost weight updates, and converges to
//! approximately the right marginals anyway.
//!
//! `SharedArray` makes that contract explicit. Every cell is an `AtomicU64` accessed with
//! `Ordering::Relaxed`, so the races are defined behavior but carry no synchronization. On common
//! targets a relaxed load or store is an ordinary load or store. Read-modify-write helpers are
//! *not* atomic as a whole: concurrent `add`s to one cell may lose updates.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// A scalar that fits in a 64 bit cell
pub trait RelaxedScalar: Copy {

    fn into_cell(self) -> u64;

    fn from_cell(bits: u64) -> Self;

}

impl RelaxedScalar for u64 {
    fn into_cell(self) -> u64 { self }
    fn from_cell(bits: u64) -> Self { bits }
}

impl RelaxedScalar for usize {
    fn into_cell(self) -> u64 { self as u64 }
    fn from_cell(bits: u64) -> Self { bits as usize }
}

impl RelaxedScalar for f64 {
    fn into_cell(self) -> u64 { self.to_bits() }
    fn from_cell(bits: u64) -> Self { f64::from_bits(bits) }
}


/// A fixed-length array of relaxed cells. Racy by design; see the module documentation.
pub struct SharedArray<T: RelaxedScalar> {

    cells: Box<[AtomicU64]>,

    _marker: PhantomData<T>

}

impl<T: RelaxedScalar> SharedArray<T> {

    /// An array of `len` copies of `value`
    pub fn new(len: usize, value: T) -> Self {
        let cells = (0..len).map(|_| AtomicU64::new(value.into_cell())).collect();
        SharedArray { cells, _marker: PhantomData }
    }

    pub fn from_slice(values: &[T]) -> Self {
        let cells = values.iter().map(|v| AtomicU64::new(v.into_cell())).collect();
        SharedArray { cells, _marker: PhantomData }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read cell `i`. May observe a value written concurrently by another thread, or miss it.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        T::from_cell(self.cells[i].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, i: usize, value: T) {
        self.cells[i].store(value.into_cell(), Ordering::Relaxed)
    }

    /// Replace cell `i` with `f(cell)`. Not atomic: a concurrent writer to the same cell may be
    /// overwritten.
    #[inline]
    pub fn update<F: FnOnce(T) -> T>(&self, i: usize, f: F) {
        let value = f(self.get(i));
        self.set(i, value);
    }

    /// Set every cell to `value`
    pub fn fill(&self, value: T) {
        for cell in self.cells.iter() {
            cell.store(value.into_cell(), Ordering::Relaxed);
        }
    }

    /// Copy the current contents out
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

}

impl SharedArray<f64> {

    #[inline]
    pub fn add(&self, i: usize, delta: f64) {
        self.update(i, |v| v + delta)
    }

}

impl SharedArray<u64> {

    #[inline]
    pub fn increment(&self, i: usize) {
        self.update(i, |v| v + 1)
    }

}

impl<T: RelaxedScalar + fmt::Debug> fmt::Debug for SharedArray<T> {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }

}
