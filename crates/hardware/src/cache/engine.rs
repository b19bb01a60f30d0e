//! Access Engine.
//!
//! Functional core of the cache. It owns the block store and the eviction
//! ledger and performs every operation that touches cached data:
//! 1. **Lookup:** `try_access` classifies a packet as hit or miss and moves
//!    the covered bytes on a hit.
//! 2. **Upsizing:** `prepare_forward` turns a sub-block miss into a
//!    whole-block fetch, stashing the original request.
//! 3. **Fill:** `insert` places a downstream reply into the store, evicting a
//!    victim first when full and producing its writeback.
//!
//! Nothing here knows about time or ports.

use crate::cache::ledger::EvictionLedger;
use crate::cache::store::BlockStore;
use crate::common::{Addr, CacheError, FETCH_REQ_ID_BASE, Invariant, Packet, is_block_aligned};
use crate::config::EvictionPolicy;

/// Where a missed request goes downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forward {
    /// The request is exactly one aligned block and is sent as is.
    Direct(Packet),
    /// The request was smaller than a block.
    Upsized {
        /// Whole-block read sent downstream.
        fetch: Packet,
        /// Original request, answered once the block arrives.
        stash: Packet,
    },
}

impl Forward {
    /// Splits into the packet to send and the request to keep.
    pub fn into_parts(self) -> (Packet, Option<Packet>) {
        match self {
            Self::Direct(pkt) => (pkt, None),
            Self::Upsized { fetch, stash } => (fetch, Some(stash)),
        }
    }
}

/// Block store plus eviction ledger.
#[derive(Debug)]
pub struct AccessEngine {
    store: BlockStore,
    ledger: EvictionLedger,
    block_size: usize,
    next_fetch_id: u64,
}

impl AccessEngine {
    /// Creates an empty engine.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Bytes per block; a power of two.
    /// * `capacity` - Number of blocks held.
    /// * `policy` - Eviction policy.
    /// * `seed` - Seed for the random policy.
    pub fn new(block_size: usize, capacity: usize, policy: EvictionPolicy, seed: u64) -> Self {
        Self {
            store: BlockStore::new(block_size, capacity),
            ledger: EvictionLedger::new(policy, capacity, seed),
            block_size,
            next_fetch_id: FETCH_REQ_ID_BASE,
        }
    }

    /// Returns the block size in bytes.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the block store.
    pub const fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Returns the eviction ledger.
    pub const fn ledger(&self) -> &EvictionLedger {
        &self.ledger
    }

    /// Returns the active eviction policy.
    pub const fn policy(&self) -> EvictionPolicy {
        self.ledger.policy()
    }

    /// Looks `pkt` up and performs it on a hit.
    ///
    /// A hit write overwrites the covered bytes of the block; a hit read
    /// copies them into the packet. A miss has no side effect.
    ///
    /// # Errors
    ///
    /// Fails with [`CacheError::UnknownRequestKind`] if the packet neither
    /// reads nor writes, and with [`CacheError::UnsupportedSpan`] if it covers
    /// bytes of two blocks.
    pub fn try_access(&mut self, pkt: &mut Packet) -> Result<bool, CacheError> {
        if !pkt.is_read() && !pkt.is_write() {
            return Err(CacheError::UnknownRequestKind {
                cmd: pkt.cmd(),
                addr: pkt.addr(),
            });
        }
        self.check_span(pkt)?;

        let Some(block) = self.store.get_mut(pkt.block_addr(self.block_size)) else {
            return Ok(false);
        };
        if pkt.is_write() {
            pkt.write_data_to_block(block);
        } else {
            pkt.set_data_from_block(block);
        }
        Ok(true)
    }

    /// Records a hit on the block at `block_addr`.
    ///
    /// # Errors
    ///
    /// Fails with [`Invariant::LedgerDesync`] if the ledger does not know
    /// the block.
    pub fn touch(&mut self, block_addr: Addr) -> Result<(), Invariant> {
        if self.ledger.record_access(block_addr) {
            Ok(())
        } else {
            Err(Invariant::LedgerDesync(block_addr))
        }
    }

    /// Decides what to send downstream for a missed request.
    ///
    /// Upsized fetches get a fresh request id from a private counter.
    ///
    /// # Errors
    ///
    /// Fails with [`Invariant::MissWithoutResponse`] if the request expects
    /// no reply, with [`CacheError::UnsupportedSpan`] if it crosses a block
    /// boundary, and with [`CacheError::UnknownRequestKind`] if a sub-block
    /// request neither reads nor writes.
    pub fn prepare_forward(&mut self, pkt: Packet) -> Result<Forward, CacheError> {
        if !pkt.needs_response() {
            return Err(Invariant::MissWithoutResponse {
                cmd: pkt.cmd(),
                addr: pkt.addr(),
            }
            .into());
        }
        if pkt.is_whole_block(self.block_size) {
            return Ok(Forward::Direct(pkt));
        }
        self.check_span(&pkt)?;
        if !pkt.is_read() && !pkt.is_write() {
            return Err(CacheError::UnknownRequestKind {
                cmd: pkt.cmd(),
                addr: pkt.addr(),
            });
        }
        let fetch = pkt.block_fetch(self.block_size, self.next_fetch_id);
        self.next_fetch_id = self.next_fetch_id.wrapping_add(1) | FETCH_REQ_ID_BASE;
        tracing::debug!(target: "simple_cache", "upsizing {pkt} to {fetch}");
        Ok(Forward::Upsized { fetch, stash: pkt })
    }

    /// Inserts the block carried by a downstream reply.
    ///
    /// Returns the writeback of the evicted block, if one had to go.
    ///
    /// # Errors
    ///
    /// Fails with [`CacheError::InvariantViolation`] if the reply is not a
    /// whole aligned block response, is already resident, or the ledger and
    /// store disagree about the victim.
    pub fn insert(&mut self, pkt: &Packet) -> Result<Option<Packet>, CacheError> {
        let addr = pkt.addr();
        if !is_block_aligned(addr, self.block_size) {
            return Err(Invariant::UnalignedInsert(addr).into());
        }
        if !pkt.is_response() {
            return Err(Invariant::NotAResponse(addr).into());
        }
        if self.store.contains(addr) {
            return Err(Invariant::DuplicateInsert(addr).into());
        }
        if pkt.size() != self.block_size {
            return Err(Invariant::BlockSizeMismatch {
                addr,
                len: pkt.size(),
                block_size: self.block_size,
            }
            .into());
        }

        let writeback = if self.store.is_full() {
            Some(self.evict()?)
        } else {
            None
        };

        tracing::debug!(target: "insert", "inserting {pkt}");
        self.store.insert(addr, pkt.data().into())?;
        if let Some(displaced) = self.ledger.record_insertion(addr) {
            return Err(Invariant::LedgerDesync(displaced).into());
        }
        if tracing::enabled!(target: "insert", tracing::Level::TRACE) {
            for block in self.store.iter() {
                tracing::trace!(target: "insert", "  {:#x}: {:02x?}", block.addr, &*block.data);
            }
        }
        Ok(writeback)
    }

    fn evict(&mut self) -> Result<Packet, Invariant> {
        let victim = self.ledger.select_victim(&self.store)?;
        let data = self
            .store
            .remove(victim)
            .ok_or(Invariant::LedgerDesync(victim))?;
        if !self.ledger.record_removal(victim) {
            return Err(Invariant::LedgerDesync(victim));
        }
        tracing::debug!(target: "insert", "evicting {victim:#x}");
        Ok(Packet::writeback(victim, data.into_vec()))
    }

    fn check_span(&self, pkt: &Packet) -> Result<(), CacheError> {
        if pkt.fits_in_block(self.block_size) {
            Ok(())
        } else {
            Err(CacheError::UnsupportedSpan {
                addr: pkt.addr(),
                size: pkt.size(),
                block_size: self.block_size,
            })
        }
    }
}
