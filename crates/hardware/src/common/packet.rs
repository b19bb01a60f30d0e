//! Memory request/response packets.
//!
//! A `Packet` is the single message type exchanged between request sources,
//! the cache, and the downstream memory. It carries a command, a byte address,
//! a size, and a data payload that always holds exactly `size` bytes.

use std::fmt;

use serde::Serialize;

use super::addr::{Addr, block_align, block_offset};

/// Request id used for packets the cache originates itself (writebacks).
pub const INTERNAL_REQ_ID: u64 = 0;

/// First request id of the whole-block fetches the cache synthesizes.
/// Ids at or above it never collide with requestor ids.
pub const FETCH_REQ_ID_BASE: u64 = 1 << 63;

/// Memory command carried by a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MemCmd {
    /// Read request; expects a `ReadResp`.
    ReadReq,
    /// Response to a `ReadReq`, carrying the read bytes.
    ReadResp,
    /// Write request carrying the bytes to write; expects a `WriteResp`.
    WriteReq,
    /// Response to a `WriteReq`.
    WriteResp,
    /// Forced writeback of an evicted block. Carries the block's bytes and
    /// expects no response.
    WritebackDirty,
    /// Eviction notice without data. Neither a read nor a write.
    CleanEvict,
}

impl MemCmd {
    /// Returns `true` for commands that read memory.
    pub const fn is_read(self) -> bool {
        matches!(self, Self::ReadReq | Self::ReadResp)
    }

    /// Returns `true` for commands that write memory.
    pub const fn is_write(self) -> bool {
        matches!(self, Self::WriteReq | Self::WriteResp | Self::WritebackDirty)
    }

    /// Returns `true` for response commands.
    pub const fn is_response(self) -> bool {
        matches!(self, Self::ReadResp | Self::WriteResp)
    }

    /// Returns `true` for request commands.
    pub const fn is_request(self) -> bool {
        !self.is_response()
    }

    /// Returns `true` if the receiver must eventually answer this command.
    pub const fn needs_response(self) -> bool {
        matches!(self, Self::ReadReq | Self::WriteReq)
    }

    /// Returns the response command paired with this request, if any.
    pub const fn response_command(self) -> Option<Self> {
        match self {
            Self::ReadReq => Some(Self::ReadResp),
            Self::WriteReq => Some(Self::WriteResp),
            _ => None,
        }
    }
}

impl fmt::Display for MemCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A memory transaction in flight between two ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    cmd: MemCmd,
    addr: Addr,
    req_id: u64,
    data: Vec<u8>,
}

impl Packet {
    /// Creates a read request for `size` bytes at `addr`. The payload is
    /// allocated and zero-filled.
    pub fn read(req_id: u64, addr: Addr, size: usize) -> Self {
        Self {
            cmd: MemCmd::ReadReq,
            addr,
            req_id,
            data: vec![0; size],
        }
    }

    /// Creates a write request storing `data` at `addr`.
    pub fn write(req_id: u64, addr: Addr, data: Vec<u8>) -> Self {
        Self {
            cmd: MemCmd::WriteReq,
            addr,
            req_id,
            data,
        }
    }

    /// Creates a forced writeback of a whole block.
    pub fn writeback(addr: Addr, data: Vec<u8>) -> Self {
        Self {
            cmd: MemCmd::WritebackDirty,
            addr,
            req_id: INTERNAL_REQ_ID,
            data,
        }
    }

    /// Creates a packet with an arbitrary command. Mostly useful for tests
    /// and for commands without a dedicated constructor.
    pub fn with_cmd(cmd: MemCmd, req_id: u64, addr: Addr, size: usize) -> Self {
        Self {
            cmd,
            addr,
            req_id,
            data: vec![0; size],
        }
    }

    /// Returns the packet command.
    pub const fn cmd(&self) -> MemCmd {
        self.cmd
    }

    /// Returns the first byte address touched by the packet.
    pub const fn addr(&self) -> Addr {
        self.addr
    }

    /// Returns the access size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the id of the request this packet belongs to.
    pub const fn req_id(&self) -> u64 {
        self.req_id
    }

    /// Returns the payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the payload mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the packet and returns its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns `true` if the packet reads memory.
    pub const fn is_read(&self) -> bool {
        self.cmd.is_read()
    }

    /// Returns `true` if the packet writes memory.
    pub const fn is_write(&self) -> bool {
        self.cmd.is_write()
    }

    /// Returns `true` if the packet is a response.
    pub const fn is_response(&self) -> bool {
        self.cmd.is_response()
    }

    /// Returns `true` if the packet expects a response.
    pub const fn needs_response(&self) -> bool {
        self.cmd.needs_response()
    }

    /// Returns the address of the block containing the first byte.
    pub const fn block_addr(&self, block_size: usize) -> Addr {
        block_align(self.addr, block_size)
    }

    /// Returns `true` if the packet is exactly one whole, aligned block.
    pub fn is_whole_block(&self, block_size: usize) -> bool {
        self.addr == self.block_addr(block_size) && self.size() == block_size
    }

    /// Returns `true` if `[addr, addr + size)` stays inside one block.
    pub fn fits_in_block(&self, block_size: usize) -> bool {
        block_offset(self.addr, block_size) + self.size() <= block_size
    }

    /// Turns a request into its response in place. Packets whose command has
    /// no response form are left untouched.
    pub fn make_response(&mut self) {
        debug_assert!(self.needs_response(), "{self} does not need a response");
        if let Some(resp) = self.cmd.response_command() {
            self.cmd = resp;
        }
    }

    /// Builds the whole-block read, with id `req_id`, that fetches the block
    /// containing this packet.
    pub fn block_fetch(&self, block_size: usize, req_id: u64) -> Self {
        Self::read(req_id, self.block_addr(block_size), block_size)
    }

    /// Copies this packet's payload into `block` at the packet's offset.
    /// `block` must be one whole block and the packet must fit inside it.
    pub fn write_data_to_block(&self, block: &mut [u8]) {
        let offset = block_offset(self.addr, block.len());
        block[offset..offset + self.data.len()].copy_from_slice(&self.data);
    }

    /// Fills this packet's payload from `block` at the packet's offset.
    /// `block` must be one whole block and the packet must fit inside it.
    pub fn set_data_from_block(&mut self, block: &[u8]) {
        let offset = block_offset(self.addr, block.len());
        let len = self.data.len();
        self.data.copy_from_slice(&block[offset..offset + len]);
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self
            .addr
            .saturating_add((self.data.len() as u64).saturating_sub(1));
        write!(
            f,
            "{} [{:x}:{:x}] req={}",
            self.cmd, self.addr, last, self.req_id
        )
    }
}
