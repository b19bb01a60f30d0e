
/// Access engine: lookup, forward decisions, and fill.
pub mod engine;



/// Set-associative tags with FIFO-by-way and LRU-by-way replacement.
pub mod tags;
