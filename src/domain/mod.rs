// Squid mem report rows
pub mod mempool;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
