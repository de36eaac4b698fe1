pub mod http_client_factory;
pub mod mock;
pub mod observability;
pub mod squid_mgr;

pub use squid_mgr::SquidManagerSource;
