pub mod client;
pub mod connectivity;
pub mod migrate;
pub mod probes;

pub use client::ClientLoadStep;
pub use connectivity::ConnectivityStep;
pub use migrate::MigrateStep;
pub use probes::{LibraryIndexProbe, ProbeStep, RedisDnsProbe, TlsCommandProbe};
