// Adapters layer: concrete implementations of the domain ports (processes, DNS, database, exec).

pub mod dns;
pub mod handoff;
pub mod postgres;
pub mod process;

pub use dns::SystemResolver;
pub use handoff::ExecHandoff;
pub use postgres::PgDatabaseProbe;
pub use process::SystemCommandRunner;
