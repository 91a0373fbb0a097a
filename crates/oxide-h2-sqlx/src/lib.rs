//! # oxide-h2-sqlx
//!
//! A blocking [`Executor`](oxide_h2::executor::Executor) for `oxide-h2`,
//! backed by sqlx.
//!
//! H2 has no native sqlx driver. Instead, an H2 server started with its
//! PostgreSQL listener (`-pg`) is reached through sqlx's PostgreSQL driver,
//! with H2 running in PostgreSQL compatibility mode.
//!
//! ```rust,no_run
//! use oxide_h2::prelude::*;
//! use oxide_h2_sqlx::SqlxExecutor;
//!
//! # fn main() -> Result<()> {
//! let mut executor = SqlxExecutor::connect("postgres://sa@localhost:5435", "mem:test")?;
//! let config = DialectConfig::default();
//! let tables = Reflector::new(&config).list_tables(&mut executor, None)?;
//! println!("{tables:?}");
//! # Ok(())
//! # }
//! ```

mod executor;
mod placeholders;

pub use executor::{pool_options, SqlxExecutor};
pub use placeholders::{to_positional, PositionalStatement};
