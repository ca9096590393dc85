use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use entwine_core::{Dialect, Driver, EntError, Result, Rows, Statement};

use crate::entity::Entity;
use crate::query::Query;
use crate::transaction::{Tx, TxState};

/// Everything a builder needs to run: the driver, the dialect it renders
/// for and whether statements are logged.
#[derive(Clone)]
pub struct Config {
    driver: Arc<dyn Driver>,
    dialect: Dialect,
    debug: bool,
}

impl Config {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::from_arc(Arc::new(driver))
    }

    pub fn from_arc(driver: Arc<dyn Driver>) -> Self {
        let dialect = driver.dialect();
        Self {
            driver,
            dialect,
            debug: false,
        }
    }

    /// Logs every statement with its arguments at info level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the dialect reported by the driver.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[inline]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub(crate) fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("driver", &self.driver.name())
            .field("dialect", &self.dialect)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Where statements go: the pooled driver or one open transaction.
#[derive(Clone)]
pub(crate) enum Executor {
    Driver,
    Tx(Arc<TxState>),
}

/// Entry point for building queries.
///
/// Cheap to clone; every builder carries its own copy.
#[derive(Clone)]
pub struct Client {
    config: Config,
    executor: Executor,
}

impl Client {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::with_config(Config::new(driver))
    }

    pub fn with_config(config: Config) -> Self {
        Self::bound(config, Executor::Driver)
    }

    pub(crate) fn bound(config: Config, executor: Executor) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Starts building a query over `T`.
    pub fn query<T: Entity>(&self) -> Query<T> {
        Query::new(self.clone())
    }

    /// Whether this client routes through a transaction.
    pub fn in_tx(&self) -> bool {
        matches!(self.executor, Executor::Tx(_))
    }

    /// Starts a transaction on a dedicated connection.
    pub fn tx(&self) -> Result<Tx> {
        if self.in_tx() {
            return Err(EntError::invalid(
                "cannot start a transaction within a transaction",
            ));
        }
        Tx::begin(self.config.clone())
    }

    /// Runs `f` in a transaction: commits on `Ok`, rolls back on `Err` or
    /// panic (the panic is resumed).
    pub fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Tx) -> Result<R>,
    {
        let tx = self.tx()?;

        let result = panic::catch_unwind(AssertUnwindSafe(|| f(&tx)));

        match result {
            Ok(Ok(value)) => {
                tx.commit()?;
                Ok(value)
            }
            Ok(Err(e)) => {
                tx.rollback()?;
                Err(e)
            }
            Err(panic_payload) => {
                drop(tx);
                panic::resume_unwind(panic_payload);
            }
        }
    }

    /// Runs a statement that returns rows.
    pub fn query_raw(&self, stmt: &Statement) -> Result<Rows> {
        self.log(stmt);
        match &self.executor {
            Executor::Driver => self.config.driver.query(stmt),
            Executor::Tx(tx) => tx.query(stmt),
        }
    }

    /// Runs a statement and returns the number of affected rows.
    pub fn exec(&self, stmt: &Statement) -> Result<usize> {
        self.log(stmt);
        match &self.executor {
            Executor::Driver => self.config.driver.exec(stmt),
            Executor::Tx(tx) => tx.exec(stmt),
        }
    }

    #[inline]
    fn log(&self, stmt: &Statement) {
        entwine_core::ent_trace_query!(&stmt.sql, stmt.args.len());
        if self.config.debug {
            #[cfg(feature = "tracing")]
            tracing::info!(sql = %stmt.sql, args = ?stmt.args, tx = self.in_tx(), "entwine.debug");
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("tx", &self.in_tx())
            .finish()
    }
}
