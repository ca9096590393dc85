//! Panicking variants of the fallible operations, for tests and scripts.
//!
//! Everything else in the crate returns errors; only this module panics.

use entwine_core::Result;

use crate::entity::Entity;
use crate::query::Query;

/// Unwraps a [`Result`], panicking with the error's message.
pub trait Must<T> {
    fn must(self) -> T;
}

impl<T> Must<T> for Result<T> {
    #[track_caller]
    fn must(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => panic!("entwine: {err}"),
        }
    }
}

/// `_x` terminals on [`Query`]: the same operations, panicking on error.
pub trait QueryX<T: Entity> {
    fn all_x(&self) -> Vec<T>;

    /// `None` when nothing matches; any other error panics.
    fn first_x(&self) -> Option<T>;

    fn only_x(&self) -> T;

    fn ids_x(&self) -> Vec<String>;

    fn count_x(&self) -> usize;

    fn exist_x(&self) -> bool;
}

impl<T: Entity> QueryX<T> for Query<T> {
    #[track_caller]
    fn all_x(&self) -> Vec<T> {
        self.all().must()
    }

    #[track_caller]
    fn first_x(&self) -> Option<T> {
        match self.first() {
            Ok(node) => Some(node),
            Err(err) if err.is_not_found() => None,
            Err(err) => panic!("entwine: {err}"),
        }
    }

    #[track_caller]
    fn only_x(&self) -> T {
        self.only().must()
    }

    #[track_caller]
    fn ids_x(&self) -> Vec<String> {
        self.ids().must()
    }

    #[track_caller]
    fn count_x(&self) -> usize {
        self.count().must()
    }

    #[track_caller]
    fn exist_x(&self) -> bool {
        self.exist().must()
    }
}
