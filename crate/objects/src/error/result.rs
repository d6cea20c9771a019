use std::fmt::Display;

use crate::PkiError;

pub type PkiResult<R> = Result<R, PkiError>;

pub trait PkiResultHelper<T> {
    fn context(self, context: &str) -> PkiResult<T>;
    fn with_context<D, O>(self, op: O) -> PkiResult<T>
    where
        D: Display + Send + Sync + 'static,
        O: FnOnce() -> D;
}

impl<T, E> PkiResultHelper<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn context(self, context: &str) -> PkiResult<T> {
        self.map_err(|e| PkiError::Default(format!("{context}: {e}")))
    }

    fn with_context<D, O>(self, op: O) -> PkiResult<T>
    where
        D: Display + Send + Sync + 'static,
        O: FnOnce() -> D,
    {
        self.map_err(|e| PkiError::Default(format!("{}: {e}", op())))
    }
}

impl<T> PkiResultHelper<T> for Option<T> {
    fn context(self, context: &str) -> PkiResult<T> {
        self.ok_or_else(|| PkiError::Default(context.to_owned()))
    }

    fn with_context<D, O>(self, op: O) -> PkiResult<T>
    where
        D: Display + Send + Sync + 'static,
        O: FnOnce() -> D,
    {
        self.ok_or_else(|| PkiError::Default(format!("{}", op())))
    }
}
