use std::fmt;

pub trait ResultOkLogExt<T, E> {
    /// Converts the result into an `Option`, logging the error at `level` with `context`.
    fn ok_log(self, level: log::Level, context: impl fmt::Display) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, level: log::Level, context: impl fmt::Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::log!(level, "{context}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_ok_log() {
        let ok: Result<u8, Boom> = Ok(3);
        assert_eq!(ok.ok_log(log::Level::Debug, "ctx"), Some(3));

        let err: Result<u8, Boom> = Err(Boom);
        assert_eq!(err.ok_log(log::Level::Debug, "ctx"), None);
    }
}
