use super::Result;

/// Absorb errors from best effort operations
///
/// Used for everything that must never fail a run: the location lookup,
/// log retrieval and job deletion. The error and its causes are logged as warnings.
pub trait OrWarn<T> {
    fn or_warn(self, context: &str) -> Option<T>;
}

impl<T> OrWarn<T> for Result<T> {
    fn or_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("{}: {}", context, e);
                for cause in e.iter().skip(1) {
                    warn!("caused by: {}", cause);
                }
                None
            }
        }
    }
}
