/// Result of an operation that can be refused without anything going wrong.
///
/// Infrastructure failures travel in the surrounding `anyhow::Result`; this
/// type only separates the ways a well-formed request can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    /// The caller lacks the capability for this operation.
    Denied,
    NotFound,
    /// Input was rejected; the message is safe to show to the caller.
    Invalid(&'static str),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Denied => Outcome::Denied,
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Invalid(reason) => Outcome::Invalid(reason),
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Outcome::Done(value),
            None => Outcome::NotFound,
        }
    }
}
