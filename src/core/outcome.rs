//! Fixed-shape results threaded through the chains

use serde_json::Value;

/// Error-or-values delivered by a target and, finally, to the terminal receiver
///
/// `error` takes the place of the leading error slot of a completion callback;
/// `values` are the remaining positional results.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Flow error, if the operation or a hook failed
    pub error: Option<anyhow::Error>,

    /// Positional result values
    pub values: Vec<Value>,
}

impl Outcome {
    /// A successful outcome carrying `values`
    pub fn ok(values: Vec<Value>) -> Self {
        Self {
            error: None,
            values,
        }
    }

    /// A failed outcome
    pub fn err(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: Some(error.into()),
            values: Vec::new(),
        }
    }

    /// A successful outcome with no values
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether this outcome carries an error
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Convert into a `Result`, dropping values on the error path
    pub fn into_result(self) -> anyhow::Result<Vec<Value>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.values),
        }
    }
}

impl From<anyhow::Result<Vec<Value>>> for Outcome {
    fn from(result: anyhow::Result<Vec<Value>>) -> Self {
        match result {
            Ok(values) => Outcome::ok(values),
            Err(err) => Outcome::err(err),
        }
    }
}
