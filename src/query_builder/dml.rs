use crate::error::NimbleError;
use crate::results::ExecuteOutcome;

use super::NbQuery;

impl NbQuery<'_, '_> {
    /// Execute a statement that returns no rows.
    ///
    /// The generated key, if the driver reports one, is in the outcome.
    ///
    /// # Errors
    ///
    /// Returns binding errors for unresolved parameters and driver errors.
    pub fn execute(self) -> Result<ExecuteOutcome, NimbleError> {
        let prepared = self.prepare()?;
        self.conn.run_update(&prepared)
    }

    /// Run the SQL as a batch, without parameters.
    ///
    /// # Errors
    ///
    /// Returns driver errors.
    pub fn batch(self) -> Result<(), NimbleError> {
        self.conn.execute_batch(&self.sql)
    }
}
