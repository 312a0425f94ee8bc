use crate::error::LedgerError;
use crate::id::AccountId;

/// Shared authorization capability for components with a single privileged
/// account recorded at deployment
///
/// Each component implements this independently so the Registry and the
/// Marketplace keep separate lifecycles and separate `owner` fields.
pub trait Ownable {
    /// The privileged account set at deployment
    fn owner(&self) -> &AccountId;

    /// Reject a caller that is not the owner
    ///
    /// # Returns
    /// * `Ok(())` - The caller is the owner
    /// * `Err(Unauthorized)` - Any other caller, with the fixed reason
    ///   "caller is not the owner"
    fn require_owner(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if caller != self.owner() {
            return Err(LedgerError::not_owner());
        }
        Ok(())
    }
}
