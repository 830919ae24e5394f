//! Transaction identifier type.

use std::fmt;

/// Identifies a transaction.
///
/// Opaque to the buffer pool: it is only the key under which lock
/// ownership and dirty ownership are tracked.
///
/// # Example
/// ```
/// use strictpool::TransactionId;
///
/// let txn = TransactionId::new(5);
/// assert_eq!(format!("{}", txn), "Txn(5)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Create a new TransactionId.
    #[inline]
    pub fn new(id: u64) -> Self {
        TransactionId(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_equality() {
        assert_eq!(TransactionId::new(5), TransactionId::new(5));
        assert_ne!(TransactionId::new(5), TransactionId::new(6));
    }

    #[test]
    fn test_transaction_id_display() {
        assert_eq!(format!("{}", TransactionId::new(42)), "Txn(42)");
    }
}
