use crate::domain::substrate::resource_error::ResourceError;

/// Common accounting of a capacity-bounded substrate resource (node cpu or link bandwidth).
///
/// Invariant: `0 <= get_available() <= get_capacity()`.
pub trait Resource: std::fmt::Debug {
    /// Returns the capacity
    fn get_capacity(&self) -> i64;

    /// Returns the currently unreserved amount
    fn get_available(&self) -> i64;

    fn set_available(&mut self, available: i64);

    /// Human readable name used in error messages and statistics
    fn get_label(&self) -> String;

    fn can_handle(&self, amount: i64) -> bool {
        amount >= 0 && amount <= self.get_available()
    }

    /// Fraction of the capacity currently reserved, `1 - available / capacity`.
    fn get_utilization(&self) -> f64 {
        if self.get_capacity() <= 0 {
            return 0.0;
        }
        1.0 - self.get_available() as f64 / self.get_capacity() as f64
    }

    /// Releases `amount`, refusing to push availability above capacity.
    fn release_amount(&mut self, amount: i64) -> Result<(), ResourceError> {
        if amount < 0 {
            return Err(ResourceError::NegativeAmount(amount));
        }
        if self.get_available() + amount > self.get_capacity() {
            return Err(ResourceError::OverRelease { resource: self.get_label(), amount, capacity: self.get_capacity() });
        }
        self.set_available(self.get_available() + amount);
        Ok(())
    }
}
