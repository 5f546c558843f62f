//! Error values shared by every consumer of the value layer.

use crate::value::ValueType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// A value was accessed (or supplied) as a type it does not carry.
    #[error("expected a {expected:?} value, got {found:?}")]
    BadType {
        expected: ValueType,
        found: ValueType,
    },
}

impl crate::value::Value {
    /// Check the active tag against an expected type.
    pub fn check_type(&self, expected: &ValueType) -> Result<(), ValueError> {
        let found = self.value_type();
        if &found == expected {
            Ok(())
        } else {
            Err(ValueError::BadType {
                expected: expected.clone(),
                found,
            })
        }
    }
}
