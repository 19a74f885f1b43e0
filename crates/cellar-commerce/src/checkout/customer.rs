//! Delivery contact details.

use crate::error::CommerceError;
use serde::{Deserialize, Serialize};

/// Who receives the order and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl CustomerInfo {
    /// Trim every field; all three are required.
    pub fn validated(self) -> Result<Self, CommerceError> {
        let info = Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        };
        let missing: Vec<&str> = [
            ("name", &info.name),
            ("phone", &info.phone),
            ("address", &info.address),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(info)
        } else {
            Err(CommerceError::ValidationError(format!(
                "missing customer {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_trims() {
        let info = CustomerInfo {
            name: " Minh ".into(),
            phone: "0901 ".into(),
            address: " 12 Hai Ba Trung".into(),
        }
        .validated()
        .unwrap();
        assert_eq!(info.name, "Minh");
        assert_eq!(info.phone, "0901");
    }

    #[test]
    fn test_validated_lists_missing_fields() {
        let err = CustomerInfo {
            name: "Minh".into(),
            phone: "  ".into(),
            address: String::new(),
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: missing customer phone, address");
    }
}
