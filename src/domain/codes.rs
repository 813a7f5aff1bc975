use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Top-level budget category. Keyed by a human-assigned code, stored
/// uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalPlan {
    pub code: String,
}

impl InternalPlan {
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            code: normalize_code(code, "internal plan code")?.to_uppercase(),
        })
    }
}

/// Budget sub-category, belongs to exactly one internal plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseNature {
    pub code: String,
    pub plan_code: String,
}

impl ExpenseNature {
    pub fn new(code: &str, plan_code: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            code: normalize_code(code, "expense nature code")?,
            plan_code: normalize_code(plan_code, "internal plan code")?.to_uppercase(),
        })
    }
}

/// Organizational unit that draws commitments. Stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestingSection {
    pub code: String,
}

impl RequestingSection {
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            code: normalize_code(code, "requesting section code")?.to_uppercase(),
        })
    }
}

/// Trim a human-assigned code and reject empty input.
pub fn normalize_code(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_code_uppercased() {
        let plan = InternalPlan::new("abc123").unwrap();
        assert_eq!(plan.code, "ABC123");
    }

    #[test]
    fn test_empty_code_rejected() {
        assert!(InternalPlan::new("   ").is_err());
        assert!(RequestingSection::new("").is_err());
        assert!(ExpenseNature::new("339030", "").is_err());
    }

    #[test]
    fn test_nature_keeps_own_code_verbatim() {
        let nature = ExpenseNature::new(" 339030 ", "abc").unwrap();
        assert_eq!(nature.code, "339030");
        assert_eq!(nature.plan_code, "ABC");
    }
}
