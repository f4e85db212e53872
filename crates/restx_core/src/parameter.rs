//! Parameter definitions.

use crate::error::{RestxError, Result};
use crate::json::{self, Value};
use crate::types::ParameterType;

/// Definition of one named, typed parameter
///
/// A parameter without a default is required. An optional parameter's
/// default is always already converted to the parameter's type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    name: String,
    param_type: ParameterType,
    description: String,
    default: Option<Value>,
}

impl ParameterDefinition {
    /// Create a required parameter
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            default: None,
        }
    }

    /// Create an optional parameter with a default value
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the default cannot be converted to the type
    pub fn optional(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
        default: &Value,
    ) -> Result<Self> {
        let mut param = Self::required(name, param_type, description);
        let converted = param.convert(Some(default))?;
        param.default = Some(converted);
        Ok(param)
    }

    /// Create an optional parameter from the textual form of its default
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the text cannot be converted to the type
    pub fn optional_from_text(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
        default: &str,
    ) -> Result<Self> {
        Self::optional(
            name,
            param_type,
            description,
            &Value::String(default.to_string()),
        )
    }

    /// Parameter name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type
    #[must_use]
    pub fn param_type(&self) -> ParameterType {
        self.param_type
    }

    /// Human readable description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Default value, present only for optional parameters
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Check whether a value must be supplied
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Convert a raw value to this parameter's type
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value does not fit the type
    pub fn convert(&self, raw: Option<&Value>) -> Result<Value> {
        self.param_type
            .convert(raw)
            .ok_or_else(|| RestxError::TypeMismatch {
                parameter: self.name.clone(),
                expected: self.param_type.token().to_string(),
                value: raw.map_or_else(|| "<absent>".to_string(), json::render),
            })
    }

    /// Check that a candidate value converts, discarding the result
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value does not fit the type
    pub fn sanity_check(&self, value: &Value) -> Result<()> {
        self.convert(Some(value)).map(|_| ())
    }
}
