//! Registration table for a component's capability surface.
//!
//! A component declares its creation parameters and services once, with
//! builder calls, and the descriptor builder turns the table into a
//! [`restx_core::ComponentDescriptor`].

use restx_core::ParameterType;

/// Host-side representation of a declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    /// Text
    Text,
    /// Secret text
    Password,
    /// Resource address
    Uri,
    /// Flag
    Boolean,
    /// Whole number
    Integer,
    /// Floating point number
    Float,
    /// Exact decimal
    Decimal,
    /// A host type with no parameter mapping, named for diagnostics
    Opaque(String),
}

impl HostType {
    /// Parameter type this host type maps to, if any
    #[must_use]
    pub fn parameter_type(&self) -> Option<ParameterType> {
        match self {
            Self::Text => Some(ParameterType::String),
            Self::Password => Some(ParameterType::Password),
            Self::Uri => Some(ParameterType::Uri),
            Self::Boolean => Some(ParameterType::Boolean),
            Self::Integer | Self::Float | Self::Decimal => Some(ParameterType::Number),
            Self::Opaque(_) => None,
        }
    }
}

/// Declaration of one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    /// Parameter name
    pub name: String,
    /// Human readable description
    pub description: String,
    /// Host representation
    pub host_type: HostType,
    /// Default value in textual form
    pub default: Option<String>,
    /// Explicit required flag, if the declaration states one
    pub required: Option<bool>,
    /// Whether the parameter may be given as a path segment
    pub positional: bool,
}

impl ParamDecl {
    /// Declare a parameter with no default
    #[must_use]
    pub fn new(name: impl Into<String>, host_type: HostType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            host_type,
            default: None,
            required: None,
            positional: false,
        }
    }

    /// Give the parameter a default, in textual form
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// State the required flag explicitly
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Mark the parameter as positional
    #[must_use]
    pub fn positional(mut self) -> Self {
        self.positional = true;
        self
    }
}

/// Declaration of one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDecl {
    /// Service name
    pub name: String,
    /// Human readable description
    pub description: String,
    /// Declared parameters, in order
    pub params: Vec<ParamDecl>,
}

impl ServiceDecl {
    /// Declare a service with no parameters
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn param(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }
}

/// The full registration table of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Component name
    pub name: String,
    /// Short description
    pub description: String,
    /// Longer documentation
    pub doc: String,
    /// Resource creation parameters
    pub params: Vec<ParamDecl>,
    /// Services, in order
    pub services: Vec<ServiceDecl>,
}

impl ComponentSpec {
    /// Start a registration table
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        doc: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            doc: doc.into(),
            params: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Add a resource creation parameter
    #[must_use]
    pub fn param(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    /// Add a service
    #[must_use]
    pub fn service(mut self, decl: ServiceDecl) -> Self {
        self.services.push(decl);
        self
    }
}
