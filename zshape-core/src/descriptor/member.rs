use super::TypeDescriptor;

/// Name every constructor carries.
pub const CONSTRUCTOR_NAME: &str = ".ctor";

/// A member of a described type.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberDescriptor {
    /// A field.
    Field(FieldDescriptor),
    /// A property.
    Property(PropertyDescriptor),
    /// A method.
    Method(MethodDescriptor),
    /// A constructor.
    Constructor(ConstructorDescriptor),
}

impl MemberDescriptor {
    /// The member's name.
    pub fn name(&self) -> &str {
        match self {
            MemberDescriptor::Field(f) => &f.name,
            MemberDescriptor::Property(p) => &p.name,
            MemberDescriptor::Method(m) => &m.name,
            MemberDescriptor::Constructor(_) => CONSTRUCTOR_NAME,
        }
    }

    /// The type declaring the member.
    pub fn declaring_type(&self) -> &TypeDescriptor {
        match self {
            MemberDescriptor::Field(f) => &f.declaring_type,
            MemberDescriptor::Property(p) => &p.declaring_type,
            MemberDescriptor::Method(m) => &m.declaring_type,
            MemberDescriptor::Constructor(c) => &c.declaring_type,
        }
    }

    /// Whether the member is static, if known.
    pub fn is_static(&self) -> Option<bool> {
        match self {
            MemberDescriptor::Field(f) => f.is_static,
            MemberDescriptor::Property(p) => p.is_static,
            MemberDescriptor::Method(m) => m.is_static,
            MemberDescriptor::Constructor(c) => c.is_static,
        }
    }

    /// The value type of a field or property.
    pub fn value_type(&self) -> Option<&TypeDescriptor> {
        match self {
            MemberDescriptor::Field(f) => Some(&f.value_type),
            MemberDescriptor::Property(p) => Some(&p.value_type),
            MemberDescriptor::Method(_) | MemberDescriptor::Constructor(_) => None,
        }
    }

    /// The parameters of a method or constructor.
    pub fn parameters(&self) -> &[TypeDescriptor] {
        match self {
            MemberDescriptor::Method(m) => &m.parameters,
            MemberDescriptor::Constructor(c) => &c.parameters,
            MemberDescriptor::Field(_) | MemberDescriptor::Property(_) => &[],
        }
    }
}

/// A field of a described type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    declaring_type: TypeDescriptor,
    is_static: Option<bool>,
    value_type: TypeDescriptor,
}

impl FieldDescriptor {
    /// An instance field.
    pub fn new(
        name: impl Into<String>,
        declaring_type: TypeDescriptor,
        value_type: TypeDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            is_static: Some(false),
            value_type,
        }
    }

    /// The field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type declaring the field.
    pub fn declaring_type(&self) -> &TypeDescriptor {
        &self.declaring_type
    }

    /// Whether the field is static, if known.
    pub fn is_static(&self) -> Option<bool> {
        self.is_static
    }

    /// The field's type.
    pub fn value_type(&self) -> &TypeDescriptor {
        &self.value_type
    }
}

/// A property of a described type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    name: String,
    declaring_type: TypeDescriptor,
    is_static: Option<bool>,
    value_type: TypeDescriptor,
    read_only: bool,
}

impl PropertyDescriptor {
    /// An instance property of unknown mutability.
    pub fn new(
        name: impl Into<String>,
        declaring_type: TypeDescriptor,
        value_type: TypeDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            is_static: Some(false),
            value_type,
            read_only: false,
        }
    }

    /// Mark the property read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The property's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type declaring the property.
    pub fn declaring_type(&self) -> &TypeDescriptor {
        &self.declaring_type
    }

    /// Whether the property is static, if known.
    pub fn is_static(&self) -> Option<bool> {
        self.is_static
    }

    /// The property's declared type.
    pub fn value_type(&self) -> &TypeDescriptor {
        &self.value_type
    }

    /// Whether the property can only be set through a constructor.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// A method of a described type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    name: String,
    declaring_type: TypeDescriptor,
    is_static: Option<bool>,
    parameters: Vec<TypeDescriptor>,
    generic_arguments: Vec<TypeDescriptor>,
}

impl MethodDescriptor {
    /// A method with unknown staticness.
    pub fn new(
        name: impl Into<String>,
        declaring_type: TypeDescriptor,
        parameters: Vec<TypeDescriptor>,
        generic_arguments: Vec<TypeDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            is_static: None,
            parameters,
            generic_arguments,
        }
    }

    /// The method's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type declaring the method.
    pub fn declaring_type(&self) -> &TypeDescriptor {
        &self.declaring_type
    }

    /// Whether the method is static, if known.
    pub fn is_static(&self) -> Option<bool> {
        self.is_static
    }

    /// Ordered parameter types.
    pub fn parameters(&self) -> &[TypeDescriptor] {
        &self.parameters
    }

    /// Ordered generic arguments.
    pub fn generic_arguments(&self) -> &[TypeDescriptor] {
        &self.generic_arguments
    }
}

/// A constructor of a described type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    declaring_type: TypeDescriptor,
    is_static: Option<bool>,
    parameters: Vec<TypeDescriptor>,
}

impl ConstructorDescriptor {
    /// A constructor taking the given parameters.
    pub fn new(declaring_type: TypeDescriptor, parameters: Vec<TypeDescriptor>) -> Self {
        Self {
            declaring_type,
            is_static: Some(false),
            parameters,
        }
    }

    /// Always [`CONSTRUCTOR_NAME`].
    pub fn name(&self) -> &str {
        CONSTRUCTOR_NAME
    }

    /// The constructed type.
    pub fn declaring_type(&self) -> &TypeDescriptor {
        &self.declaring_type
    }

    /// Whether the constructor is static, if known.
    pub fn is_static(&self) -> Option<bool> {
        self.is_static
    }

    /// Ordered parameter types.
    pub fn parameters(&self) -> &[TypeDescriptor] {
        &self.parameters
    }
}
