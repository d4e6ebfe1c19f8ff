use std::collections::HashMap;

/// A string-keyed attribute bag carried by supernodes, superedges, and
/// component sets. Structural fields (keys, levels, interiors) live outside
/// the bag; attributes never participate in equality or hashing.
pub type Attrs = HashMap<String, AttrValue>;

/// A single attribute value.
///
/// Attribute functions return these; the engine stores them verbatim and
/// never interprets them.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    Str(String),
    /// A list of values.
    List(Vec<AttrValue>),
}

impl AttrValue {
    #[allow(missing_docs, reason = "obvious")]
    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(v) = self { Some(*v) } else { None }
    }
    #[allow(missing_docs, reason = "obvious")]
    pub fn as_int(&self) -> Option<i64> {
        if let Self::Int(v) = self { Some(*v) } else { None }
    }
    #[allow(missing_docs, reason = "obvious")]
    pub fn as_float(&self) -> Option<f64> {
        if let Self::Float(v) = self { Some(*v) } else { None }
    }
    #[allow(missing_docs, reason = "obvious")]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::Str(v) = self { Some(v) } else { None }
    }
    #[allow(missing_docs, reason = "obvious")]
    pub fn as_list(&self) -> Option<&[AttrValue]> {
        if let Self::List(v) = self { Some(v) } else { None }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}
impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}
impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}
impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}
