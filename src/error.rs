use crate::fmt::WriteError;
use crate::parse::ParseError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors raised while decoding or encoding.
///
/// Every variant aborts only the current top-level call. No partially built value is ever
/// returned alongside an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    /// Two members of `ty` resolve to the same wire name `name`.
    #[error("type {ty} has more than one member using the wire name '{name}'")]
    Configuration {
        /// The type whose descriptor failed to build.
        ty: String,
        /// The colliding wire name.
        name: String,
    },
    /// A value could not be coerced to the requested type.
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
    /// An object key matched no member and unknown keys are not tolerated.
    #[error("the type {ty} doesn't have the property '{key}'")]
    UnknownMember {
        /// The decoded type.
        ty: String,
        /// The offending object key.
        key: String,
    },
    /// Encoding or decoding nested deeper than the configured maximum.
    #[error("max allowed object depth of {max} reached while mapping type {ty}")]
    DepthExceeded {
        /// The type being mapped when the limit was hit.
        ty: String,
        /// The configured maximum.
        max: usize,
    },
    /// A type-hint envelope was missing its value key or carried extra properties.
    #[error("invalid type hinting object: {0}")]
    MalformedEnvelope(String),
    /// A type-hint envelope named a type the mapper does not know.
    #[error("the type name '{0}' is not registered with the mapper")]
    UnregisteredType(String),
    /// The JSON text is not well formed.
    #[error(transparent)]
    Syntax(#[from] ParseError),
    /// The output sink rejected a write.
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// The ways a value can fail to fit the requested type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeMismatch {
    /// A scalar literal has no coercion to the target.
    #[error("can't assign value '{literal}' (type {kind}) to type {target}")]
    Scalar {
        /// The literal as it appeared in the token stream.
        literal: String,
        /// The native kind of the literal.
        kind: String,
        /// The requested type.
        target: String,
    },
    /// The literal is within the source kind but outside the target's range.
    #[error("value '{literal}' is out of range for type {target}")]
    Overflow {
        /// The literal value.
        literal: String,
        /// The requested type.
        target: String,
    },
    /// `null` was given for a type which can't be absent.
    #[error("can't assign null to an instance of type {target}")]
    Null {
        /// The requested type.
        target: String,
    },
    /// A sequence was given for a type which is neither array nor list capable.
    #[error("type {target} can't act as an array")]
    NotSequence {
        /// The requested type.
        target: String,
    },
    /// An object was given for a type which isn't a map or structured object.
    #[error("type {target} can't act as an object")]
    NotObject {
        /// The requested type.
        target: String,
    },
    /// A fixed size array received the wrong number of elements.
    #[error("type {target} expects {expected} elements, found {found}")]
    Length {
        /// Required element count.
        expected: usize,
        /// Decoded element count.
        found: usize,
        /// The requested type.
        target: String,
    },
    /// A decoded value of type `found` does not fit a slot of type `target`.
    #[error("a value of type {found} can't be stored in a slot of type {target}")]
    Slot {
        /// The runtime type of the decoded value.
        found: String,
        /// The declared slot type.
        target: String,
    },
    /// The type has neither a registered factory nor a declared constructor.
    #[error("type {target} has no factory or constructor")]
    NoConstructor {
        /// The requested type.
        target: String,
    },
    /// The type has no way to be written.
    #[error("type {target} has no exporter")]
    NoExporter {
        /// The type being encoded.
        target: String,
    },
}
