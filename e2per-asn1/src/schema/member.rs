//! Members of constructed types and references between descriptors

use crate::ber::Tag;
use crate::schema::descriptor::TypeDescriptor;
use e2per_core::{CodecError, CodecResult, Value};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Presence rule of a SEQUENCE member
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Presence {
    #[default]
    Mandatory,
    Optional,
    /// `DEFAULT value`: may be absent, in which case the default applies
    Default(Value),
}

impl Presence {
    /// Check if the member gets a presence bit in the root bitmap
    pub fn has_presence_bit(&self) -> bool {
        !matches!(self, Presence::Mandatory)
    }
}

/// Forward reference to a descriptor that is built later
///
/// Needed for recursive schemas: create the `Deferred`, use it as a member
/// type, then [`resolve`](Deferred::resolve) it once the target exists.
#[derive(Clone, Default)]
pub struct Deferred {
    target: Arc<OnceLock<Arc<TypeDescriptor>>>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the reference at its target; a reference resolves only once
    pub fn resolve(&self, target: Arc<TypeDescriptor>) -> CodecResult<()> {
        self.target.set(target).map_err(|target| {
            CodecError::Schema(format!(
                "Forward reference already resolved (attempted {})",
                target.name()
            ))
        })
    }

    pub fn get(&self) -> Option<&Arc<TypeDescriptor>> {
        self.target.get()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target.get() {
            Some(target) => write!(f, "Deferred({})", target.name()),
            None => write!(f, "Deferred(<unresolved>)"),
        }
    }
}

/// Reference from a member to its type
#[derive(Debug, Clone)]
pub enum TypeRef {
    Direct(Arc<TypeDescriptor>),
    Deferred(Deferred),
}

impl TypeRef {
    /// Target descriptor
    ///
    /// # Errors
    /// `Schema` if a forward reference was never resolved.
    pub fn get(&self) -> CodecResult<&TypeDescriptor> {
        match self {
            TypeRef::Direct(target) => Ok(target),
            TypeRef::Deferred(deferred) => deferred
                .get()
                .map(|target| target.as_ref())
                .ok_or_else(|| CodecError::Schema("Unresolved forward reference".to_string())),
        }
    }
}

impl From<Arc<TypeDescriptor>> for TypeRef {
    fn from(value: Arc<TypeDescriptor>) -> Self {
        TypeRef::Direct(value)
    }
}

impl From<&Arc<TypeDescriptor>> for TypeRef {
    fn from(value: &Arc<TypeDescriptor>) -> Self {
        TypeRef::Direct(Arc::clone(value))
    }
}

impl From<&Deferred> for TypeRef {
    fn from(value: &Deferred) -> Self {
        TypeRef::Deferred(value.clone())
    }
}

/// Member of a SEQUENCE or alternative of a CHOICE
///
/// Without an explicit [`tagged`](Member::tagged) call the member receives an
/// automatic context-specific tag equal to its declaration index.
#[derive(Debug, Clone)]
pub struct Member {
    name: String,
    tag: Option<Tag>,
    descriptor: TypeRef,
    presence: Presence,
}

impl Member {
    /// Mandatory member (or CHOICE alternative)
    pub fn new(name: impl Into<String>, descriptor: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            descriptor: descriptor.into(),
            presence: Presence::Mandatory,
        }
    }

    /// OPTIONAL member
    pub fn optional(name: impl Into<String>, descriptor: impl Into<TypeRef>) -> Self {
        Self::new(name, descriptor).with_presence(Presence::Optional)
    }

    /// Member with a DEFAULT value
    pub fn with_default(name: impl Into<String>, descriptor: impl Into<TypeRef>, default: Value) -> Self {
        Self::new(name, descriptor).with_presence(Presence::Default(default))
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Give the member an explicit tag
    pub fn tagged(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag of the member
    ///
    /// Always set on members of a built descriptor.
    pub fn tag(&self) -> Tag {
        self.tag.unwrap_or(Tag::context(0))
    }

    pub fn descriptor(&self) -> CodecResult<&TypeDescriptor> {
        self.descriptor.get()
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.descriptor
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub(crate) fn assign_automatic_tag(&mut self, index: usize) -> CodecResult<()> {
        if self.tag.is_none() {
            let number = u32::try_from(index)
                .map_err(|_| CodecError::Schema(format!("Too many members to tag ({})", index)))?;
            self.tag = Some(Tag::context(number));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::descriptor::TypeDescriptor;

    #[test]
    fn test_unresolved_deferred() {
        let deferred = Deferred::new();
        let type_ref = TypeRef::from(&deferred);
        assert!(matches!(type_ref.get(), Err(CodecError::Schema(_))));

        deferred.resolve(TypeDescriptor::null("Leaf")).unwrap();
        assert_eq!(type_ref.get().unwrap().name(), "Leaf");
        assert!(deferred.resolve(TypeDescriptor::null("Other")).is_err());
    }

    #[test]
    fn test_presence_bit() {
        assert!(!Presence::Mandatory.has_presence_bit());
        assert!(Presence::Optional.has_presence_bit());
        assert!(Presence::Default(Value::Boolean(true)).has_presence_bit());
    }

    #[test]
    fn test_automatic_tag() {
        let mut member = Member::new("a", TypeDescriptor::null("N"));
        member.assign_automatic_tag(3).unwrap();
        assert_eq!(member.tag(), Tag::context(3));

        let mut tagged = Member::new("b", TypeDescriptor::null("N")).tagged(Tag::explicit(7));
        tagged.assign_automatic_tag(0).unwrap();
        assert_eq!(tagged.tag(), Tag::explicit(7));
    }
}
