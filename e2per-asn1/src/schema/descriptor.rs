//! Type descriptors: the schema nodes the codec engine is driven by
//!
//! # Usage Example
//!
//! ```rust
//! use e2per_asn1::per::Constraint;
//! use e2per_asn1::schema::{Member, TypeDescriptor};
//!
//! // GlobalgNB-ID ::= SEQUENCE { plmn-id PLMN-Identity, gnb-id INTEGER (0..4294967295), ... }
//! let plmn = TypeDescriptor::octet_string("PLMN-Identity", Some(Constraint::fixed(3)))?;
//! let gnb_id = TypeDescriptor::integer("GNB-ID", Constraint::range(0, 4_294_967_295))?;
//! let global = TypeDescriptor::sequence("GlobalgNB-ID")
//!     .member(Member::new("plmn-id", &plmn))
//!     .member(Member::new("gnb-id", &gnb_id))
//!     .extensible()
//!     .build()?;
//! assert!(global.is_extensible());
//! # Ok::<(), e2per_core::CodecError>(())
//! ```

use crate::ber::Tag;
use crate::per::Constraint;
use crate::schema::member::{Member, Presence, TypeRef};
use e2per_core::{CodecError, CodecResult, SequenceValue, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Items of an ENUMERATED type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    root: Vec<String>,
    additions: Vec<String>,
    extensible: bool,
}

impl Enumeration {
    /// Root items in index order
    pub fn new<I, S>(root: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into_iter().map(Into::into).collect(),
            additions: Vec::new(),
            extensible: false,
        }
    }

    /// Add the extension marker
    pub fn extensible(mut self) -> Self {
        self.extensible = true;
        self
    }

    /// Extension items known to this schema; implies the extension marker
    pub fn with_additions<I, S>(mut self, additions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additions = additions.into_iter().map(Into::into).collect();
        self.extensible = true;
        self
    }

    pub fn root_len(&self) -> usize {
        self.root.len()
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Name of the item at `index` (root items first, then additions)
    pub fn name_of(&self, index: u32) -> Option<&str> {
        let index = index as usize;
        self.root
            .get(index)
            .or_else(|| self.additions.get(index.checked_sub(self.root.len())?))
            .map(String::as_str)
    }

    /// Index of the item called `name`
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.root
            .iter()
            .chain(self.additions.iter())
            .position(|item| item == name)
            .and_then(|i| u32::try_from(i).ok())
    }
}

/// Kinds of simple types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveKind {
    Null,
    Boolean,
    Integer,
    Enumerated(Enumeration),
    BitString,
    OctetString,
    PrintableString,
}

/// Closed set of descriptor kinds the codec engine dispatches on
#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Sequence,
    /// SEQUENCE OF the referenced item type
    SequenceOf(TypeRef),
    Choice,
}

impl TypeKind {
    /// ASN.1 name of the kind, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Primitive(PrimitiveKind::Null) => "NULL",
            TypeKind::Primitive(PrimitiveKind::Boolean) => "BOOLEAN",
            TypeKind::Primitive(PrimitiveKind::Integer) => "INTEGER",
            TypeKind::Primitive(PrimitiveKind::Enumerated(_)) => "ENUMERATED",
            TypeKind::Primitive(PrimitiveKind::BitString) => "BIT STRING",
            TypeKind::Primitive(PrimitiveKind::OctetString) => "OCTET STRING",
            TypeKind::Primitive(PrimitiveKind::PrintableString) => "PrintableString",
            TypeKind::Sequence => "SEQUENCE",
            TypeKind::SequenceOf(_) => "SEQUENCE OF",
            TypeKind::Choice => "CHOICE",
        }
    }

    fn accepts_constraint(&self) -> bool {
        matches!(
            self,
            TypeKind::Primitive(
                PrimitiveKind::Integer
                    | PrimitiveKind::BitString
                    | PrimitiveKind::OctetString
                    | PrimitiveKind::PrintableString
            ) | TypeKind::SequenceOf(_)
        )
    }

    fn has_members(&self) -> bool {
        matches!(self, TypeKind::Sequence | TypeKind::Choice)
    }
}

/// Immutable schema node
///
/// Built once through [`DescriptorBuilder`] (which validates it) and shared
/// behind an `Arc` by any number of concurrent encode/decode calls.
#[derive(Debug)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    members: Vec<Member>,
    constraint: Option<Constraint>,
    extension_point: Option<usize>,
    /// Declaration indices of the root CHOICE alternatives in canonical tag order
    choice_order: Vec<usize>,
    /// Member tags in canonical order, with declaration indices
    tag_table: Vec<(Tag, usize)>,
}

impl TypeDescriptor {
    /// Start building a descriptor of any kind
    pub fn builder(name: impl Into<String>, kind: TypeKind) -> DescriptorBuilder {
        DescriptorBuilder {
            name: name.into(),
            kind,
            members: Vec::new(),
            constraint: None,
            extension_point: None,
        }
    }

    pub fn sequence(name: impl Into<String>) -> DescriptorBuilder {
        Self::builder(name, TypeKind::Sequence)
    }

    pub fn choice(name: impl Into<String>) -> DescriptorBuilder {
        Self::builder(name, TypeKind::Choice)
    }

    pub fn null(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::simple(name.into(), PrimitiveKind::Null))
    }

    pub fn boolean(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::simple(name.into(), PrimitiveKind::Boolean))
    }

    pub fn integer(name: impl Into<String>, constraint: Constraint) -> CodecResult<Arc<Self>> {
        Self::builder(name, TypeKind::Primitive(PrimitiveKind::Integer))
            .constraint(constraint)
            .build()
    }

    pub fn enumerated(name: impl Into<String>, items: Enumeration) -> CodecResult<Arc<Self>> {
        Self::builder(name, TypeKind::Primitive(PrimitiveKind::Enumerated(items))).build()
    }

    pub fn bit_string(name: impl Into<String>, size: Option<Constraint>) -> CodecResult<Arc<Self>> {
        Self::sized(name.into(), TypeKind::Primitive(PrimitiveKind::BitString), size)
    }

    pub fn octet_string(name: impl Into<String>, size: Option<Constraint>) -> CodecResult<Arc<Self>> {
        Self::sized(name.into(), TypeKind::Primitive(PrimitiveKind::OctetString), size)
    }

    pub fn printable_string(name: impl Into<String>, size: Option<Constraint>) -> CodecResult<Arc<Self>> {
        Self::sized(name.into(), TypeKind::Primitive(PrimitiveKind::PrintableString), size)
    }

    pub fn sequence_of(
        name: impl Into<String>,
        item: impl Into<TypeRef>,
        size: Option<Constraint>,
    ) -> CodecResult<Arc<Self>> {
        Self::sized(name.into(), TypeKind::SequenceOf(item.into()), size)
    }

    fn simple(name: String, kind: PrimitiveKind) -> Self {
        Self {
            name,
            kind: TypeKind::Primitive(kind),
            members: Vec::new(),
            constraint: None,
            extension_point: None,
            choice_order: Vec::new(),
            tag_table: Vec::new(),
        }
    }

    fn sized(name: String, kind: TypeKind, size: Option<Constraint>) -> CodecResult<Arc<Self>> {
        let mut builder = Self::builder(name, kind);
        builder.constraint = size;
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    /// Declaration index of the member called `name`
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name() == name)
    }

    /// Value or size constraint; absent means unconstrained
    pub fn constraint(&self) -> Constraint {
        self.constraint.unwrap_or_default()
    }

    /// Index of the first extension addition (`members().len()` when there are none yet)
    pub fn extension_point(&self) -> Option<usize> {
        self.extension_point
    }

    /// Check if values of this type carry an extension bit
    pub fn is_extensible(&self) -> bool {
        match &self.kind {
            TypeKind::Sequence | TypeKind::Choice => self.extension_point.is_some(),
            TypeKind::Primitive(PrimitiveKind::Enumerated(items)) => items.is_extensible(),
            _ => self.constraint.is_some_and(|c| c.is_extensible()),
        }
    }

    /// Members before the extension marker
    pub fn root_members(&self) -> &[Member] {
        &self.members[..self.root_len()]
    }

    /// Extension additions (members at or after the extension point)
    pub fn additions(&self) -> &[Member] {
        &self.members[self.root_len()..]
    }

    pub(crate) fn root_len(&self) -> usize {
        self.extension_point.unwrap_or(self.members.len())
    }

    /// Root CHOICE alternatives (declaration indices) in canonical tag order
    pub fn choice_root_order(&self) -> &[usize] {
        &self.choice_order
    }

    /// Position of the root alternative `present` in canonical tag order
    pub fn choice_index_of(&self, present: usize) -> Option<usize> {
        self.choice_order.iter().position(|&i| i == present)
    }

    /// Resolve a tag to the member carrying it
    pub fn member_by_tag(&self, tag: &Tag) -> Option<(usize, &Member)> {
        let slot = self
            .tag_table
            .binary_search_by(|(probe, _)| probe.canonical_cmp(tag))
            .ok()?;
        let index = self.tag_table[slot].1;
        Some((index, &self.members[index]))
    }

    /// Value of a SEQUENCE member, falling back to its DEFAULT
    ///
    /// Decoding leaves absent DEFAULT members unset; this resolves them.
    pub fn field_or_default<'a>(&'a self, value: &'a SequenceValue, name: &str) -> Option<&'a Value> {
        value.get(name).or_else(|| {
            let member = &self.members[self.member_index(name)?];
            match member.presence() {
                Presence::Default(default) => Some(default),
                _ => None,
            }
        })
    }
}

/// Validating builder for [`TypeDescriptor`]
#[derive(Debug)]
pub struct DescriptorBuilder {
    name: String,
    kind: TypeKind,
    members: Vec<Member>,
    constraint: Option<Constraint>,
    extension_point: Option<usize>,
}

impl DescriptorBuilder {
    /// Append a member (SEQUENCE) or alternative (CHOICE)
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Place the extension marker `...` after the members added so far
    pub fn extensible(mut self) -> Self {
        self.extension_point = Some(self.members.len());
        self
    }

    /// Place the extension marker before the member at `index`
    pub fn extension_point(mut self, index: usize) -> Self {
        self.extension_point = Some(index);
        self
    }

    /// Validate and freeze the descriptor
    ///
    /// # Errors
    /// `Schema` for duplicate member names or sibling tags, malformed
    /// constraints, an extension point past the member list, a CHOICE without
    /// root alternatives or with non-mandatory alternatives, and an empty
    /// ENUMERATED root.
    pub fn build(mut self) -> CodecResult<Arc<TypeDescriptor>> {
        let name = self.name;

        if let Some(constraint) = &self.constraint {
            if !self.kind.accepts_constraint() {
                return Err(CodecError::Schema(format!(
                    "{}: {} does not take a constraint",
                    name,
                    self.kind.name()
                )));
            }
            constraint.validate()?;
            let is_size = !matches!(self.kind, TypeKind::Primitive(PrimitiveKind::Integer));
            if is_size && constraint.lower().is_some_and(|lower| lower < 0) {
                return Err(CodecError::Schema(format!(
                    "{}: negative lower bound in size constraint {}",
                    name, constraint
                )));
            }
        }

        if let TypeKind::Primitive(PrimitiveKind::Enumerated(items)) = &self.kind {
            if items.root_len() == 0 {
                return Err(CodecError::Schema(format!("{}: ENUMERATED without root items", name)));
            }
        }

        if !self.kind.has_members() && (!self.members.is_empty() || self.extension_point.is_some()) {
            return Err(CodecError::Schema(format!(
                "{}: {} cannot have members",
                name,
                self.kind.name()
            )));
        }

        let root_len = self.extension_point.unwrap_or(self.members.len());
        if root_len > self.members.len() {
            return Err(CodecError::Schema(format!(
                "{}: extension point {} beyond {} members",
                name,
                root_len,
                self.members.len()
            )));
        }

        let mut names = HashSet::new();
        for (index, member) in self.members.iter_mut().enumerate() {
            if !names.insert(member.name().to_string()) {
                return Err(CodecError::Schema(format!(
                    "{}: duplicate member name '{}'",
                    name,
                    member.name()
                )));
            }
            member.assign_automatic_tag(index)?;
        }

        let mut tag_table: Vec<(Tag, usize)> =
            self.members.iter().enumerate().map(|(i, m)| (m.tag(), i)).collect();
        tag_table.sort_by(|(a, _), (b, _)| a.canonical_cmp(b));
        if let Some(pair) = tag_table.windows(2).find(|pair| pair[0].0.same_identity(&pair[1].0)) {
            return Err(CodecError::Schema(format!(
                "{}: members '{}' and '{}' share tag {}",
                name,
                self.members[pair[0].1].name(),
                self.members[pair[1].1].name(),
                pair[0].0
            )));
        }

        let mut choice_order = Vec::new();
        if matches!(self.kind, TypeKind::Choice) {
            if root_len == 0 {
                return Err(CodecError::Schema(format!("{}: CHOICE without root alternatives", name)));
            }
            if let Some(member) = self.members.iter().find(|m| m.presence() != &Presence::Mandatory) {
                return Err(CodecError::Schema(format!(
                    "{}: CHOICE alternative '{}' cannot be OPTIONAL or DEFAULT",
                    name,
                    member.name()
                )));
            }
            choice_order = (0..root_len).collect();
            choice_order.sort_by(|&a, &b| self.members[a].tag().canonical_cmp(&self.members[b].tag()));
        }

        Ok(Arc::new(TypeDescriptor {
            name,
            kind: self.kind,
            members: self.members,
            constraint: self.constraint,
            extension_point: self.extension_point,
            choice_order,
            tag_table,
        }))
    }
}
