// Copyright (c) 2016-2021 Fabian Schuiki

//! The subset of the SystemVerilog type system needed to locate bits within a
//! value.
//!
//! Every type has a flattened, "selectable" representation of
//! `selectable_width()` bits, with bit 0 being the least significant one.
//! Selects into a value are translated into ranges of these bits.

use crate::crate_prelude::*;
use std::fmt::{self, Display, Formatter};

/// A SystemVerilog type.
pub type Type<'t> = &'t TypeKind<'t>;

#[derive(Debug, PartialEq, Eq, Hash)]
pub enum TypeKind<'t> {
    /// A class handle. Has no selectable bits.
    Class(Name),
    /// A simple bit vector type, such as `logic [7:0]` or `bit`.
    BitVector { domain: Domain, range: Range },
    /// A packed or unpacked array of some element type.
    Array {
        packed: bool,
        range: Range,
        elem: Type<'t>,
    },
    /// A packed or unpacked struct.
    Struct {
        packed: bool,
        members: Vec<StructMember<'t>>,
    },
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StructMember<'t> {
    pub name: Name,
    pub ty: Type<'t>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// `bit`, `int`
    TwoValued,
    /// `logic`, `integer`
    FourValued,
}

/// A declared dimension `[left:right]`. Either side may be the larger one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub left: isize,
    pub right: isize,
}

impl Range {
    pub fn new(left: isize, right: isize) -> Range {
        Range { left, right }
    }

    pub fn len(&self) -> usize {
        self.left.abs_diff(self.right).saturating_add(1)
    }

    /// Map a declared index to its position counted from the right-hand
    /// (least significant) end, or `None` if the index lies outside.
    pub fn translate(&self, index: isize) -> Option<usize> {
        let (lo, hi) = if self.left >= self.right {
            (self.right, self.left)
        } else {
            (self.left, self.right)
        };
        if index < lo || index > hi {
            return None;
        }
        Some(index.abs_diff(self.right))
    }
}

impl<'t> TypeKind<'t> {
    /// `logic [left:right]`
    pub fn logic(left: isize, right: isize) -> TypeKind<'t> {
        TypeKind::BitVector {
            domain: Domain::FourValued,
            range: Range::new(left, right),
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(*self, TypeKind::Class(..))
    }

    /// The number of bits in the flattened representation of this type.
    pub fn selectable_width(&self) -> u64 {
        match *self {
            TypeKind::Class(..) => 0,
            TypeKind::BitVector { range, .. } => range.len() as u64,
            TypeKind::Array { range, elem, .. } => range.len() as u64 * elem.selectable_width(),
            TypeKind::Struct { ref members, .. } => {
                members.iter().map(|m| m.ty.selectable_width()).sum()
            }
        }
    }

    /// The outermost dimension of a vector or array.
    pub fn select_range(&self) -> Option<Range> {
        match *self {
            TypeKind::BitVector { range, .. } | TypeKind::Array { range, .. } => Some(range),
            _ => None,
        }
    }

    /// The type and width of one element of a vector or array.
    pub fn element(&self) -> Option<(Type<'t>, u64)> {
        match *self {
            TypeKind::BitVector {
                domain: Domain::TwoValued,
                ..
            } => Some((&BIT_TYPE, 1)),
            TypeKind::BitVector { .. } => Some((&LOGIC_TYPE, 1)),
            TypeKind::Array { elem, .. } => Some((elem, elem.selectable_width())),
            _ => None,
        }
    }

    /// Find a struct member by name. Returns the member type and the offset of
    /// its least significant bit. The first member occupies the most
    /// significant bits.
    pub fn find_member(&self, name: Name) -> Option<(Type<'t>, u64)> {
        let members = match *self {
            TypeKind::Struct { ref members, .. } => members,
            _ => return None,
        };
        let index = members.iter().position(|m| m.name == name)?;
        let offset: u64 = members[index + 1..]
            .iter()
            .map(|m| m.ty.selectable_width())
            .sum();
        Some((members[index].ty, offset))
    }
}

impl<'t> Display for TypeKind<'t> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            TypeKind::Class(name) => write!(f, "{}", name),
            TypeKind::BitVector { domain, range } => {
                f.write_str(match domain {
                    Domain::TwoValued => "bit",
                    Domain::FourValued => "logic",
                })?;
                if range != Range::new(0, 0) {
                    write!(f, " {}", range)?;
                }
                Ok(())
            }
            TypeKind::Array {
                packed,
                range,
                elem,
            } => {
                let sep = if packed { " " } else { " $" };
                write!(f, "{}{}{}", elem, sep, range)
            }
            TypeKind::Struct { packed, ref members } => {
                f.write_str(if packed { "struct packed {" } else { "struct {" })?;
                for m in members {
                    write!(f, " {} {};", m.ty, m.name)?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}:{}]", self.left, self.right)
    }
}

pub static BIT_TYPE: TypeKind<'static> = TypeKind::BitVector {
    domain: Domain::TwoValued,
    range: Range { left: 0, right: 0 },
};

pub static LOGIC_TYPE: TypeKind<'static> = TypeKind::BitVector {
    domain: Domain::FourValued,
    range: Range { left: 0, right: 0 },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_translation() {
        let down = Range::new(7, 0);
        assert_eq!(down.translate(0), Some(0));
        assert_eq!(down.translate(7), Some(7));
        assert_eq!(down.translate(8), None);

        let up = Range::new(0, 7);
        assert_eq!(up.translate(0), Some(7));
        assert_eq!(up.translate(7), Some(0));
        assert_eq!(up.translate(-1), None);

        let offset = Range::new(39, -2);
        assert_eq!(offset.len(), 42);
        assert_eq!(offset.translate(-2), Some(0));
        assert_eq!(offset.translate(39), Some(41));

        let huge = Range::new(isize::MAX, isize::MIN);
        assert_eq!(huge.len(), usize::MAX);
        assert_eq!(huge.translate(isize::MAX), Some(usize::MAX));
    }

    #[test]
    fn widths() {
        let byte = TypeKind::logic(7, 0);
        let arr = TypeKind::Array {
            packed: false,
            range: Range::new(0, 3),
            elem: &byte,
        };
        assert_eq!(byte.selectable_width(), 8);
        assert_eq!(arr.selectable_width(), 32);
        assert_eq!(format!("{}", arr), "logic [7:0] $[0:3]");
        assert_eq!(TypeKind::Class("C".into()).selectable_width(), 0);
    }

    #[test]
    fn struct_members() {
        let byte = TypeKind::logic(7, 0);
        let s = TypeKind::Struct {
            packed: true,
            members: vec![
                StructMember {
                    name: "hi".into(),
                    ty: &byte,
                },
                StructMember {
                    name: "lo".into(),
                    ty: &LOGIC_TYPE,
                },
            ],
        };
        assert_eq!(s.selectable_width(), 9);
        assert_eq!(s.find_member("lo".into()), Some((&LOGIC_TYPE, 0)));
        assert_eq!(s.find_member("hi".into()).map(|m| m.1), Some(1));
        assert_eq!(s.find_member("nope".into()), None);
        assert_eq!(format!("{}", s), "struct packed { logic [7:0] hi; logic lo; }");
    }
}
