// Copyright (c) 2016-2021 Fabian Schuiki

//! The elaborated design as seen by the driver analysis.
//!
//! A [`Design`] is a table of symbols addressed by [`SymbolId`]. It is built
//! by the elaboration front end through `&mut` access, and then shared
//! immutably between all analysis workers. Symbols refer to each other by id,
//! which allows the front end to fill in links such as interface port
//! connections after the symbols involved have been created.

use crate::crate_prelude::*;
use crate::{expr::Expr, ty::Type};
use std::collections::HashMap;
use std::ops::Index;

/// A unique identifier of a symbol in a design.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SymbolId(pub u32);

/// A symbol in the elaborated design.
#[derive(Debug)]
pub struct Symbol<'a> {
    /// The id of this symbol.
    pub id: SymbolId,
    /// The name of the symbol. Empty for elements of instance and generate
    /// block arrays.
    pub name: Name,
    /// The location of the symbol's name in the source text.
    pub span: Span,
    /// The scope this symbol is declared in.
    pub parent: Option<SymbolId>,
    /// What the symbol represents.
    pub kind: SymbolKind<'a>,
    /// The named members, if the symbol is a scope.
    members: HashMap<Name, SymbolId>,
}

/// The different kinds of symbols.
#[derive(Debug)]
pub enum SymbolKind<'a> {
    /// The root of the design hierarchy.
    Root,
    /// A net, such as `wire` or `uwire`.
    Net(NetSymbol<'a>),
    /// A variable.
    Variable(VariableSymbol<'a>),
    /// A property of a class.
    ClassProperty(VariableSymbol<'a>),
    /// A field of a struct or union.
    Field(VariableSymbol<'a>),
    /// A local variable of a sequence or property.
    LocalAssertionVar(VariableSymbol<'a>),
    /// A port listed in a modport.
    ModportPort(ModportPortSymbol<'a>),
    /// A module or interface port.
    Port(PortSymbol<'a>),
    /// A port that connects to multiple internal signals.
    MultiPort(ArgumentDirection),
    /// An interface port.
    InterfacePort(InterfacePortSymbol<'a>),
    /// A clocking block signal.
    ClockVar(ClockVarSymbol<'a>),
    /// An instance of a module, interface, or program.
    Instance(InstanceSymbol),
    /// The body of an instance, containing all its members.
    InstanceBody(InstanceBodySymbol),
    /// An array of instances. The elements are the children of the array.
    InstanceArray(Vec<SymbolId>),
    /// A generate block.
    GenerateBlock,
    /// An array of generate blocks created by a loop generate construct.
    GenerateBlockArray { valid: bool, entries: Vec<SymbolId> },
    /// A modport of an interface.
    Modport,
    /// An `initial`, `always`, `always_comb`, etc. procedure.
    ProceduralBlock(ProceduralBlockKind),
    /// A task or function.
    Subroutine,
}

/// The connection of a port in an instantiation, e.g. the `.a(x)` in
/// `foo u0 (.a(x));`.
#[derive(Debug, Clone, Copy)]
pub struct PortConnection<'a> {
    /// The port of the instantiated body.
    pub port: SymbolId,
    /// The connected expression, if the port is not left open.
    pub expr: Option<&'a Expr<'a>>,
}

/// A net declaration.
#[derive(Debug)]
pub struct NetSymbol<'a> {
    pub ty: Type<'a>,
    pub net_type: NetType,
    pub initializer: Option<&'a Expr<'a>>,
}

/// The net type of a net, such as `wire`, `uwire`, or a user-defined net type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetType {
    pub name: Name,
    pub kind: NetKind,
    /// Whether a user-defined net type has a resolution function.
    pub has_resolution_fn: bool,
}

/// The kind of a net type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetKind {
    /// Any of the builtin multi-driver net types, such as `wire` or `tri`.
    Normal,
    /// The `uwire` net type.
    UWire,
    /// A user-defined net type.
    UserDefined,
}

impl NetType {
    /// The `wire` net type.
    pub fn wire() -> NetType {
        NetType {
            name: "wire".into(),
            kind: NetKind::Normal,
            has_resolution_fn: false,
        }
    }

    /// The `uwire` net type.
    pub fn uwire() -> NetType {
        NetType {
            name: "uwire".into(),
            kind: NetKind::UWire,
            has_resolution_fn: false,
        }
    }

    /// A user-defined net type.
    pub fn user_defined(name: &str, has_resolution_fn: bool) -> NetType {
        NetType {
            name: name.into(),
            kind: NetKind::UserDefined,
            has_resolution_fn,
        }
    }
}

/// A variable-like declaration.
#[derive(Debug)]
pub struct VariableSymbol<'a> {
    pub ty: Type<'a>,
    pub lifetime: Lifetime,
    pub initializer: Option<&'a Expr<'a>>,
}

/// The lifetime of a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    Static,
    Automatic,
}

/// A port listed in a modport, e.g. the `a` in `modport m (output a)`.
#[derive(Debug)]
pub struct ModportPortSymbol<'a> {
    pub ty: Type<'a>,
    pub direction: ArgumentDirection,
    /// The expression within the interface that the port refers to.
    pub connection: Option<&'a Expr<'a>>,
}

/// A module or interface port.
#[derive(Debug)]
pub struct PortSymbol<'a> {
    pub direction: ArgumentDirection,
    /// The explicit internal expression of the port, e.g. `.a(x[3:0])`.
    pub internal_expr: Option<&'a Expr<'a>>,
    /// The internal net or variable that the port connects to.
    pub internal_symbol: Option<SymbolId>,
}

/// An interface port.
#[derive(Debug, Default)]
pub struct InterfacePortSymbol<'a> {
    /// The instance, instance array, or interface port that is connected.
    pub connection: Option<SymbolId>,
    /// The modport selected by the connection, if any.
    pub modport: Option<SymbolId>,
    /// The expression used in the port connection.
    pub connection_expr: Option<&'a Expr<'a>>,
}

/// A clocking block signal.
#[derive(Debug)]
pub struct ClockVarSymbol<'a> {
    pub ty: Type<'a>,
    pub direction: ArgumentDirection,
    /// The signal the clock var refers to.
    pub initializer: Option<&'a Expr<'a>>,
}

/// An instance of a module, interface, or program.
#[derive(Debug)]
pub struct InstanceSymbol {
    /// The body of this instance.
    pub body: SymbolId,
    /// The canonical body this instance shares, if the instance is not itself
    /// canonical.
    pub canonical_body: Option<SymbolId>,
}

/// The body of an instance.
#[derive(Debug)]
pub struct InstanceBodySymbol {
    pub definition: DefinitionKind,
    /// The ports of the body, in declaration order.
    pub ports: Vec<SymbolId>,
}

/// The kind of design element an instance body was created from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefinitionKind {
    Module,
    Interface,
    Program,
}

/// The direction of a port or argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentDirection {
    In,
    Out,
    InOut,
    Ref,
}

/// The kind of a procedural block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProceduralBlockKind {
    Initial,
    Final,
    Always,
    AlwaysComb,
    AlwaysLatch,
    AlwaysFF,
}

impl ProceduralBlockKind {
    /// The keyword that introduces this kind of procedure.
    pub fn as_str(self) -> &'static str {
        match self {
            ProceduralBlockKind::Initial => "initial",
            ProceduralBlockKind::Final => "final",
            ProceduralBlockKind::Always => "always",
            ProceduralBlockKind::AlwaysComb => "always_comb",
            ProceduralBlockKind::AlwaysLatch => "always_latch",
            ProceduralBlockKind::AlwaysFF => "always_ff",
        }
    }
}

impl std::fmt::Display for ProceduralBlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'a> SymbolKind<'a> {
    /// Get the variable details, if this is a variable of some sort.
    pub fn as_variable(&self) -> Option<&VariableSymbol<'a>> {
        match *self {
            SymbolKind::Variable(ref v)
            | SymbolKind::ClassProperty(ref v)
            | SymbolKind::Field(ref v)
            | SymbolKind::LocalAssertionVar(ref v) => Some(v),
            _ => None,
        }
    }

    /// Get the declared type of a value symbol.
    pub fn value_type(&self) -> Option<Type<'a>> {
        match *self {
            SymbolKind::Net(ref n) => Some(n.ty),
            SymbolKind::ModportPort(ref p) => Some(p.ty),
            SymbolKind::ClockVar(ref c) => Some(c.ty),
            _ => self.as_variable().map(|v| v.ty),
        }
    }

    /// Get the initializer expression of a net or variable.
    pub fn initializer(&self) -> Option<&'a Expr<'a>> {
        match *self {
            SymbolKind::Net(ref n) => n.initializer,
            _ => self.as_variable().and_then(|v| v.initializer),
        }
    }

    /// Check whether this symbol opens a new scope with named members.
    pub fn is_scope(&self) -> bool {
        match *self {
            SymbolKind::Root
            | SymbolKind::InstanceBody(..)
            | SymbolKind::GenerateBlock
            | SymbolKind::GenerateBlockArray { .. }
            | SymbolKind::Modport
            | SymbolKind::ProceduralBlock(..)
            | SymbolKind::Subroutine => true,
            _ => false,
        }
    }

    /// Check whether a symbol of this kind may be listed in a modport.
    pub fn is_allowed_in_modport(&self) -> bool {
        match *self {
            SymbolKind::Net(..)
            | SymbolKind::Variable(..)
            | SymbolKind::ClockVar(..)
            | SymbolKind::Subroutine => true,
            _ => false,
        }
    }
}

impl HasSpan for Symbol<'_> {
    fn span(&self) -> Span {
        self.span
    }

    fn human_span(&self) -> Span {
        let begin = self.span.begin;
        Span::new(self.span.source, begin, begin + self.name.as_str().len())
    }
}

impl HasDesc for Symbol<'_> {
    fn desc(&self) -> &'static str {
        match self.kind {
            SymbolKind::Root => "root",
            SymbolKind::Net(..) => "net",
            SymbolKind::Variable(..) => "variable",
            SymbolKind::ClassProperty(..) => "class property",
            SymbolKind::Field(..) => "field",
            SymbolKind::LocalAssertionVar(..) => "local variable",
            SymbolKind::ModportPort(..) => "modport port",
            SymbolKind::Port(..) | SymbolKind::MultiPort(..) => "port",
            SymbolKind::InterfacePort(..) => "interface port",
            SymbolKind::ClockVar(..) => "clock var",
            SymbolKind::Instance(..) => "instance",
            SymbolKind::InstanceBody(..) => "instance body",
            SymbolKind::InstanceArray(..) => "instance array",
            SymbolKind::GenerateBlock => "generate block",
            SymbolKind::GenerateBlockArray { .. } => "generate block array",
            SymbolKind::Modport => "modport",
            SymbolKind::ProceduralBlock(..) => "procedure",
            SymbolKind::Subroutine => "subroutine",
        }
    }

    fn desc_full(&self) -> String {
        if self.name.is_empty() {
            self.desc().into()
        } else {
            format!("{} `{}`", self.desc(), self.name)
        }
    }
}

/// An elaborated design.
#[derive(Debug)]
pub struct Design<'a> {
    symbols: Vec<Symbol<'a>>,
}

impl<'a> Design<'a> {
    /// Create a new design containing only the root symbol.
    pub fn new() -> Self {
        Design {
            symbols: vec![Symbol {
                id: SymbolId(0),
                name: "$root".into(),
                span: INVALID_SPAN,
                parent: None,
                kind: SymbolKind::Root,
                members: HashMap::new(),
            }],
        }
    }

    /// The root of the design hierarchy.
    pub fn root(&self) -> SymbolId {
        SymbolId(0)
    }

    /// Access a symbol.
    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.symbols[id.0 as usize]
    }

    /// Add a symbol to the design.
    ///
    /// Named symbols are registered as members of `parent` if it is a scope.
    /// Ports are additionally registered with their instance body, and unnamed
    /// children of instance and generate block arrays become elements of the
    /// array.
    pub fn add(
        &mut self,
        parent: SymbolId,
        name: &str,
        span: Span,
        kind: SymbolKind<'a>,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let name = Name::from(name);
        let is_port = match kind {
            SymbolKind::Port(..) | SymbolKind::MultiPort(..) | SymbolKind::InterfacePort(..) => {
                true
            }
            _ => false,
        };
        self.symbols.push(Symbol {
            id,
            name,
            span,
            parent: Some(parent),
            kind,
            members: HashMap::new(),
        });

        let parent_sym = &mut self.symbols[parent.0 as usize];
        match parent_sym.kind {
            SymbolKind::InstanceArray(ref mut elems) => elems.push(id),
            SymbolKind::GenerateBlockArray {
                ref mut entries, ..
            } => entries.push(id),
            SymbolKind::InstanceBody(ref mut body) if is_port => body.ports.push(id),
            _ => (),
        }
        if parent_sym.kind.is_scope() && !name.is_empty() {
            parent_sym.members.insert(name, id);
        }
        id
    }

    /// Add an instance together with its body.
    ///
    /// Returns the ids of the instance and the body.
    pub fn add_instance(
        &mut self,
        parent: SymbolId,
        name: &str,
        span: Span,
        definition: DefinitionKind,
    ) -> (SymbolId, SymbolId) {
        let inst = self.add(
            parent,
            name,
            span,
            SymbolKind::Instance(InstanceSymbol {
                body: SymbolId(u32::MAX),
                canonical_body: None,
            }),
        );
        let body = self.add(
            inst,
            "",
            span,
            SymbolKind::InstanceBody(InstanceBodySymbol {
                definition,
                ports: vec![],
            }),
        );
        match self.symbols[inst.0 as usize].kind {
            SymbolKind::Instance(ref mut i) => i.body = body,
            _ => unreachable!(),
        }
        (inst, body)
    }

    /// Mark an instance as sharing the body of another, canonical instance.
    pub fn set_canonical_body(&mut self, instance: SymbolId, canonical_body: SymbolId) {
        match self.symbols[instance.0 as usize].kind {
            SymbolKind::Instance(ref mut i) => i.canonical_body = Some(canonical_body),
            ref other => panic!("cannot set canonical body of {:?}", other),
        }
    }

    /// Connect an interface port to an instance (or another interface port),
    /// optionally through a modport.
    pub fn connect_interface_port(
        &mut self,
        port: SymbolId,
        connection: SymbolId,
        modport: Option<SymbolId>,
        expr: Option<&'a Expr<'a>>,
    ) {
        match self.symbols[port.0 as usize].kind {
            SymbolKind::InterfacePort(ref mut p) => {
                p.connection = Some(connection);
                p.modport = modport;
                p.connection_expr = expr;
            }
            ref other => panic!("cannot connect {:?} as an interface port", other),
        }
    }

    /// Set the connection expression of a modport port.
    pub fn connect_modport_port(&mut self, port: SymbolId, expr: &'a Expr<'a>) {
        match self.symbols[port.0 as usize].kind {
            SymbolKind::ModportPort(ref mut p) => p.connection = Some(expr),
            ref other => panic!("cannot connect {:?} as a modport port", other),
        }
    }

    /// Find a named member in a scope.
    pub fn find_member(&self, scope: SymbolId, name: Name) -> Option<SymbolId> {
        self.symbol(scope).members.get(&name).cloned()
    }

    /// Find a port of an instance body by name.
    pub fn find_port(&self, body: SymbolId, name: Name) -> Option<SymbolId> {
        match self.symbol(body).kind {
            SymbolKind::InstanceBody(ref b) => b
                .ports
                .iter()
                .cloned()
                .find(|&p| self.symbol(p).name == name),
            _ => None,
        }
    }

    /// Get the scope a symbol is declared in.
    pub fn parent_scope(&self, id: SymbolId) -> Option<SymbolId> {
        self.symbol(id).parent
    }

    /// Get the canonical body shared by an instance.
    pub fn canonical_body(&self, instance: SymbolId) -> Option<SymbolId> {
        match self.symbol(instance).kind {
            SymbolKind::Instance(ref i) => i.canonical_body,
            _ => None,
        }
    }

    /// Get the kind of design element an instance body was created from.
    pub fn definition_kind(&self, body: SymbolId) -> Option<DefinitionKind> {
        match self.symbol(body).kind {
            SymbolKind::InstanceBody(ref b) => Some(b.definition),
            _ => None,
        }
    }

    /// Compute the full hierarchical path of a symbol, e.g. `top.bus.data`.
    pub fn hierarchical_path(&self, id: SymbolId) -> String {
        let mut parts = vec![];
        let mut next = Some(id);
        while let Some(id) = next {
            let sym = self.symbol(id);
            next = sym.parent;
            match sym.kind {
                SymbolKind::Root | SymbolKind::InstanceBody(..) => continue,
                _ => (),
            }
            let parent_kind = sym.parent.map(|p| &self.symbol(p).kind);
            match parent_kind {
                Some(SymbolKind::InstanceArray(elems))
                | Some(SymbolKind::GenerateBlockArray { entries: elems, .. })
                    if sym.name.is_empty() =>
                {
                    let index = elems.iter().position(|&e| e == id).unwrap_or(0);
                    parts.push(format!("[{}]", index));
                }
                _ => parts.push(format!(".{}", sym.name)),
            }
        }
        parts.reverse();
        let path: String = parts.concat();
        path.trim_start_matches('.').to_string()
    }
}

impl<'a> Default for Design<'a> {
    fn default() -> Self {
        Design::new()
    }
}

impl<'a> Index<SymbolId> for Design<'a> {
    type Output = Symbol<'a>;

    fn index(&self, id: SymbolId) -> &Symbol<'a> {
        self.symbol(id)
    }
}
