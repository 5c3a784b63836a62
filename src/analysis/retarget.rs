// Copyright (c) 2016-2021 Fabian Schuiki

//! Re-resolution of hierarchical references through interface ports.
//!
//! A hierarchical reference that starts at an interface port is resolved in
//! the context of one particular instance. Other instances that share the same
//! body connect the port to different interface instances, so the same
//! reference reaches a different value in each of them.

use crate::crate_prelude::*;
use crate::design::{DefinitionKind, Design, SymbolId, SymbolKind};
use crate::hier::{HierarchicalReference, Selector};

/// Resolve `r` against `instance` instead of the instance it was originally
/// resolved in.
///
/// Returns `None` if any step of the path cannot be resolved, which only
/// happens if the design already contains errors.
pub fn retarget_iface_port(
    design: &Design,
    r: &HierarchicalReference,
    instance: SymbolId,
) -> Option<SymbolId> {
    if !r.is_via_iface_port() || r.target.is_none() {
        return None;
    }
    let first = r.path.first()?;
    let body = match design[instance].kind {
        SymbolKind::Instance(ref inst) => inst.body,
        _ => return None,
    };
    let mut symbol = design.find_port(body, design[first.symbol].name)?;
    let mut modport: Option<SymbolId> = None;
    let mut array_elems: Option<&[SymbolId]> = None;

    for elem in &r.path[1..] {
        // Follow chains of interface ports to the connected instance.
        while let SymbolKind::InterfacePort(ref port) = design[symbol].kind {
            symbol = port.connection?;
            modport = port.modport;
        }

        if array_elems.is_none() {
            match design[symbol].kind {
                SymbolKind::Instance(ref inst) => {
                    let inst_body = inst.body;
                    if design.definition_kind(inst_body) == Some(DefinitionKind::Module) {
                        return None;
                    }
                    symbol = inst_body;
                    if let Some(modport) = modport.take() {
                        symbol = design.find_member(inst_body, design[modport].name)?;
                    }
                }
                SymbolKind::InstanceArray(ref elems) => array_elems = Some(elems),
                ref kind if !kind.is_scope() => return None,
                _ => (),
            }
        }

        match elem.selector {
            Selector::Index(index) => {
                if index < 0 {
                    return None;
                }
                let index = index as usize;
                if let Some(elems) = array_elems {
                    symbol = *elems.get(index)?;
                } else if let SymbolKind::GenerateBlockArray { valid, ref entries } =
                    design[symbol].kind
                {
                    if !valid {
                        return None;
                    }
                    symbol = *entries.get(index)?;
                } else {
                    return None;
                }
            }
            Selector::Range(left, right) => {
                let elems = array_elems?;
                if left < 0 || right < left || right as usize >= elems.len() {
                    return None;
                }
                array_elems = Some(&elems[left as usize..=right as usize]);
                continue;
            }
            Selector::Name(name) => {
                if array_elems.is_some() || !design[symbol].kind.is_scope() {
                    return None;
                }
                symbol = match design.find_member(symbol, name) {
                    Some(next) => next,
                    None => match design[symbol].kind {
                        // Modports only list a subset of the interface members,
                        // the rest is reachable through the interface itself.
                        SymbolKind::Modport => {
                            let parent = design.parent_scope(symbol)?;
                            let next = design.find_member(parent, name)?;
                            let kind = &design[next].kind;
                            if kind.is_allowed_in_modport() {
                                return None;
                            }
                            if let SymbolKind::Modport = kind {
                                return None;
                            }
                            next
                        }
                        _ => return None,
                    },
                };
            }
        }
        array_elems = None;
    }

    trace!(
        "retargeted `{}` to {} in `{}`",
        r,
        design[symbol].desc_full(),
        design.hierarchical_path(instance)
    );
    Some(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{
        ArgumentDirection, InterfacePortSymbol, Lifetime, ModportPortSymbol, NetSymbol, NetType,
        VariableSymbol,
    };
    use crate::hier::PathElement;
    use crate::ty::LOGIC_TYPE;

    fn net<'a>() -> SymbolKind<'a> {
        SymbolKind::Net(NetSymbol {
            ty: &LOGIC_TYPE,
            net_type: NetType::wire(),
            initializer: None,
        })
    }

    fn name(symbol: SymbolId, name: &str) -> PathElement {
        PathElement {
            symbol,
            selector: Selector::Name(name.into()),
        }
    }

    /// Two interface instances `bus0` and `bus1`, and two instances `u0` and
    /// `u1` of a module with an interface port `p` connected to them.
    struct Bench<'a> {
        design: Design<'a>,
        u0: SymbolId,
        u1: SymbolId,
        port0: SymbolId,
        data0: SymbolId,
        data1: SymbolId,
    }

    fn bench<'a>() -> Bench<'a> {
        let mut d = Design::new();
        let root = d.root();
        let (_, top) = d.add_instance(root, "top", INVALID_SPAN, DefinitionKind::Module);
        let iface = DefinitionKind::Interface;
        let (bus0, bus0_body) = d.add_instance(top, "bus0", INVALID_SPAN, iface);
        let (bus1, bus1_body) = d.add_instance(top, "bus1", INVALID_SPAN, iface);
        let data0 = d.add(bus0_body, "data", INVALID_SPAN, net());
        let data1 = d.add(bus1_body, "data", INVALID_SPAN, net());
        let mut ports = vec![];
        let mut insts = vec![];
        for (i, bus) in [bus0, bus1].iter().enumerate() {
            let name = format!("u{}", i);
            let (u, body) = d.add_instance(top, &name, INVALID_SPAN, DefinitionKind::Module);
            let p = d.add(
                body,
                "p",
                INVALID_SPAN,
                SymbolKind::InterfacePort(InterfacePortSymbol::default()),
            );
            d.connect_interface_port(p, *bus, None, None);
            ports.push(p);
            insts.push(u);
        }
        Bench {
            design: d,
            u0: insts[0],
            u1: insts[1],
            port0: ports[0],
            data0,
            data1,
        }
    }

    #[test]
    fn retarget_to_sibling() {
        let b = bench();
        let r = HierarchicalReference::new(
            &b.design,
            vec![name(b.port0, "p"), name(b.data0, "data")],
            Some(b.data0),
        );
        assert_eq!(retarget_iface_port(&b.design, &r, b.u1), Some(b.data1));
        assert_eq!(retarget_iface_port(&b.design, &r, b.u0), Some(b.data0));
    }

    #[test]
    fn missing_member_aborts() {
        let b = bench();
        let r = HierarchicalReference::new(
            &b.design,
            vec![name(b.port0, "p"), name(b.data0, "nope")],
            Some(b.data0),
        );
        assert_eq!(retarget_iface_port(&b.design, &r, b.u1), None);

        let no_target = HierarchicalReference::new(
            &b.design,
            vec![name(b.port0, "p"), name(b.data0, "data")],
            None,
        );
        assert_eq!(retarget_iface_port(&b.design, &no_target, b.u1), None);
    }

    #[test]
    fn instance_array_slices() {
        let mut d = Design::new();
        let root = d.root();
        let (_, top) = d.add_instance(root, "top", INVALID_SPAN, DefinitionKind::Module);
        let arr = d.add(top, "buses", INVALID_SPAN, SymbolKind::InstanceArray(vec![]));
        let mut datas = vec![];
        for _ in 0..3 {
            let (_, body) = d.add_instance(arr, "", INVALID_SPAN, DefinitionKind::Interface);
            datas.push(d.add(body, "data", INVALID_SPAN, net()));
        }
        let (u, body) = d.add_instance(top, "u", INVALID_SPAN, DefinitionKind::Module);
        let p = d.add(
            body,
            "p",
            INVALID_SPAN,
            SymbolKind::InterfacePort(InterfacePortSymbol::default()),
        );
        d.connect_interface_port(p, arr, None, None);
        let slice = PathElement {
            symbol: arr,
            selector: Selector::Range(1, 2),
        };
        let index = |i| PathElement {
            symbol: arr,
            selector: Selector::Index(i),
        };

        // p[1:2][1].data resolves to the last element.
        let r = HierarchicalReference::new(
            &d,
            vec![name(p, "p"), slice, index(1), name(datas[0], "data")],
            Some(datas[0]),
        );
        assert_eq!(retarget_iface_port(&d, &r, u), Some(datas[2]));

        let r = HierarchicalReference::new(
            &d,
            vec![name(p, "p"), index(0), name(datas[0], "data")],
            Some(datas[0]),
        );
        assert_eq!(retarget_iface_port(&d, &r, u), Some(datas[0]));

        let r = HierarchicalReference::new(
            &d,
            vec![name(p, "p"), index(3), name(datas[0], "data")],
            Some(datas[0]),
        );
        assert_eq!(retarget_iface_port(&d, &r, u), None);

        // A name cannot be looked up in an array without selecting an element.
        let r = HierarchicalReference::new(
            &d,
            vec![name(p, "p"), name(datas[0], "data")],
            Some(datas[0]),
        );
        assert_eq!(retarget_iface_port(&d, &r, u), None);
    }

    #[test]
    fn modports_and_generate_blocks() {
        let mut d = Design::new();
        let root = d.root();
        let (_, top) = d.add_instance(root, "top", INVALID_SPAN, DefinitionKind::Module);
        let (bus, bus_body) = d.add_instance(top, "bus", INVALID_SPAN, DefinitionKind::Interface);
        let data = d.add(bus_body, "data", INVALID_SPAN, net());
        let flag = d.add(
            bus_body,
            "flag",
            INVALID_SPAN,
            SymbolKind::Variable(VariableSymbol {
                ty: &LOGIC_TYPE,
                lifetime: Lifetime::Static,
                initializer: None,
            }),
        );
        let gen = d.add(
            bus_body,
            "g",
            INVALID_SPAN,
            SymbolKind::GenerateBlockArray {
                valid: true,
                entries: vec![],
            },
        );
        let _g0 = d.add(gen, "", INVALID_SPAN, SymbolKind::GenerateBlock);
        let g1 = d.add(gen, "", INVALID_SPAN, SymbolKind::GenerateBlock);
        let x = d.add(g1, "x", INVALID_SPAN, net());
        let mp = d.add(bus_body, "mp", INVALID_SPAN, SymbolKind::Modport);
        let mp_data = d.add(
            mp,
            "data",
            INVALID_SPAN,
            SymbolKind::ModportPort(ModportPortSymbol {
                ty: &LOGIC_TYPE,
                direction: ArgumentDirection::Out,
                connection: None,
            }),
        );

        let (u, body) = d.add_instance(top, "u", INVALID_SPAN, DefinitionKind::Module);
        let p = d.add(
            body,
            "p",
            INVALID_SPAN,
            SymbolKind::InterfacePort(InterfacePortSymbol::default()),
        );
        d.connect_interface_port(p, bus, Some(mp), None);

        // Members listed in the modport resolve to the modport port.
        let r = HierarchicalReference::new(
            &d,
            vec![name(p, "p"), name(data, "data")],
            Some(data),
        );
        assert_eq!(retarget_iface_port(&d, &r, u), Some(mp_data));

        // Members that could have been listed but were not are rejected.
        let r = HierarchicalReference::new(
            &d,
            vec![name(p, "p"), name(flag, "flag")],
            Some(flag),
        );
        assert_eq!(retarget_iface_port(&d, &r, u), None);

        // Other members are reachable through the interface, and generate
        // block arrays are indexed directly.
        let r = HierarchicalReference::new(
            &d,
            vec![
                name(p, "p"),
                name(gen, "g"),
                PathElement {
                    symbol: g1,
                    selector: Selector::Index(1),
                },
                name(x, "x"),
            ],
            Some(x),
        );
        assert_eq!(retarget_iface_port(&d, &r, u), Some(x));
    }
}
