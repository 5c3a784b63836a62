// Copyright (c) 2016-2021 Fabian Schuiki

mod common;
use crate::common::*;

const IFACE_SRC: &str = "
    interface bus; logic [7:0] data; endinterface
    module m (bus p); always_comb p.data = 1; endmodule
    module top;
        bus bus0(), bus1(), bus2(), bus3();
        m u0 (bus0), u1 (bus1), u2 (bus2), u3 (bus3);
        assign bus1.data = 0;
    endmodule
";

/// The design in `IFACE_SRC`. Instance `u0` owns the canonical body of `m`,
/// the other instances share it.
struct Iface<'a> {
    b: Bench<'a>,
    datas: Vec<SymbolId>,
    insts: Vec<SymbolId>,
    comb: SymbolId,
    port0: SymbolId,
}

fn iface_design<'a>(arena: &'a Arenas<'a>) -> Iface<'a> {
    let mut b = Bench::new(arena, IFACE_SRC);
    let top = b.top;
    let mut datas = vec![];
    let mut buses = vec![];
    for i in 0..4 {
        let (bus, body) = b.interface(top, &format!("bus{}", i));
        datas.push(b.var(body, "data", 8));
        buses.push(bus);
    }
    let mut insts = vec![];
    let mut ports = vec![];
    let mut canonical = None;
    for (i, &bus) in buses.iter().enumerate() {
        let (inst, body) = b.module(top, &format!("u{}", i));
        let port = b.iface_port(body, "p");
        b.design.connect_interface_port(port, bus, None, None);
        match canonical {
            None => canonical = Some(body),
            Some(canonical) => b.design.set_canonical_body(inst, canonical),
        }
        insts.push(inst);
        ports.push(port);
    }
    let body0 = canonical.unwrap();
    let comb = b.procedure(body0, ProceduralBlockKind::AlwaysComb, 0);
    Iface {
        b,
        datas,
        insts,
        comb,
        port0: ports[0],
    }
}

#[test]
fn side_effects_are_replayed_on_shared_bodies() {
    for &procedure_first in &[true, false] {
        let sess = Session::new();
        let arena = Arenas::default();
        let d = iface_design(&arena);
        let b = &d.b;
        let cx = AnalysisContext::new(&sess, &arena, &b.design);
        let tracker = DriverTracker::new();

        let lvalue = b.via_port(d.port0, "data", d.datas[0], "p.data", 0);
        let procedure = analyze(&cx, d.comb, &[lvalue]);
        if procedure_first {
            tracker.record_procedure(&cx, &procedure);
        }
        for &inst in &d.insts[1..] {
            tracker.note_non_canonical_instance(&cx, inst);
        }
        if !procedure_first {
            tracker.record_procedure(&cx, &procedure);
        }

        assert!(sess.diagnostics().is_empty());
        let (driver, bounds) = tracker.drivers_of(d.datas[0])[0];
        assert!(!driver.flags.contains(DriverFlags::FROM_SIDE_EFFECT));
        assert_eq!(driver.containing_symbol, d.comb);
        assert_eq!(bounds, DriverBitRange::new(0, 7));
        for (i, &inst) in d.insts.iter().enumerate().skip(1) {
            let drivers = tracker.drivers_of(d.datas[i]);
            assert_eq!(drivers.len(), 1, "bus{}", i);
            let (driver, bounds) = drivers[0];
            assert!(driver.flags.contains(DriverFlags::FROM_SIDE_EFFECT));
            assert_eq!(driver.containing_symbol, inst);
            assert_eq!(driver.source, DriverSource::AlwaysComb);
            assert_eq!(bounds, DriverBitRange::new(0, 7));
        }
    }
}

#[test]
fn side_effect_conflicts_are_found_in_any_order() {
    for order in 0..3 {
        let sess = Session::new();
        let arena = Arenas::default();
        let d = iface_design(&arena);
        let b = &d.b;
        let cx = AnalysisContext::new(&sess, &arena, &b.design);
        let tracker = DriverTracker::new();

        let lvalue = b.via_port(d.port0, "data", d.datas[0], "p.data", 0);
        let procedure = analyze(&cx, d.comb, &[lvalue]);
        let cont = b.assign(b.named(d.datas[1], "bus1.data", 0), b.int(0));
        let steps: &[usize] = match order {
            0 => &[0, 1, 2],
            1 => &[2, 1, 0],
            _ => &[1, 2, 0],
        };
        for step in steps {
            match *step {
                0 => tracker.record_procedure(&cx, &procedure),
                1 => tracker.note_non_canonical_instance(&cx, d.insts[1]),
                _ => tracker.record_expr(&cx, cont, b.top),
            }
        }

        assert_eq!(diag_codes(&sess), vec!["mixed-var-assigns"], "order {}", order);
        assert_eq!(tracker.drivers_of(d.datas[1]).len(), 2);
        assert!(tracker.drivers_of(d.datas[2]).is_empty());
    }
}

#[test]
fn nested_interface_ports() {
    let src = "
        interface bus; logic data; endinterface
        module inner (bus q); assign q.data = 1; endmodule
        module outer (bus p); inner i (p); endmodule
        module top; bus b0(), b1(); outer o0 (b0), o1 (b1); endmodule
    ";
    let sess = Session::new();
    let arena = Arenas::default();
    let mut b = Bench::new(&arena, src);
    let top = b.top;
    let (b0, b0_body) = b.interface(top, "b0");
    let (b1, b1_body) = b.interface(top, "b1");
    let data0 = b.var(b0_body, "data", 1);
    let data1 = b.var(b1_body, "data", 1);

    // `o0` is canonical, `o1` shares its body.
    let (_, o0_body) = b.module(top, "o0");
    let (o1, o1_body) = b.module(top, "o1");
    b.design.set_canonical_body(o1, o0_body);
    let p0 = b.iface_port(o0_body, "p");
    let p1 = b.iface_port(o1_body, "p");
    b.design.connect_interface_port(p0, b0, None, None);
    b.design.connect_interface_port(p1, b1, None, None);

    // The inner instance connects its port `q` to the outer port `p`.
    let (_, i_body) = b.module(o0_body, "i");
    let q = b.iface_port(i_body, "q");
    let p_ref = arena.alloc_hier_ref(HierarchicalReference::new(
        &b.design,
        vec![PathElement {
            symbol: p0,
            selector: Selector::Name("p".into()),
        }],
        Some(b0),
    ));
    let conn = b.expr(b.span("(p)"), ExprKind::ArbitrarySymbol(p_ref));
    b.design.connect_interface_port(q, p0, None, Some(conn));

    let lvalue = b.via_port(q, "data", data0, "q.data", 0);
    let cx = AnalysisContext::new(&sess, &arena, &b.design);
    let tracker = DriverTracker::new();

    tracker.note_non_canonical_instance(&cx, o1);
    tracker.record_expr(&cx, lvalue, i_body);

    assert!(sess.diagnostics().is_empty());
    assert_eq!(tracker.drivers_of(data0).len(), 1);
    let drivers = tracker.drivers_of(data1);
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0].0.containing_symbol, o1);
}

/// An interface with a modport, and a module that drives the interface's data
/// through the modport.
struct Modport<'a> {
    b: Bench<'a>,
    data: SymbolId,
    mp_ports: Vec<SymbolId>,
    port: SymbolId,
    body: SymbolId,
}

fn modport_design<'a>(arena: &'a Arenas<'a>, src: &str, depth: usize) -> Modport<'a> {
    let mut b = Bench::new(arena, src);
    let top = b.top;
    let (bus, bus_body) = b.interface(top, "bus0");
    let data = b.var(bus_body, "data", 8);
    let mp_span = b.span("mp");
    let mp = b.design.add(bus_body, "mp", mp_span, SymbolKind::Modport);

    // Each modport port refers to the previous one, the first one to the
    // data member itself.
    let mut mp_ports = vec![];
    let mut conn_target = data;
    for i in 0..depth {
        let ty = b.logic(8);
        let name = match i {
            0 => "data".to_string(),
            _ => format!("d{}", i),
        };
        let port = b.design.add(
            mp,
            &name,
            mp_span,
            SymbolKind::ModportPort(ModportPortSymbol {
                ty,
                direction: ArgumentDirection::Out,
                connection: None,
            }),
        );
        let conn = b.expr(mp_span, ExprKind::NamedValue(conn_target));
        b.design.connect_modport_port(port, conn);
        mp_ports.push(port);
        conn_target = port;
    }

    let (_, body) = b.module(top, "u");
    let port = b.iface_port(body, "p");
    b.design.connect_interface_port(port, bus, Some(mp), None);
    Modport {
        b,
        data,
        mp_ports,
        port,
        body,
    }
}

#[test]
fn modport_drivers_reach_interface_members() {
    let src = "
        interface bus; logic [7:0] data; modport mp (output data); endinterface
        module m (bus.mp p); assign p.data[3:0] = 1; endmodule
        module top; bus bus0(); m u (bus0); endmodule
    ";
    let sess = Session::new();
    let arena = Arenas::default();
    let d = modport_design(&arena, src, 1);
    let b = &d.b;
    let mp_data = d.mp_ports[0];
    let target = b.via_port(d.port, "data", mp_data, "p.data", 0);
    let lvalue = b.range(target, 3, 0);
    let cx = AnalysisContext::new(&sess, &arena, &b.design);
    let tracker = DriverTracker::new();

    tracker.record_expr(&cx, b.assign(lvalue, b.int(1)), d.body);
    assert_eq!(tracker.len_pending_modport(), 1);
    assert!(tracker.drivers_of(d.data).is_empty());
    assert!(tracker.drivers_of(mp_data).is_empty());
    assert_eq!(tracker.num_tracked_values(), 0);

    assert_eq!(tracker.propagate_modport_drivers(&cx), 1);
    assert_eq!(tracker.len_pending_modport(), 0);
    let drivers = tracker.drivers_of(d.data);
    assert_eq!(drivers.len(), 1);
    let (driver, bounds) = drivers[0];
    assert_eq!(bounds, DriverBitRange::new(0, 3));
    assert_eq!(driver.kind, DriverKind::Continuous);
    assert_eq!(driver.containing_symbol, d.body);
    assert!(sess.diagnostics().is_empty());
    assert_eq!(tracker.num_tracked_values(), 1);

    // Nothing is left to do afterwards.
    assert_eq!(tracker.propagate_modport_drivers(&cx), 0);
}

#[test]
fn modport_chains_resolve_in_as_many_rounds() {
    let src = "
        interface bus; logic [7:0] data; modport mp (output data); endinterface
        module m (bus.mp p); assign p.d = 1; endmodule
        module top; bus bus0(); m u (bus0); endmodule
    ";
    for depth in 1..5 {
        let sess = Session::new();
        let arena = Arenas::default();
        let d = modport_design(&arena, src, depth);
        let b = &d.b;
        let last = d.mp_ports[depth - 1];
        let lvalue = b.via_port(d.port, "d", last, "p.d", 0);
        let cx = AnalysisContext::new(&sess, &arena, &b.design);
        let tracker = DriverTracker::new();

        tracker.record_expr(&cx, b.assign(lvalue, b.int(1)), d.body);
        assert_eq!(tracker.propagate_modport_drivers(&cx), depth);
        assert_eq!(tracker.drivers_of(d.data).len(), 1, "depth {}", depth);
        assert_eq!(tracker.len_pending_modport(), 0);
    }
}

#[test]
fn modport_drivers_conflict_with_interface_drivers() {
    let src = "
        interface bus;
            logic [7:0] data;
            modport mp (output data);
            always_comb data = 0;
        endinterface
        module m (bus.mp p); assign p.data[3:0] = 1; endmodule
        module top; bus bus0(); m u (bus0); endmodule
    ";
    let sess = Session::new();
    let arena = Arenas::default();
    let mut d = modport_design(&arena, src, 1);
    let bus_body = d.b.design[d.data].parent.unwrap();
    let comb = d
        .b
        .procedure(bus_body, ProceduralBlockKind::AlwaysComb, 0);
    let b = &d.b;
    let target = b.via_port(d.port, "data", d.mp_ports[0], "p.data", 0);
    let lvalue = b.range(target, 3, 0);
    let cx = AnalysisContext::new(&sess, &arena, &b.design);
    let tracker = DriverTracker::new();

    tracker.record_procedure(&cx, &analyze(&cx, comb, &[b.named(d.data, "data =", 0)]));
    tracker.record_expr(&cx, b.assign(lvalue, b.int(1)), d.body);
    assert!(sess.diagnostics().is_empty());

    tracker.propagate_modport_drivers(&cx);
    assert_eq!(diag_codes(&sess), vec!["mixed-var-assigns"]);
}
