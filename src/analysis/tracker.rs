// Copyright (c) 2016-2021 Fabian Schuiki

//! Centralized tracking of driven values.
//!
//! The [`DriverTracker`] collects the drivers of every value in the design and
//! reports conflicting drivers as they are discovered. It is designed to be
//! fed from many worker threads at once: every value has its own driver map,
//! and updates to one value never wait for updates to another.
//!
//! Two kinds of drivers need special treatment:
//!
//! - Drivers that reach a value through an interface port are side effects
//!   of the instance the port belongs to. Instances that share a canonical
//!   body are only analyzed once, so these side effects are replayed against
//!   every other instance of the body, whichever of the two is seen first.
//! - Drivers of modport ports are collected separately and forwarded to the
//!   modport port's connection once all other drivers are known. See
//!   [`DriverTracker::propagate_modport_drivers`].

use crate::context::AnalysisContext;
use crate::crate_prelude::*;
use crate::design::{ArgumentDirection, PortConnection, Symbol, SymbolId, SymbolKind};
use crate::driver::{
    Driver, DriverBitRange, DriverFlags, DriverKind, DriverList, SymbolDriverListPair,
};
use crate::driver_map::DriverMap;
use crate::expr::{Expr, ExprKind};
use crate::hier::HierarchicalReference;
use crate::lsp::{get_bounds, rebase_lsp, stringify_lsp, visit_components, visit_lsps};
use crate::policy::{handle_overlap, is_problem, ValueInfo};
use crate::procedure::AnalyzedProcedure;
use crate::retarget::retarget_iface_port;
use dashmap::DashMap;
use parking_lot::RwLock;

/// A driver that reaches its value through an interface port.
#[derive(Debug, Clone, Copy)]
struct IfacePortDriver<'a> {
    r: &'a HierarchicalReference,
    driver: &'a Driver<'a>,
}

/// The side effects recorded for a canonical instance body.
#[derive(Debug, Default)]
struct InstanceState<'a> {
    /// The instances that share the body without being its canonical owner.
    non_canonical_instances: Vec<SymbolId>,
    /// The drivers made through the body's interface ports so far.
    iface_port_drivers: Vec<IfacePortDriver<'a>>,
}

/// Interface port drivers discovered while the driver maps were locked.
type IfacePortRefs<'a> = Vec<(&'a HierarchicalReference, &'a Driver<'a>)>;

/// Tracks the drivers of all values in a design.
#[derive(Default)]
pub struct DriverTracker<'a> {
    symbol_drivers: DashMap<SymbolId, DriverMap<'a>>,
    instance_map: DashMap<SymbolId, InstanceState<'a>>,
    modport_port_drivers: RwLock<DashMap<SymbolId, DriverList<'a>>>,
}

impl<'a> DriverTracker<'a> {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Default::default()
    }

    /// Record the drivers of an analyzed procedure.
    pub fn record_procedure(&self, cx: &AnalysisContext<'a>, procedure: &AnalyzedProcedure<'a>) {
        let mut iface_refs = IfacePortRefs::new();
        for (symbol, drivers) in procedure.drivers() {
            for &(driver, bounds) in drivers {
                if let Some(r) = self.add_driver(cx, *symbol, driver, bounds) {
                    iface_refs.push((r, driver));
                }
            }
        }
        for (r, driver) in iface_refs {
            self.note_interface_port_driver(cx, r, driver);
        }
    }

    /// Record the drivers created by connecting a port of an instance, as seen
    /// from the instantiating scope `containing`.
    pub fn record_port_connection(
        &self,
        cx: &AnalysisContext<'a>,
        connection: &PortConnection<'a>,
        containing: SymbolId,
    ) {
        let expr = match connection.expr {
            Some(expr) if !expr.is_bad() => expr,
            _ => return,
        };
        let direction = match cx.symbol(connection.port).kind {
            SymbolKind::Port(ref port) => port.direction,
            SymbolKind::MultiPort(direction) => direction,
            SymbolKind::InterfacePort(..) => return,
            ref other => panic!("port connection to {:?}", other),
        };

        // Input ports are not drivers.
        let flags = match direction {
            ArgumentDirection::In => return,
            ArgumentDirection::Out => DriverFlags::OUTPUT_PORT,
            _ => DriverFlags::empty(),
        };
        let expr = match expr.kind {
            ExprKind::Assignment { lhs, .. } => lhs,
            _ => expr,
        };
        self.add_drivers(cx, expr, DriverKind::Continuous, flags, containing, None);
    }

    /// Record the driver a port creates on the internal signal it connects to.
    pub fn record_port(&self, cx: &AnalysisContext<'a>, port: SymbolId) {
        let symbol = cx.symbol(port);
        let port_data = match symbol.kind {
            SymbolKind::Port(ref p) => p,
            ref other => panic!("{:?} is not a port", other),
        };
        let flags = match port_data.direction {
            ArgumentDirection::In => DriverFlags::INPUT_PORT,
            ArgumentDirection::InOut => DriverFlags::empty(),
            _ => return,
        };
        let scope = symbol.parent.expect("port outside of a scope");

        if let Some(expr) = port_data.internal_expr {
            self.add_drivers(cx, expr, DriverKind::Continuous, flags, scope, None);
        } else if let Some(internal) = port_data.internal_symbol {
            let expr = cx.arena.alloc_expr(Expr::new(
                cx.symbol(internal).human_span(),
                ExprKind::NamedValue(internal),
            ));
            self.add_drivers(cx, expr, DriverKind::Continuous, flags, scope, None);
        }
    }

    /// Record the driver a clocking block output creates on its target.
    pub fn record_clock_var(&self, cx: &AnalysisContext<'a>, clock_var: SymbolId) {
        let symbol = cx.symbol(clock_var);
        let data = match symbol.kind {
            SymbolKind::ClockVar(ref c) => c,
            ref other => panic!("{:?} is not a clock var", other),
        };

        // Input clock vars don't drive anything.
        if data.direction == ArgumentDirection::In {
            return;
        }
        let scope = symbol.parent.expect("clock var outside of a scope");
        if let Some(expr) = data.initializer {
            self.add_drivers(
                cx,
                expr,
                DriverKind::Continuous,
                DriverFlags::CLOCK_VAR,
                scope,
                None,
            );
        }
    }

    /// Record the drivers of an expression that is continuously assigned
    /// within `containing`.
    pub fn record_expr(&self, cx: &AnalysisContext<'a>, expr: &'a Expr<'a>, containing: SymbolId) {
        self.add_drivers(
            cx,
            expr,
            DriverKind::Continuous,
            DriverFlags::empty(),
            containing,
            None,
        );
    }

    /// Record a list of drivers that have already been computed elsewhere.
    ///
    /// None of the drivers may reach their value through an interface port.
    pub fn record_driver_list(&self, cx: &AnalysisContext<'a>, list: &[SymbolDriverListPair<'a>]) {
        for (symbol, drivers) in list {
            for &(driver, bounds) in drivers {
                let r = self.add_driver(cx, *symbol, driver, bounds);
                assert!(r.is_none(), "driver list contains interface port drivers");
            }
        }
    }

    /// Record the declared initializer of a value as its driver, unless the
    /// value already has drivers.
    pub fn record_initializer(&self, cx: &AnalysisContext<'a>, value: SymbolId) {
        let symbol = cx.symbol(value);
        if is_undriven(symbol) || initializer_kind(symbol).is_none() {
            return;
        }
        let mut map = self.symbol_drivers.entry(value).or_default();
        if map.is_empty() {
            self.insert_initializer(cx, symbol, &mut map);
        }
    }

    /// Note that `instance` shares the canonical body of another instance.
    ///
    /// All interface port drivers recorded for the canonical body, now and in
    /// the future, are replayed against the instance.
    pub fn note_non_canonical_instance(&self, cx: &AnalysisContext<'a>, instance: SymbolId) {
        let canonical = cx
            .design
            .canonical_body(instance)
            .expect("instance has no canonical body");

        let side_effects = {
            let mut state = self.instance_map.entry(canonical).or_default();
            state.non_canonical_instances.push(instance);
            state.iface_port_drivers.clone()
        };
        debug!(
            "replaying {} interface port drivers on `{}`",
            side_effects.len(),
            cx.design.hierarchical_path(instance)
        );
        for side_effect in side_effects {
            self.apply_instance_side_effect(cx, side_effect, instance);
        }
    }

    /// Forward the drivers of modport ports to the expressions the ports are
    /// connected to.
    ///
    /// Call this once after all other drivers have been recorded. Forwarding a
    /// driver may reach further modport ports, so this repeats until no new
    /// modport drivers appear. Returns the number of rounds that were needed.
    pub fn propagate_modport_drivers(&self, cx: &AnalysisContext<'a>) -> usize {
        let mut rounds = 0;
        loop {
            let pending = std::mem::take(&mut *self.modport_port_drivers.write());
            if pending.is_empty() {
                break;
            }
            rounds += 1;
            debug!(
                "modport round {}: {} ports with pending drivers",
                rounds,
                pending.len()
            );
            for (port, drivers) in pending {
                let connection = match cx.symbol(port).kind {
                    SymbolKind::ModportPort(ref p) => p.connection,
                    _ => None,
                };
                if let Some(expr) = connection {
                    for (driver, _) in drivers {
                        self.propagate_modport_driver(cx, expr, driver);
                    }
                }
            }
        }
        rounds
    }

    /// Get the drivers of a value, ordered by the lowest bit they drive.
    pub fn drivers_of(&self, value: SymbolId) -> DriverList<'a> {
        match self.symbol_drivers.get(&value) {
            Some(map) => map.iter().map(|(bounds, driver)| (driver, bounds)).collect(),
            None => vec![],
        }
    }

    /// The number of values with at least one recorded driver.
    pub fn num_tracked_values(&self) -> usize {
        self.symbol_drivers.len()
    }

    /// The number of modport ports with drivers waiting to be propagated.
    pub fn len_pending_modport(&self) -> usize {
        self.modport_port_drivers.read().len()
    }

    fn propagate_modport_driver(
        &self,
        cx: &AnalysisContext<'a>,
        connection: &'a Expr<'a>,
        original: &'a Driver<'a>,
    ) {
        // Graft the selects of the original driver onto the connection.
        let initial_lsp = match original.prefix_expr.kind {
            ExprKind::ElementSelect { .. }
            | ExprKind::RangeSelect { .. }
            | ExprKind::MemberAccess { .. } => {
                Some(rebase_lsp(original.prefix_expr, connection, cx.arena))
            }
            _ => None,
        };
        self.add_drivers(
            cx,
            connection,
            original.kind,
            original.flags,
            original.containing_symbol,
            initial_lsp,
        );
    }

    fn add_drivers(
        &self,
        cx: &AnalysisContext<'a>,
        expr: &'a Expr<'a>,
        kind: DriverKind,
        flags: DriverFlags,
        containing: SymbolId,
        initial_lsp: Option<&'a Expr<'a>>,
    ) {
        let mut iface_refs = IfacePortRefs::new();
        visit_lsps(expr, initial_lsp, &mut |symbol, lsp, is_lvalue| {
            if !is_lvalue {
                return;
            }
            let ty = match cx.symbol(symbol).kind.value_type() {
                Some(ty) => ty,
                None => return,
            };
            let bounds = match get_bounds(lsp, ty) {
                Some(bounds) => bounds,
                None => {
                    trace!("no static bounds for `{}`", stringify_lsp(lsp, cx.design));
                    return;
                }
            };
            let driver = cx
                .arena
                .alloc_driver(Driver::new(cx.design, kind, lsp, containing, flags));
            if let Some(r) = self.add_driver(cx, symbol, driver, bounds) {
                iface_refs.push((r, driver));
            }
        });
        for (r, driver) in iface_refs {
            self.note_interface_port_driver(cx, r, driver);
        }
    }

    /// Insert a driver into the driver map of a value, reporting conflicts with
    /// the drivers already present.
    ///
    /// Takes the lock of the value's map, so the caller must not hold any.
    /// Returns the hierarchical reference if the driver reaches the value
    /// through an interface port.
    fn add_driver(
        &self,
        cx: &AnalysisContext<'a>,
        value: SymbolId,
        driver: &'a Driver<'a>,
        bounds: DriverBitRange,
    ) -> Option<&'a HierarchicalReference> {
        let symbol = cx.symbol(value);
        if is_undriven(symbol) {
            return None;
        }

        let mut result = None;
        if !driver.flags.contains(DriverFlags::FROM_SIDE_EFFECT) {
            visit_components(driver.prefix_expr, true, |expr| {
                if let ExprKind::HierarchicalValue(r) = expr.kind {
                    if r.is_via_iface_port() {
                        result = Some(r);
                    }
                }
            });
        }

        if cx.sess.opts.trace_drivers {
            debug!(
                "{} {} driven by {:?} {:?} driver in {}",
                stringify_lsp(driver.prefix_expr, cx.design),
                bounds,
                driver.source,
                driver.kind,
                cx.symbol(driver.containing_symbol).desc_full()
            );
        }

        if let SymbolKind::ModportPort(..) = symbol.kind {
            self.modport_port_drivers
                .read()
                .entry(value)
                .or_default()
                .push((driver, bounds));
            return result;
        }

        let mut map = self.symbol_drivers.entry(value).or_default();
        if map.is_empty() {
            self.insert_initializer(cx, symbol, &mut map);
            if map.is_empty() {
                map.insert(bounds, driver);
                return result;
            }
        }

        let info = ValueInfo::new(symbol, cx.allow_dup_initial_drivers());
        for (_, curr) in map.find(bounds) {
            if !is_problem(&info, curr, driver) {
                continue;
            }
            let verdict = handle_overlap(cx.design, &info, curr, driver);
            trace!(
                "overlap on {} {}: {:?}",
                symbol.desc_full(),
                bounds,
                verdict.diag.as_ref().and_then(|d| d.get_code())
            );
            if let Some(diag) = verdict.diag {
                cx.emit(diag);
            }
            if !verdict.keep_scanning {
                break;
            }
        }

        map.insert(bounds, driver);
        result
    }

    /// Insert a driver for the declared initializer of a net or variable.
    fn insert_initializer(
        &self,
        cx: &AnalysisContext<'a>,
        symbol: &'a Symbol<'a>,
        map: &mut DriverMap<'a>,
    ) {
        let kind = match initializer_kind(symbol) {
            Some(kind) => kind,
            None => return,
        };
        let width = symbol
            .kind
            .value_type()
            .map(|ty| ty.selectable_width())
            .unwrap_or(0);
        if width == 0 {
            return;
        }
        let scope = symbol.parent.expect("value outside of a scope");
        let expr = cx.arena.alloc_expr(Expr::new(
            symbol.human_span(),
            ExprKind::NamedValue(symbol.id),
        ));
        let driver = cx.arena.alloc_driver(Driver::new(
            cx.design,
            kind,
            expr,
            scope,
            DriverFlags::INITIALIZER,
        ));
        trace!("initializer drives {}", symbol.desc_full());
        map.insert(DriverBitRange::new(0, width - 1), driver);
    }

    fn note_interface_port_driver(
        &self,
        cx: &AnalysisContext<'a>,
        r: &'a HierarchicalReference,
        driver: &'a Driver<'a>,
    ) {
        assert!(r.is_via_iface_port());
        assert!(r.target.is_some());

        let port = r.path[0].symbol;
        let connection_expr = match cx.symbol(port).kind {
            SymbolKind::InterfacePort(ref p) => p.connection_expr,
            ref other => panic!("{:?} is not an interface port", other),
        };
        let body = cx
            .design
            .parent_scope(port)
            .expect("interface port outside of a scope");
        assert!(matches!(cx.symbol(body).kind, SymbolKind::InstanceBody(..)));

        let side_effect = IfacePortDriver { r, driver };
        let instances = {
            let mut state = self.instance_map.entry(body).or_default();
            state.iface_port_drivers.push(side_effect);
            state.non_canonical_instances.clone()
        };
        for instance in instances {
            self.apply_instance_side_effect(cx, side_effect, instance);
        }

        // If the port is itself connected through another interface port,
        // the driver is also a side effect of the parent.
        if let Some(expr) = connection_expr {
            if let ExprKind::ArbitrarySymbol(conn_ref) = expr.kind {
                if conn_ref.is_via_iface_port() {
                    let joined = conn_ref.join(cx.arena, r);
                    self.note_interface_port_driver(cx, joined, driver);
                }
            }
        }
    }

    fn apply_instance_side_effect(
        &self,
        cx: &AnalysisContext<'a>,
        side_effect: IfacePortDriver<'a>,
        instance: SymbolId,
    ) {
        let target = match retarget_iface_port(cx.design, side_effect.r, instance) {
            Some(target) => target,
            None => {
                trace!(
                    "cannot retarget `{}` to `{}`",
                    side_effect.r,
                    cx.design.hierarchical_path(instance)
                );
                return;
            }
        };
        let ty = match cx.symbol(target).kind.value_type() {
            Some(ty) => ty,
            None => return,
        };

        let mut driver = side_effect.driver.clone();
        driver.containing_symbol = instance;
        driver.flags |= DriverFlags::FROM_SIDE_EFFECT;
        let driver = cx.arena.alloc_driver(driver);

        let bounds = match get_bounds(driver.prefix_expr, ty) {
            Some(bounds) => bounds,
            None => return,
        };
        let r = self.add_driver(cx, target, driver, bounds);
        assert!(r.is_none());
    }
}

/// Class handles are not driven.
fn is_undriven(symbol: &Symbol) -> bool {
    symbol
        .kind
        .value_type()
        .map(|ty| ty.is_class())
        .unwrap_or(true)
}

/// The kind of driver a declared initializer of `symbol` creates, if it has
/// one. Initializers of nets act like continuous assignments, those of
/// variables like procedural ones.
fn initializer_kind(symbol: &Symbol) -> Option<DriverKind> {
    symbol.kind.initializer()?;
    if symbol.kind.value_type()?.selectable_width() == 0 {
        return None;
    }
    match symbol.kind {
        SymbolKind::Net(..) => Some(DriverKind::Continuous),
        SymbolKind::Variable(..) | SymbolKind::ClassProperty(..) | SymbolKind::Field(..) => {
            Some(DriverKind::Procedural)
        }
        _ => None,
    }
}
