//! Optimization passes over three-address code.
//!
//! Five passes run in fixed order inside a driver loop: constant folding,
//! constant propagation, copy propagation, common subexpression elimination
//! and dead-code elimination. The driver repeats the round until the
//! canonical printed form of the list stops changing; every pass is monotone
//! in the number of instructions and named temporaries, so the loop
//! terminates.
//!
//! The forward passes track facts per straight-line region only: every
//! `label` is a potential control-flow join and resets the pass state, and
//! dead-code elimination stops eliminating once its backward scan crosses a
//! control-flow instruction. Running an optimized program therefore always
//! prints the same output as running the original. A pass never fails; any
//! instruction it cannot transform passes through unchanged.

use crate::tac::{Tac, TacOp};
use expvm::value;
use expvm::{Operand, Value};
use std::collections::{HashMap, HashSet};

pub fn optimize(instructions: Vec<Tac>) -> Vec<Tac> {
    let mut current = instructions;
    loop {
        let before = printed(&current);
        current = fold_constants(current);
        current = propagate_constants(current);
        current = propagate_copies(current);
        current = eliminate_common_subexpressions(current);
        current = eliminate_dead_code(current);
        if printed(&current) == before {
            return current;
        }
    }
}

fn printed(instructions: &[Tac]) -> String {
    instructions
        .iter()
        .map(|tac| tac.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces arithmetic over two numeric constants with a copy of the result.
/// Division by zero is left in place so the machine surfaces it at runtime.
pub fn fold_constants(instructions: Vec<Tac>) -> Vec<Tac> {
    instructions
        .into_iter()
        .map(|tac| {
            let op = match tac.op.arith() {
                Some(op) => op,
                None => return tac,
            };
            if let (Some(Operand::Const(a)), Some(Operand::Const(b))) = (&tac.arg1, &tac.arg2) {
                if a.is_numeric() && b.is_numeric() {
                    if let Ok(folded) = value::arith(op, a, b) {
                        return Tac::new(
                            TacOp::Copy,
                            Some(Operand::Const(folded)),
                            None,
                            tac.result,
                        );
                    }
                }
            }
            tac
        })
        .collect()
}

/// Records destinations with known constant values and substitutes them into
/// the operands of arithmetic and comparison instructions.
pub fn propagate_constants(instructions: Vec<Tac>) -> Vec<Tac> {
    let mut env: HashMap<String, Value> = HashMap::new();

    instructions
        .into_iter()
        .map(|mut tac| {
            if tac.op == TacOp::Label {
                // Control flow joins here; nothing is known afterwards.
                env.clear();
                return tac;
            }

            if tac.op.arith().is_some() || tac.op.relation().is_some() {
                substitute_constant(&mut tac.arg1, &env);
                substitute_constant(&mut tac.arg2, &env);
            }

            match (&tac.op, &tac.arg1, &tac.result) {
                (TacOp::Copy, Some(Operand::Const(value)), Some(result)) => {
                    env.insert(result.clone(), value.clone());
                }
                _ => {
                    // Assigning anything non-constant forgets the old fact.
                    if let Some(written) = tac.dest() {
                        env.remove(written);
                    }
                }
            }
            tac
        })
        .collect()
}

fn substitute_constant(slot: &mut Option<Operand>, env: &HashMap<String, Value>) {
    if let Some(Operand::Name(name)) = slot {
        if let Some(value) = env.get(name.as_str()) {
            *slot = Some(Operand::Const(value.clone()));
        }
    }
}

/// Seeds `copy[d] = s` from `= s, d` and substitutes operands through the
/// map. Recording the post-substitution source keeps chains of copies
/// transitive. A write to a name drops both the facts about it and the facts
/// that read from it.
pub fn propagate_copies(instructions: Vec<Tac>) -> Vec<Tac> {
    let mut copies: HashMap<String, String> = HashMap::new();

    instructions
        .into_iter()
        .map(|mut tac| {
            if tac.op == TacOp::Label {
                copies.clear();
                return tac;
            }

            substitute_copy(&mut tac.arg1, &copies);
            substitute_copy(&mut tac.arg2, &copies);

            if let Some(written) = tac.dest().map(str::to_owned) {
                copies.remove(&written);
                copies.retain(|_, source| *source != written);
            }

            if tac.op == TacOp::Copy {
                if let (Some(Operand::Name(source)), Some(result)) = (&tac.arg1, &tac.result) {
                    if source != result {
                        copies.insert(result.clone(), source.clone());
                    }
                }
            }
            tac
        })
        .collect()
}

fn substitute_copy(slot: &mut Option<Operand>, copies: &HashMap<String, String>) {
    if let Some(Operand::Name(name)) = slot {
        if let Some(source) = copies.get(name.as_str()) {
            *name = source.clone();
        }
    }
}

type ExprKey = (String, String, String);

/// Rewrites a recomputation of an already-available arithmetic expression as
/// a copy of the earlier result. Keys are `(op, arg1, arg2)` over names and
/// are not commuted: `a + b` and `b + a` stay distinct.
pub fn eliminate_common_subexpressions(instructions: Vec<Tac>) -> Vec<Tac> {
    let mut available: HashMap<ExprKey, String> = HashMap::new();

    instructions
        .into_iter()
        .map(|tac| {
            if tac.op == TacOp::Label {
                available.clear();
                return tac;
            }

            let key = match (tac.op.arith(), &tac.arg1, &tac.arg2) {
                (Some(_), Some(Operand::Name(a)), Some(Operand::Name(b))) => {
                    Some((tac.op.to_string(), a.clone(), b.clone()))
                }
                _ => None,
            };

            if let Some(key) = &key {
                if let Some(previous) = available.get(key).cloned() {
                    kill_facts(&mut available, tac.result.as_deref());
                    return Tac::new(
                        TacOp::Copy,
                        Some(Operand::Name(previous)),
                        None,
                        tac.result,
                    );
                }
            }

            kill_facts(&mut available, tac.dest());

            if let (Some(key), Some(result)) = (key, &tac.result) {
                // An expression over its own destination goes stale the
                // moment it executes; don't record it.
                if key.1 != *result && key.2 != *result {
                    available.insert(key, result.clone());
                }
            }
            tac
        })
        .collect()
}

fn kill_facts(available: &mut HashMap<ExprKey, String>, written: Option<&str>) {
    if let Some(written) = written {
        available.retain(|(_, a, b), result| a != written && b != written && result != written);
    }
}

/// Backward liveness scan. Copies, arithmetic and casts whose destination is
/// never read are dropped; every other instruction is kept and its operand
/// names become live. Crossing a control-flow instruction freezes the scan,
/// keeping everything earlier.
pub fn eliminate_dead_code(instructions: Vec<Tac>) -> Vec<Tac> {
    let mut live: HashSet<String> = HashSet::new();
    let mut frozen = false;
    let mut kept: Vec<Tac> = Vec::new();

    for tac in instructions.into_iter().rev() {
        let eliminable = matches!(
            tac.op,
            TacOp::Copy | TacOp::Add | TacOp::Sub | TacOp::Mul | TacOp::Div | TacOp::Cast(_)
        );

        if !eliminable || frozen {
            if matches!(tac.op, TacOp::Label | TacOp::Goto | TacOp::IfZ) {
                frozen = true;
            }
            mark_live(&mut live, &tac);
            kept.push(tac);
            continue;
        }

        let result_live = tac
            .result
            .as_ref()
            .map_or(false, |result| live.contains(result));
        if !result_live {
            continue;
        }

        if let Some(result) = &tac.result {
            live.remove(result);
        }
        mark_live(&mut live, &tac);
        kept.push(tac);
    }

    kept.reverse();
    kept
}

fn mark_live(live: &mut HashSet<String>, tac: &Tac) {
    for operand in tac.arg1.iter().chain(tac.arg2.iter()) {
        if let Operand::Name(name) = operand {
            live.insert(name.clone());
        }
    }
}
